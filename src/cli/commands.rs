//! Subcommand dispatch

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use super::args::{Cli, Commands, TrainingArgs};
use super::import::run_import;
use crate::pipeline::loader::{load_records, load_records_json};
use crate::pipeline::train::{preprocess_and_train, train, TrainedEvaluation};
use crate::report::{display_classification_report, display_results, display_training_summary};
use crate::results::{get_result, list_results, persist};
use crate::store::FileStore;
use crate::utils::{
    create_spinner, finish_with_error, finish_with_success, print_banner, print_completion,
    print_config, print_count, print_step_header, print_step_time, print_success,
};

/// Message printed after a result is persisted
pub const SAVED_MESSAGE: &str = "Model result saved successfully.";

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn train_from(store: &FileStore, training: &TrainingArgs) -> Result<TrainedEvaluation> {
    Ok(preprocess_and_train(store, &training.to_config())?)
}

/// Execute the parsed command line
pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Import {
            data_dir,
            infer_schema_length,
        } => {
            let store = FileStore::create(&cli.store)?;
            run_import(&store, data_dir, *infer_schema_length)
        }
        Commands::Train { training, json } => {
            let store = FileStore::open(&cli.store)?;
            if *json {
                print_json(&train_from(&store, training)?)
            } else {
                run_training_report(&store, &cli.store, training)
            }
        }
        Commands::Save { training } => {
            let store = FileStore::open(&cli.store)?;
            let evaluation = train_from(&store, training)?;
            let id = persist(&store, &evaluation)?;
            print_json(&json!({ "message": SAVED_MESSAGE, "id": id.to_string() }))
        }
        Commands::Rf { training } => {
            let store = FileStore::open(&cli.store)?;
            print_json(&train_from(&store, training)?.report)
        }
        Commands::YProb { training } => {
            let store = FileStore::open(&cli.store)?;
            let evaluation = train_from(&store, training)?;
            print_json(&json!({ "y_prob": evaluation.probabilities }))
        }
        Commands::Results { json } => {
            let store = FileStore::open(&cli.store)?;
            let results = list_results(&store)?;
            if *json {
                print_json(&results)
            } else {
                display_results(&results);
                Ok(())
            }
        }
        Commands::Show { id } => {
            let store = FileStore::open(&cli.store)?;
            print_json(&get_result(&store, id)?.to_detail_json())
        }
        Commands::Data => {
            let store = FileStore::open(&cli.store)?;
            print_json(&load_records_json(&store)?)
        }
    }
}

/// Train with step-by-step progress and summary tables
fn run_training_report(store: &FileStore, store_path: &Path, training: &TrainingArgs) -> Result<()> {
    let config = training.to_config();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        store_path,
        config.seed,
        config.test_size,
        config.booster.n_estimators,
        config.booster.learning_rate,
    );

    print_step_header(1, "Load Records");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading longitudinal records...");
    let records = match load_records(store) {
        Ok(records) => records,
        Err(e) => {
            finish_with_error(&spinner, "Loading failed");
            return Err(e.into());
        }
    };
    finish_with_success(&spinner, "Records loaded");
    print_count("record(s)", records.height());
    print_step_time(step_start.elapsed());

    print_step_header(2, "Clean, Split and Fit");
    let step_start = Instant::now();
    let spinner = create_spinner("Training gradient-boosted trees...");
    let evaluation = match train(&records, &config) {
        Ok(evaluation) => evaluation,
        Err(e) => {
            finish_with_error(&spinner, "Training failed");
            return Err(e.into());
        }
    };
    finish_with_success(&spinner, "Model fitted");
    print_success(&format!(
        "Evaluated on {} validation record(s)",
        evaluation.probabilities.len()
    ));
    print_step_time(step_start.elapsed());

    display_training_summary(&evaluation.summary);
    display_classification_report(&evaluation.report);

    print_completion("Training complete!");

    Ok(())
}
