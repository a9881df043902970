//! MediSense CLI
//!
//! Train, persist and inspect dementia-group classifiers from the command line.

use std::process::ExitCode;

use clap::Parser;
use serde_json::json;

use medisense::cli::{run, Cli};
use medisense::PipelineError;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (payload, code) = match err.downcast_ref::<PipelineError>() {
                Some(pipeline_err) => (pipeline_err.to_payload(), pipeline_err.exit_code()),
                None => (json!({ "error": format!("{:#}", err) }), 1),
            };
            log::debug!("Command failed: {:?}", err);
            eprintln!("{}", payload);
            ExitCode::from(code as u8)
        }
    }
}
