//! Tests for CLI argument parsing and the binary's output contract

use assert_cmd::Command;
use clap::Parser;
use medisense::cli::{Cli, Commands, SAVED_MESSAGE};
use medisense::pipeline::{GbdtConfig, TrainingConfig};
use predicates::prelude::*;
use serde_json::Value;

mod common;
use common::*;

#[test]
fn test_cli_default_training_args() {
    let cli = Cli::parse_from(["medisense", "train"]);

    assert_eq!(cli.store, std::path::PathBuf::from("data/store"));
    match cli.command {
        Commands::Train { training, json } => {
            assert!(!json);
            assert_eq!(training.to_config(), TrainingConfig::default());
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_cli_custom_training_args() {
    let cli = Cli::parse_from([
        "medisense",
        "--store",
        "/tmp/store",
        "save",
        "--seed",
        "7",
        "--test-size",
        "0.25",
        "--n-estimators",
        "20",
        "--learning-rate",
        "0.1",
        "--max-depth",
        "3",
    ]);

    let Commands::Save { training } = cli.command else {
        panic!("expected save");
    };
    let config = training.to_config();
    assert_eq!(config.seed, 7);
    assert_eq!(config.test_size, 0.25);
    assert_eq!(
        config.booster,
        GbdtConfig {
            n_estimators: 20,
            learning_rate: 0.1,
            max_depth: 3,
            ..GbdtConfig::default()
        }
    );
}

#[test]
fn test_cli_rejects_invalid_test_size() {
    assert!(Cli::try_parse_from(["medisense", "train", "--test-size", "1.5"]).is_err());
    assert!(Cli::try_parse_from(["medisense", "train", "--test-size", "0"]).is_err());
    assert!(Cli::try_parse_from(["medisense", "rf", "--n-estimators", "0"]).is_err());
}

#[test]
fn test_cli_result_subcommand() {
    let cli = Cli::parse_from(["medisense", "result", "abc"]);
    assert!(matches!(cli.command, Commands::Show { ref id } if id == "abc"));

    let cli = Cli::parse_from(["medisense", "y-prob"]);
    assert!(matches!(cli.command, Commands::YProb { .. }));
}

fn medisense(store: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("medisense").unwrap();
    cmd.env("MEDISENSE_STORE", store).env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_binary_import_train_save_and_list() {
    let exports = create_csv_exports();
    let store_dir = tempfile::TempDir::new().unwrap();
    let store = store_dir.path().join("store");

    medisense(&store)
        .args(["import", "--data-dir"])
        .arg(exports.path())
        .assert()
        .success();

    let output = medisense(&store).args(["train", "--json"]).output().unwrap();
    assert!(output.status.success());
    let trained = stdout_json(&output);
    assert_eq!(
        trained["classes"],
        serde_json::json!(["Converted", "Demented", "Nondemented"])
    );
    assert!(trained["rf_result"].get("accuracy").is_some());
    assert_eq!(trained["y_prob"].as_array().unwrap().len(), 2);

    let output = medisense(&store).arg("save").output().unwrap();
    assert!(output.status.success());
    let saved = stdout_json(&output);
    assert_eq!(saved["message"], SAVED_MESSAGE);
    let id = saved["id"].as_str().unwrap().to_string();

    let output = medisense(&store).args(["results", "--json"]).output().unwrap();
    let listed = stdout_json(&output);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    let output = medisense(&store).args(["result", &id]).output().unwrap();
    let detail = stdout_json(&output);
    assert_eq!(detail["classes"], trained["classes"]);
    assert_eq!(detail["rf_result"], trained["rf_result"]);
}

#[test]
fn test_binary_rf_and_y_prob_projections() {
    let exports = create_csv_exports();
    let store_dir = tempfile::TempDir::new().unwrap();
    let store = store_dir.path().join("store");
    medisense(&store)
        .args(["import", "--data-dir"])
        .arg(exports.path())
        .assert()
        .success();

    let rf = stdout_json(&medisense(&store).arg("rf").output().unwrap());
    assert!(rf.get("weighted avg").is_some());

    let y = stdout_json(&medisense(&store).arg("y-prob").output().unwrap());
    assert_eq!(y.as_object().unwrap().len(), 1);
    assert!(y["y_prob"].is_array());

    let data = stdout_json(&medisense(&store).arg("data").output().unwrap());
    assert_eq!(data.as_array().unwrap().len(), 6);
}

#[test]
fn test_binary_unknown_result_exits_not_found() {
    let store_dir = tempfile::TempDir::new().unwrap();

    medisense(store_dir.path())
        .args(["result", "00000000-0000-4000-8000-000000000000"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("\"error\""));
}

#[test]
fn test_binary_missing_store_is_storage_error() {
    let store_dir = tempfile::TempDir::new().unwrap();

    medisense(&store_dir.path().join("absent"))
        .arg("results")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Storage unavailable"));
}

#[test]
fn test_binary_empty_store_is_missing_target() {
    let store_dir = tempfile::TempDir::new().unwrap();

    medisense(store_dir.path())
        .args(["train", "--json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'group'"));
}
