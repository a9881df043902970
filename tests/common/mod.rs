//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use medisense::store::FileStore;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

/// The five-record dataset: three classes, eight numeric and two
/// categorical feature columns, no missing values.
pub fn create_scenario_records() -> DataFrame {
    df! {
        "subject_id" => ["id1", "id2", "id3", "id4", "id5"],
        "mri_id" => ["mr1", "mr2", "mr3", "mr4", "mr5"],
        "group" => ["Nondemented", "Demented", "Converted", "Nondemented", "Demented"],
        "age" => [88i64, 74, 65, 80, 79],
        "educ" => [14i64, 16, 12, 10, 13],
        "ses" => [2i64, 3, 2, 1, 3],
        "mmse" => [30i64, 29, 26, 28, 27],
        "cdr" => [0.0f64, 1.0, 0.5, 0.0, 0.5],
        "etiv" => [2004i64, 1500, 1800, 1600, 1700],
        "nwbv" => [0.681f64, 0.700, 0.695, 0.688, 0.689],
        "asf" => [0.876f64, 0.900, 0.870, 0.880, 0.879],
        "gender" => ["M", "F", "F", "M", "F"],
        "hand" => ["R", "L", "R", "R", "L"],
    }
    .unwrap()
}

/// Synthetic longitudinal records with learnable group structure and a
/// sprinkling of missing `ses` / `mmse` values.
pub fn create_synthetic_records(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut subject_id = Vec::with_capacity(rows);
    let mut mri_id = Vec::with_capacity(rows);
    let mut group = Vec::with_capacity(rows);
    let mut visit = Vec::with_capacity(rows);
    let mut mr_delay = Vec::with_capacity(rows);
    let mut gender = Vec::with_capacity(rows);
    let mut hand = Vec::with_capacity(rows);
    let mut age = Vec::with_capacity(rows);
    let mut educ = Vec::with_capacity(rows);
    let mut ses: Vec<Option<f64>> = Vec::with_capacity(rows);
    let mut mmse: Vec<Option<f64>> = Vec::with_capacity(rows);
    let mut cdr = Vec::with_capacity(rows);
    let mut etiv = Vec::with_capacity(rows);
    let mut nwbv = Vec::with_capacity(rows);
    let mut asf = Vec::with_capacity(rows);

    for i in 0..rows {
        let class = i % 3;
        let (label, cdr_value, mmse_range) = match class {
            0 => ("Nondemented", 0.0, 28.0f64..30.0),
            1 => ("Demented", 1.0, 16.0f64..24.0),
            _ => ("Converted", 0.5, 25.0f64..28.0),
        };

        subject_id.push(format!("OAS2_{:04}", i / 2 + 1));
        mri_id.push(format!("OAS2_{:04}_MR{}", i / 2 + 1, i % 2 + 1));
        group.push(label);
        visit.push((i % 2 + 1) as i64);
        mr_delay.push(if i % 2 == 0 { 0i64 } else { rng.gen_range(300..900) });
        gender.push(if rng.gen_bool(0.5) { "M" } else { "F" });
        hand.push("R");
        age.push(rng.gen_range(60.0..95.0f64).round());
        educ.push(rng.gen_range(6..23) as i64);
        ses.push(if rng.gen_bool(0.1) { None } else { Some(rng.gen_range(1..6) as f64) });
        mmse.push(if rng.gen_bool(0.05) { None } else { Some(rng.gen_range(mmse_range).round()) });
        cdr.push(cdr_value);
        etiv.push(rng.gen_range(1100.0..2000.0f64));
        nwbv.push(0.80 - 0.05 * class as f64 + rng.gen_range(-0.02f64..0.02));
        asf.push(rng.gen_range(0.88..1.59f64));
    }

    df! {
        "subject_id" => subject_id,
        "mri_id" => mri_id,
        "group" => group,
        "visit" => visit,
        "mr_delay" => mr_delay,
        "gender" => gender,
        "hand" => hand,
        "age" => age,
        "educ" => educ,
        "ses" => ses,
        "mmse" => mmse,
        "cdr" => cdr,
        "etiv" => etiv,
        "nwbv" => nwbv,
        "asf" => asf,
    }
    .unwrap()
}

/// Create an empty store in a fresh temporary directory
pub fn create_temp_store() -> (TempDir, FileStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::open(temp_dir.path()).unwrap();
    (temp_dir, store)
}

/// Write `df` as CSV to `dir/name`
pub fn write_csv(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    path
}

/// Longitudinal CSV export with its source headers
pub fn create_long_csv_frame() -> DataFrame {
    df! {
        "Subject ID" => ["OAS2_0001", "OAS2_0001", "OAS2_0002", "OAS2_0002", "OAS2_0004", "OAS2_0005"],
        "MRI ID" => ["OAS2_0001_MR1", "OAS2_0001_MR2", "OAS2_0002_MR1", "OAS2_0002_MR2", "OAS2_0004_MR1", "OAS2_0005_MR1"],
        "Group" => ["Nondemented", "Nondemented", "Demented", "Demented", "Converted", "Converted"],
        "Visit" => [1i64, 2, 1, 2, 1, 1],
        "MR Delay" => [0i64, 457, 0, 560, 0, 0],
        "M/F" => ["M", "M", "M", "M", "F", "F"],
        "Hand" => ["R", "R", "R", "R", "R", "R"],
        "Age" => [87i64, 88, 75, 76, 88, 80],
        "EDUC" => [14i64, 14, 12, 12, 18, 12],
        "SES" => [Some(2.0f64), Some(2.0), None, None, Some(3.0), Some(4.0)],
        "MMSE" => [Some(27.0f64), Some(30.0), Some(23.0), Some(28.0), Some(28.0), Some(28.0)],
        "CDR" => [0.0f64, 0.0, 0.5, 0.5, 0.0, 0.0],
        "eTIV" => [1987i64, 2004, 1678, 1738, 1215, 1689],
        "nWBV" => [0.696f64, 0.681, 0.736, 0.713, 0.710, 0.712],
        "ASF" => [0.883f64, 0.876, 1.046, 1.010, 1.444, 1.039],
    }
    .unwrap()
}

/// Cross-sectional CSV export with its source headers
pub fn create_cross_csv_frame() -> DataFrame {
    df! {
        "ID" => ["OAS1_0001_MR1", "OAS1_0002_MR1", "OAS1_0003_MR1"],
        "M/F" => ["F", "F", "F"],
        "Hand" => ["R", "R", "R"],
        "Age" => [74i64, 55, 73],
        "Educ" => [Some(2i64), Some(4), Some(4)],
        "SES" => [Some(3.0f64), Some(1.0), Some(3.0)],
        "MMSE" => [Some(29.0f64), Some(29.0), Some(27.0)],
        "CDR" => [Some(0.0f64), Some(0.0), Some(0.5)],
        "eTIV" => [1344i64, 1147, 1454],
        "nWBV" => [0.743f64, 0.810, 0.708],
        "ASF" => [1.306f64, 1.531, 1.207],
        "Delay" => [None::<f64>, None, None],
    }
    .unwrap()
}

/// Directory holding `long.csv` and `cross.csv`
pub fn create_csv_exports() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_csv(temp_dir.path(), "long.csv", &mut create_long_csv_frame());
    write_csv(temp_dir.path(), "cross.csv", &mut create_cross_csv_frame());
    temp_dir
}
