//! End-to-end tests for the preprocessing pipeline.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use cluster_prep::data::loader::load_table;
use cluster_prep::data::writer::write_table;
use cluster_prep::preprocess::stats::Moments;
use cluster_prep::{ClusterTable, FileFormat, OutputTag, PipelineConfig, PrepError, Preprocessor};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

/// Deterministic table with every default column. Rows 0 and 1 fail a cut.
fn realistic_table(n: usize) -> ClusterTable {
    let config = PipelineConfig::default();
    let columns = config.columns.iter().map(|name| {
        let values: Vec<f64> = (0..n)
            .map(|i| {
                let x = i as f64;
                match name.as_str() {
                    "clusterE" if i == 0 => -1.0,
                    "cluster_ENG_CALIB_TOT" if i == 1 => 0.2,
                    "clusterE" => 0.5 + (x * 0.37).sin().abs() * 10.0,
                    "cluster_ENG_CALIB_TOT" => 0.4 + (x * 0.11).cos().abs() * 5.0,
                    "cluster_time" => (x * 1.3).sin() * 20.0,
                    "cluster_EM_PROBABILITY" => (x * 0.29).sin() * 0.5 + 0.5,
                    // includes zeros and negatives, exercising the log shift
                    "cluster_AVG_LAR_Q" => (i % 7) as f64 - 2.0,
                    _ => 1.0 + (x * 0.53 + name.len() as f64).sin().abs() * 3.0,
                }
            })
            .collect();
        (name.clone(), values)
    });
    ClusterTable::from_columns(columns).unwrap()
}

fn config_in(dir: &Path, apply_normalisation: bool) -> PipelineConfig {
    PipelineConfig {
        apply_normalisation,
        input_dir: dir.join("raw"),
        output_dir: dir.join("processed"),
        ..PipelineConfig::default()
    }
}

fn write_input(dir: &Path, name: &str, table: &ClusterTable) -> PathBuf {
    let raw = dir.join("raw");
    std::fs::create_dir_all(&raw).unwrap();
    let path = raw.join(name);
    write_table(table, &path).unwrap();
    path
}

fn expected_columns(config: &PipelineConfig) -> Vec<String> {
    let mut names: Vec<String> = config
        .columns
        .iter()
        .filter(|c| *c != "cluster_SIGNIFICANCE" && *c != "cluster_ENG_CALIB_TOT")
        .cloned()
        .collect();
    names.push("cluster_response".to_string());
    names
}

fn assert_standard(values: &[f64]) {
    let m = Moments::of(values);
    assert!(m.mean.abs() < 1e-6, "mean {}", m.mean);
    assert!((m.std - 1.0).abs() < 1e-6, "std {}", m.std);
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn cuts_then_response_on_three_rows() {
    let mut table = ClusterTable::from_columns([
        ("clusterE", vec![-1.0, 2.0, 5.0]),
        ("cluster_ENG_CALIB_TOT", vec![1.0, 1.0, 0.2]),
        ("cluster_CENTER_LAMBDA", vec![1.0; 3]),
        ("cluster_FIRST_ENG_DENS", vec![1.0; 3]),
        ("cluster_SECOND_TIME", vec![1.0; 3]),
        ("cluster_SIGNIFICANCE", vec![1.0; 3]),
        ("cluster_time", vec![0.0; 3]),
    ])
    .unwrap();

    let config = PipelineConfig {
        apply_normalisation: false,
        ..PipelineConfig::default()
    };
    let report = Preprocessor::new(config).run(&mut table).unwrap();

    assert_eq!(report.tag, OutputTag::Raw);
    assert_eq!(report.cuts.rows_after, 1);
    assert!(report.transforms.is_none());
    assert_eq!(table.column("clusterE").unwrap(), &[2.0]);
    assert_eq!(table.column("cluster_response").unwrap(), &[2.0]);
}

// ============================================================================
// In-memory pipeline properties
// ============================================================================

#[test]
fn output_column_set_is_exact() {
    let config = PipelineConfig::default();
    let mut table = realistic_table(200);
    Preprocessor::new(config.clone()).run(&mut table).unwrap();

    let names: Vec<String> = table.column_names().iter().map(|s| s.to_string()).collect();
    assert_eq!(names, expected_columns(&config));
}

#[test]
fn response_matches_pre_drop_ratio() {
    let source = realistic_table(200);
    let config = PipelineConfig {
        apply_normalisation: false,
        ..PipelineConfig::default()
    };
    let mut table = source.clone();
    Preprocessor::new(config).run(&mut table).unwrap();

    // rows 0 and 1 were cut, everything else survives
    let e = &source.column("clusterE").unwrap()[2..];
    let calib = &source.column("cluster_ENG_CALIB_TOT").unwrap()[2..];
    let response = table.column("cluster_response").unwrap();
    assert_eq!(response.len(), e.len());
    for ((r, e), c) in response.iter().zip(e).zip(calib) {
        let expected = e / c;
        assert!((r - expected).abs() <= 1e-9 * expected.abs());
    }
}

#[test]
fn normalised_features_are_standard() {
    let config = PipelineConfig::default();
    let mut table = realistic_table(500);
    let report = Preprocessor::new(config.clone()).run(&mut table).unwrap();

    for feature in &config.normal_features {
        assert_standard(table.column(feature).unwrap());
    }
    assert_standard(table.column("cluster_time").unwrap());

    let transforms = report.transforms.unwrap();
    assert_eq!(transforms.log_scaling.len(), config.log_features.len());
    assert_eq!(transforms.standardised.len(), config.normal_features.len());
}

#[test]
fn log_only_feature_with_non_positive_values_stays_finite() {
    // Keep AVG_LAR_Q out of the standardisation to inspect the log output.
    let mut config = PipelineConfig::default();
    config.normal_features.retain(|f| f != "cluster_AVG_LAR_Q");

    let source = realistic_table(100);
    let mut table = source.clone();
    let report = Preprocessor::new(config).run(&mut table).unwrap();

    let (_, scaling) = report
        .transforms
        .unwrap()
        .log_scaling
        .into_iter()
        .find(|(f, _)| f == "cluster_AVG_LAR_Q")
        .unwrap();
    assert!(scaling.shift() > 2.0);

    let out = table.column("cluster_AVG_LAR_Q").unwrap();
    let raw = &source.column("cluster_AVG_LAR_Q").unwrap()[2..];
    assert!(out.iter().all(|v| v.is_finite()));
    for (y, x) in out.iter().zip(raw) {
        assert!((scaling.invert(*y) - x).abs() < 1e-6);
    }
}

#[test]
fn unnormalised_columns_pass_through() {
    let source = realistic_table(50);
    let mut table = source.clone();
    Preprocessor::new(PipelineConfig::default()).run(&mut table).unwrap();

    assert_eq!(
        table.column("avgMu").unwrap(),
        &source.column("avgMu").unwrap()[2..]
    );
}

#[test]
fn missing_log_feature_aborts_before_transforming() {
    let mut config = PipelineConfig::default();
    config.columns.push("cluster_PHI".to_string());
    config.log_features.push("cluster_PHI".to_string());

    let mut table = realistic_table(20);
    let err = Preprocessor::new(config).run(&mut table).unwrap_err();
    assert_eq!(
        err,
        PrepError::MissingColumn {
            column: "cluster_PHI".into()
        }
    );
    // cuts and response ran, transforms did not
    assert!(table.contains("cluster_response"));
    assert!(table.column("clusterE").unwrap().iter().all(|&e| e > 0.0));
}

#[test]
fn constant_feature_turns_non_finite() {
    let mut table = realistic_table(30);
    table
        .column_mut("cluster_ISOLATION")
        .unwrap()
        .iter_mut()
        .for_each(|v| *v = 0.25);

    let report = Preprocessor::new(PipelineConfig::default()).run(&mut table).unwrap();
    let (_, moments) = report
        .transforms
        .unwrap()
        .standardised
        .into_iter()
        .find(|(f, _)| f == "cluster_ISOLATION")
        .unwrap();

    assert!(moments.is_degenerate());
    assert!(table.column("cluster_ISOLATION").unwrap().iter().all(|v| v.is_nan()));
}

// ============================================================================
// File-level runs
// ============================================================================

#[test]
fn process_file_writes_tagged_parquet() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "mc20a_withPU.parquet", &realistic_table(100));

    let config = config_in(dir.path(), true);
    let output = Preprocessor::new(config.clone()).process_file(&input).unwrap();

    assert_eq!(output, dir.path().join("processed/mc20a_withPU_norm.parquet"));
    let back = load_table(&output, &expected_columns(&config)).unwrap();
    assert_eq!(back.len(), 98);
    assert_standard(back.column("clusterE").unwrap());
}

#[test]
fn raw_and_norm_outputs_do_not_collide() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "mc23e_noPU.parquet", &realistic_table(40));

    let norm = Preprocessor::new(config_in(dir.path(), true)).process_file(&input).unwrap();
    let raw = Preprocessor::new(config_in(dir.path(), false)).process_file(&input).unwrap();

    assert_ne!(norm, raw);
    assert!(norm.exists() && raw.exists());
    assert!(raw.ends_with("mc23e_noPU_raw.parquet"));
}

#[test]
fn repeated_runs_are_byte_identical() {
    for apply in [false, true] {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "mc20d_withPU.parquet", &realistic_table(64));
        let preprocessor = Preprocessor::new(config_in(dir.path(), apply));

        let out = preprocessor.process_file(&input).unwrap();
        let first = std::fs::read(&out).unwrap();
        preprocessor.process_file(&input).unwrap();
        let second = std::fs::read(&out).unwrap();

        assert_eq!(first, second, "apply_normalisation = {apply}");
    }
}

#[test]
fn csv_input_and_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "mc23a_withPU.csv", &realistic_table(30));

    let config = PipelineConfig {
        output_format: FileFormat::Csv,
        ..config_in(dir.path(), false)
    };
    let output = Preprocessor::new(config.clone()).process_file(&input).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, expected_columns(&config).join(","));
    assert_eq!(text.lines().count(), 1 + 28);
}

#[test]
fn missing_source_column_names_input_and_column() {
    let dir = TempDir::new().unwrap();
    let mut table = realistic_table(10);
    table.drop_column("cluster_SECOND_TIME").unwrap();
    let input = write_input(dir.path(), "mc20e_noPU.parquet", &table);

    let err = Preprocessor::new(config_in(dir.path(), true))
        .process_file(&input)
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("mc20e_noPU.parquet"), "{message}");
    assert_eq!(
        err.downcast_ref::<PrepError>(),
        Some(&PrepError::MissingColumn {
            column: "cluster_SECOND_TIME".into()
        })
    );
    assert!(!dir.path().join("processed").exists());
}

#[test]
fn extra_source_columns_are_ignored() {
    let dir = TempDir::new().unwrap();
    let mut table = realistic_table(10);
    table.push_column("eventNumber", (0..10).map(f64::from).collect()).unwrap();
    let input = write_input(dir.path(), "mc20a_noPU.parquet", &table);

    let config = config_in(dir.path(), false);
    let output = Preprocessor::new(config.clone()).process_file(&input).unwrap();

    let names: BTreeSet<String> = load_table(&output, &expected_columns(&config))
        .unwrap()
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert!(!names.contains("eventNumber"));
    assert_eq!(names.len(), 17);
}
