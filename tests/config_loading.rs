use pipewatch::config::{load_and_validate, validate_options, ReaderOptions};
use pipewatch_test_utils::{builders::ProjectBuilder, init_tracing};
use tempfile::TempDir;

#[test]
fn defaults_cover_every_field() {
    init_tracing();
    let options = ReaderOptions::default();

    assert_eq!(options.collapse_origin, "Import/job001");
    assert_eq!(options.lock_attempts, 5);
    assert_eq!(options.markers.success, "JOB_EXIT_SUCCESS");
    assert_eq!(options.log_glob, "pipeline_*.log");
    assert!(options.locked_paths.is_empty());
    validate_options(&options).unwrap();
}

#[test]
fn toml_overrides_merge_with_defaults() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let project = ProjectBuilder::new(tmp.path());
    project
        .write_file(
            "Pipewatch.toml",
            r#"
locked_paths = ["default_pipeline"]
collapse_origin = "Import/job005"

[markers]
failure = "RELION_JOB_EXIT_FAILURE"
"#,
        )
        .unwrap();

    let options = load_and_validate(tmp.path().join("Pipewatch.toml")).unwrap();
    assert_eq!(options.collapse_origin, "Import/job005");
    assert_eq!(options.markers.failure, "RELION_JOB_EXIT_FAILURE");
    // Untouched fields keep their defaults.
    assert_eq!(options.markers.success, "JOB_EXIT_SUCCESS");
    assert_eq!(options.lock_attempts, 5);
}

#[test]
fn empty_collapse_origin_is_rejected() {
    init_tracing();
    let options = ReaderOptions {
        collapse_origin: "  ".to_string(),
        ..ReaderOptions::default()
    };
    assert!(validate_options(&options).is_err());
}

#[test]
fn zero_lock_attempts_are_rejected() {
    init_tracing();
    let options = ReaderOptions {
        lock_attempts: 0,
        ..ReaderOptions::default()
    };
    assert!(validate_options(&options).is_err());
}

#[test]
fn execution_pattern_must_capture_the_job_path() {
    init_tracing();
    let options = ReaderOptions {
        execution_line_pattern: "executing new job".to_string(),
        ..ReaderOptions::default()
    };
    let err = validate_options(&options).unwrap_err();
    assert!(err.to_string().contains("capture group"));
}

#[test]
fn malformed_glob_is_rejected() {
    init_tracing();
    let options = ReaderOptions {
        log_glob: "pipeline_[.log".to_string(),
        ..ReaderOptions::default()
    };
    assert!(validate_options(&options).is_err());
}
