use std::fs;
use std::path::PathBuf;

use pipewatch::config::ReaderOptions;
use pipewatch::graph::env::KEY_BATCH_NUMBER;
use pipewatch::lock::lock_dir_for;
use pipewatch::reader::PipelineReader;
use pipewatch::types::NodeKind;
use pipewatch_test_utils::{
    builders::{DescriptorBuilder, ProjectBuilder},
    init_tracing,
};
use tempfile::TempDir;

const DESCRIPTOR: &str = "default_pipeline";

fn small_pipeline() -> DescriptorBuilder {
    DescriptorBuilder::new()
        .file_node("Import/job001/movies.star")
        .file_node("MotionCorr/job002/corrected_micrographs.star")
        .process("Import/job001/")
        .process("MotionCorr/job002/")
        .input_edge("Import/job001/movies.star", "MotionCorr/job002/")
        .output_edge("Import/job001/", "Import/job001/movies.star")
        .output_edge(
            "MotionCorr/job002/",
            "MotionCorr/job002/corrected_micrographs.star",
        )
}

#[test]
fn load_builds_file_and_job_nodes_with_edges() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let project = ProjectBuilder::new(tmp.path());
    project.write_descriptor(DESCRIPTOR, &small_pipeline()).unwrap();

    let mut reader = PipelineReader::new(tmp.path(), ReaderOptions::default()).unwrap();
    reader.load(DESCRIPTOR).unwrap();

    let graph = reader.graph();
    assert_eq!(graph.len(), 4);
    assert_eq!(
        graph.node("Import/job001").unwrap().kind(),
        NodeKind::Job
    );
    assert_eq!(
        graph.node("Import/job001/movies.star").unwrap().kind(),
        NodeKind::File
    );

    // Import job -> movies.star -> MotionCorr job.
    assert!(graph
        .node("Import/job001")
        .unwrap()
        .has_edge_to("Import/job001/movies.star"));
    assert!(graph
        .node("Import/job001/movies.star")
        .unwrap()
        .has_edge_to("MotionCorr/job002"));
}

#[test]
fn aliases_land_in_the_job_environment() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let project = ProjectBuilder::new(tmp.path());
    let descriptor = DescriptorBuilder::new()
        .process_with_alias("MotionCorr/job002/", "motioncorr_live")
        .process("Import/job001/");
    project.write_descriptor(DESCRIPTOR, &descriptor).unwrap();

    let mut reader = PipelineReader::new(tmp.path(), ReaderOptions::default()).unwrap();
    reader.load(DESCRIPTOR).unwrap();

    let job = reader.graph().node("MotionCorr/job002").unwrap();
    assert_eq!(job.env.alias.as_deref(), Some("motioncorr_live"));
    assert!(reader.graph().node("Import/job001").unwrap().env.alias.is_none());
}

#[test]
fn batch_split_files_get_a_staged_batch_number() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let project = ProjectBuilder::new(tmp.path());
    let descriptor = DescriptorBuilder::new()
        .file_node("Select/job005/particles_split2.star")
        .file_node("Select/job005/particles.star")
        .process("Select/job005/");
    project.write_descriptor(DESCRIPTOR, &descriptor).unwrap();

    let mut reader = PipelineReader::new(tmp.path(), ReaderOptions::default()).unwrap();
    reader.load(DESCRIPTOR).unwrap();

    let split = reader
        .graph()
        .node("Select/job005/particles_split2.star")
        .unwrap();
    assert_eq!(
        split.env.pending().get(KEY_BATCH_NUMBER).and_then(|v| v.as_number()),
        Some(2)
    );

    let plain = reader.graph().node("Select/job005/particles.star").unwrap();
    assert!(plain.env.pending().is_empty());
}

#[test]
fn class_files_only_count_under_the_initial_model_stage() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let project = ProjectBuilder::new(tmp.path());
    let descriptor = DescriptorBuilder::new()
        .file_node("InitialModel/job010/run_class3.mrc")
        .file_node("Class3D/job011/run_class3.mrc")
        .process("InitialModel/job010/");
    project.write_descriptor(DESCRIPTOR, &descriptor).unwrap();

    let mut reader = PipelineReader::new(tmp.path(), ReaderOptions::default()).unwrap();
    reader.load(DESCRIPTOR).unwrap();

    let init_model = reader
        .graph()
        .node("InitialModel/job010/run_class3.mrc")
        .unwrap();
    assert!(init_model.env.has_pending("init_model_class_num"));

    let other_stage = reader.graph().node("Class3D/job011/run_class3.mrc").unwrap();
    assert!(!other_stage.env.has_pending("init_model_class_num"));
}

#[test]
fn unknown_edge_endpoint_aborts_the_load() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let project = ProjectBuilder::new(tmp.path());
    let descriptor = DescriptorBuilder::new()
        .file_node("Import/job001/movies.star")
        .process("Import/job001/")
        .input_edge("Import/job001/movies.star", "Ghost/job099/");
    project.write_descriptor(DESCRIPTOR, &descriptor).unwrap();

    let mut reader = PipelineReader::new(tmp.path(), ReaderOptions::default()).unwrap();
    reader.load(DESCRIPTOR).unwrap_err();
    assert!(reader.graph().is_empty());
}

#[test]
fn failed_load_keeps_the_previous_graph() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let project = ProjectBuilder::new(tmp.path());
    project.write_descriptor(DESCRIPTOR, &small_pipeline()).unwrap();

    let mut reader = PipelineReader::new(tmp.path(), ReaderOptions::default()).unwrap();
    reader.load(DESCRIPTOR).unwrap();
    assert_eq!(reader.graph().len(), 4);

    let bad = DescriptorBuilder::new()
        .file_node("Import/job001/movies.star")
        .process("Import/job001/")
        .input_edge("Import/job001/movies.star", "Ghost/job099/");
    project.write_descriptor(DESCRIPTOR, &bad).unwrap();
    reader.invalidate_cache();

    reader.load(DESCRIPTOR).unwrap_err();
    // No partial graph was published; the last good one is still visible.
    assert_eq!(reader.graph().len(), 4);
}

#[test]
fn missing_descriptor_degrades_to_an_empty_graph() {
    init_tracing();
    let tmp = TempDir::new().unwrap();

    let mut reader = PipelineReader::new(tmp.path(), ReaderOptions::default()).unwrap();
    reader.load(DESCRIPTOR).unwrap();
    assert!(reader.graph().is_empty());
}

#[test]
fn held_lock_degrades_to_an_empty_read() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let project = ProjectBuilder::new(tmp.path());
    project.write_descriptor(DESCRIPTOR, &small_pipeline()).unwrap();

    // Simulate the external writer holding the lock.
    let lock_dir = lock_dir_for(&tmp.path().join(DESCRIPTOR));
    fs::create_dir(&lock_dir).unwrap();

    let options = ReaderOptions {
        locked_paths: vec![PathBuf::from(DESCRIPTOR)],
        lock_attempts: 2,
        lock_backoff_ms: 1,
        ..ReaderOptions::default()
    };
    let mut reader = PipelineReader::new(tmp.path(), options).unwrap();

    reader.load(DESCRIPTOR).unwrap();
    assert!(reader.graph().is_empty());

    // Writer releases the lock; the next poll catches up.
    fs::remove_dir(&lock_dir).unwrap();
    reader.load(DESCRIPTOR).unwrap();
    assert_eq!(reader.graph().len(), 4);
    // And our own lock was released again after the read.
    assert!(!lock_dir.exists());
}

#[test]
fn unlisted_descriptors_are_read_without_locking() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let project = ProjectBuilder::new(tmp.path());
    project.write_descriptor(DESCRIPTOR, &small_pipeline()).unwrap();

    // Lock held, but the descriptor is not in the lock-list.
    let lock_dir = lock_dir_for(&tmp.path().join(DESCRIPTOR));
    fs::create_dir(&lock_dir).unwrap();

    let mut reader = PipelineReader::new(tmp.path(), ReaderOptions::default()).unwrap();
    reader.load(DESCRIPTOR).unwrap();
    assert_eq!(reader.graph().len(), 4);
}

#[test]
fn cache_invalidation_forces_a_reparse() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let project = ProjectBuilder::new(tmp.path());
    project.write_descriptor(DESCRIPTOR, &small_pipeline()).unwrap();

    let mut reader = PipelineReader::new(tmp.path(), ReaderOptions::default()).unwrap();
    reader.load(DESCRIPTOR).unwrap();
    reader.invalidate_cache();
    reader.load(DESCRIPTOR).unwrap();
    assert_eq!(reader.graph().len(), 4);
}
