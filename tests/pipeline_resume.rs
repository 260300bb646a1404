mod support;

use std::fs;

use foldrun::archive::CopyMirror;
use foldrun::layout::{ArchivePaths, ScratchPaths};
use foldrun::pipeline::{OutcomeKind, Pipeline};
use foldrun::work_unit::{UnitStatus, discover_units};
use support::fake_tools::{RecordingPredict, RecordingSearch};
use support::fixtures::BatchFixture;

#[test]
fn rerunning_an_archived_batch_invokes_no_tools() {
    let fixture = BatchFixture::new();
    fixture.add_sequence("alpha.fasta");
    fixture.add_sequence("beta.fa");
    let config = fixture.config();

    let search = RecordingSearch::writing("0.a3m");
    let predict = RecordingPredict::default();
    let pipeline = Pipeline::new(&config, &search, &predict, &CopyMirror);
    let mut units = discover_units(&fixture.input).expect("discover");
    let first = pipeline.run(&mut units);

    assert_eq!(first.count(OutcomeKind::Completed), 2);
    assert_eq!(first.tool_invocations(), 4);
    assert!(units.iter().all(|u| u.status == UnitStatus::Archived));

    let second_search = RecordingSearch::writing("0.a3m");
    let second_predict = RecordingPredict::default();
    let pipeline = Pipeline::new(&config, &second_search, &second_predict, &CopyMirror);
    let mut units = discover_units(&fixture.input).expect("discover");
    let second = pipeline.run(&mut units);

    assert_eq!(second.count(OutcomeKind::Skipped), 2);
    assert_eq!(second.tool_invocations(), 0);
    assert_eq!(second_search.call_count(), 0);
    assert_eq!(second_predict.call_count(), 0);
}

#[test]
fn search_output_is_archived_under_the_unit_name() {
    let fixture = BatchFixture::new();
    fixture.add_sequence("complex_7.fasta");
    let config = fixture.config();

    let search = RecordingSearch::writing("query_0.a3m");
    let predict = RecordingPredict::default();
    let pipeline = Pipeline::new(&config, &search, &predict, &CopyMirror);
    let mut units = discover_units(&fixture.input).expect("discover");
    let report = pipeline.run(&mut units);

    assert!(report.is_success());
    let archived = ArchivePaths::new(&fixture.archive, "complex_7");
    let body = fs::read_to_string(&archived.search_result).expect("archived result");
    assert!(body.starts_with("#a3m\n>chain_a"));
    assert!(!archived.search_dir.join("query_0.a3m").exists());
    assert_eq!(*predict.calls.borrow(), vec!["complex_7".to_string()]);
    assert!(
        archived
            .prediction_dir
            .join("complex_7_unrelaxed_rank_001_model_1.pdb")
            .is_file()
    );
    assert!(!ScratchPaths::new(&fixture.scratch, "complex_7").unit_dir.exists());
}

#[test]
fn archived_search_with_empty_prediction_reruns_only_prediction() {
    let fixture = BatchFixture::new();
    fixture.add_sequence("gamma.fasta");
    let config = fixture.config();
    let archived = ArchivePaths::new(&fixture.archive, "gamma");
    fs::create_dir_all(&archived.search_dir).expect("search dir");
    fs::write(&archived.search_result, "#a3m\n>archived\nMKV\n").expect("archived result");
    fs::create_dir_all(&archived.prediction_dir).expect("prediction dir");

    let search = RecordingSearch::writing("0.a3m");
    let predict = RecordingPredict::default();
    let pipeline = Pipeline::new(&config, &search, &predict, &CopyMirror);
    let mut units = discover_units(&fixture.input).expect("discover");
    let report = pipeline.run(&mut units);

    assert_eq!(report.count(OutcomeKind::Completed), 1);
    assert!(!report.units[0].ran_search);
    assert!(report.units[0].ran_predict);
    assert_eq!(search.call_count(), 0);
    assert_eq!(predict.call_count(), 1);
    assert_eq!(
        fs::read_to_string(&archived.search_result).expect("result"),
        "#a3m\n>archived\nMKV\n"
    );
    assert!(archived.prediction_dir.join("gamma.done.txt").is_file());
}

#[test]
fn a_failing_unit_does_not_stop_the_batch() {
    let fixture = BatchFixture::new();
    for name in ["a.fasta", "b.fasta", "c.fasta"] {
        fixture.add_sequence(name);
    }
    let config = fixture.config();

    let mut search = RecordingSearch::writing("0.a3m");
    search.failing.insert("b".to_string());
    let predict = RecordingPredict::default();
    let pipeline = Pipeline::new(&config, &search, &predict, &CopyMirror);
    let mut units = discover_units(&fixture.input).expect("discover");
    let report = pipeline.run(&mut units);

    assert!(!report.is_success());
    assert!(!report.stopped_early);
    let outcomes: Vec<_> = report.units.iter().map(|u| u.outcome).collect();
    assert_eq!(
        outcomes,
        [
            OutcomeKind::Completed,
            OutcomeKind::Failed,
            OutcomeKind::Completed
        ]
    );
    let failed = report.failed_units().next().expect("one failure");
    assert_eq!(failed.unit_id, "b");
    assert_eq!(failed.status, "pending");
    assert!(failed.error.as_deref().unwrap_or_default().contains("search"));

    let log = fs::read_to_string(ArchivePaths::new(&fixture.archive, "b").log_file).expect("log");
    assert!(log.contains("recording search for b"));
    assert!(log.contains("failed at status pending"));
}

#[test]
fn prediction_without_outputs_keeps_the_search_result_on_scratch() {
    let fixture = BatchFixture::new();
    fixture.add_sequence("delta.fasta");
    let config = fixture.config();

    let search = RecordingSearch::writing("0.a3m");
    let silent = RecordingPredict {
        writes_nothing: true,
        ..Default::default()
    };
    let pipeline = Pipeline::new(&config, &search, &silent, &CopyMirror);
    let mut units = discover_units(&fixture.input).expect("discover");
    let report = pipeline.run(&mut units);
    assert_eq!(report.count(OutcomeKind::Failed), 1);
    assert_eq!(units[0].status, UnitStatus::SearchDone);

    let scratch = ScratchPaths::new(&fixture.scratch, "delta");
    assert!(scratch.search_result.is_file());

    let predict = RecordingPredict::default();
    let pipeline = Pipeline::new(&config, &search, &predict, &CopyMirror);
    let mut units = discover_units(&fixture.input).expect("discover");
    let report = pipeline.run(&mut units);

    assert!(report.is_success());
    assert_eq!(search.call_count(), 1);
    assert_eq!(predict.call_count(), 1);
    assert!(ArchivePaths::new(&fixture.archive, "delta").search_result.is_file());
}
