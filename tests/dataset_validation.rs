mod common;

use std::fs;
use std::path::Path;

use common::{DatasetSpec, PREFIX, controller, write_dataset};
use rica::error::LoadError;
use rica::io::FsSource;
use rica::session::{Dataset, SessionEvent, SessionState};

#[test]
fn loads_a_complete_folder() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &DatasetSpec::new(5));

    let ds = Dataset::load(&FsSource::default(), dir.path()).unwrap();
    assert_eq!(ds.n_comps(), 5);
    assert_eq!(ds.entities.len(), 5);
    assert_eq!(ds.entities.elbows().kappa, Some(40.0));
    assert_eq!(ds.entities.elbows().rho, Some(15.0));
    assert_eq!(ds.volume.tr(), Some(2.0));
    assert_eq!(ds.sample_interval(true), 2.0);
    assert_eq!(ds.sample_interval(false), 1.0);
    assert!(ds.document.extra.contains_key("n_echos"));
    assert!(ds.files.is_some());
}

#[test]
fn uncompressed_volume_under_gz_name_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    let spec = DatasetSpec {
        gzip: false,
        ..DatasetSpec::new(3)
    };
    write_dataset(dir.path(), &spec);
    assert!(Dataset::load(&FsSource::default(), dir.path()).is_ok());
}

#[test]
fn component_count_mismatch_is_rejected_and_keeps_previous_dataset() {
    let root = tempfile::tempdir().unwrap();
    let good = root.path().join("good");
    let bad = root.path().join("bad");
    write_dataset(&good, &DatasetSpec::new(30));
    write_dataset(
        &bad,
        &DatasetSpec {
            mixing_cols: 30,
            metrics_rows: 30,
            ..DatasetSpec::new(29)
        },
    );

    let err = Dataset::load(&FsSource::default(), &bad).unwrap_err();
    assert!(
        matches!(err, LoadError::ShapeMismatch { table: 30, volume: 29, .. }),
        "{err}"
    );

    let (mut ctl, _view) = controller();
    ctl.load_folder(&good).unwrap();
    ctl.submit(SessionEvent::TableSelect(Some(7)));
    let before = ctl.run_cycle();
    assert_eq!(before.dataset_version, 1);

    assert!(ctl.load_folder(&bad).is_err());
    let after = ctl.run_cycle();
    assert_eq!(ctl.state(), SessionState::Ready);
    assert_eq!(after.dataset_version, 1);
    assert_eq!(after.selection, before.selection);
    assert_eq!(after.dataset.as_ref().unwrap().n_comps(), 30);
    assert!(after.error.as_deref().unwrap().contains("does not match"));
}

#[test]
fn metrics_rows_must_match_volume() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(
        dir.path(),
        &DatasetSpec {
            metrics_rows: 4,
            ..DatasetSpec::new(5)
        },
    );
    let err = Dataset::load(&FsSource::default(), dir.path()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::ShapeMismatch {
            what: "metrics table",
            table: 4,
            volume: 5
        }
    ));
}

#[test]
fn missing_file_is_not_found_and_session_stays_idle() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &DatasetSpec::new(3));
    fs::remove_file(dir.path().join(format!("{PREFIX}desc-ICA_mixing.tsv"))).unwrap();

    let (mut ctl, _view) = controller();
    ctl.submit(SessionEvent::LoadFolder(dir.path().to_path_buf()));
    let frame = ctl.run_cycle();
    assert_eq!(frame.state, SessionState::Idle);
    assert!(frame.dataset.is_none());
    assert!(frame.error.as_deref().unwrap().contains("desc-ICA_mixing.tsv"));

    let err = Dataset::load(&FsSource::default(), dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
}

#[test]
fn malformed_document_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(
        dir.path(),
        &DatasetSpec {
            document: "[1, 2, 3]".to_string(),
            ..DatasetSpec::new(3)
        },
    );
    let err = Dataset::load(&FsSource::default(), dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::MalformedDocument { .. }), "{err}");
}

#[test]
fn empty_path_is_its_own_error() {
    let err = Dataset::load(&FsSource::default(), Path::new("")).unwrap_err();
    assert!(matches!(err, LoadError::EmptyPath));
    assert_eq!(err.to_string(), "please enter a folder path");
}
