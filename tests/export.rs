//! Export-side integration tests: record directories, file shapes,
//! payload relocation and general-message numbering.

use std::fs;

use edgelink::Error;
use edgelink::context::EdgeContext;
use edgelink::lb::{DataSnippet, General, ParamValue, Status};

const TIMESTAMP: &str = "2020-09-03T17:14:25.2-04:00";

fn exchange_root() -> (tempfile::TempDir, EdgeContext) {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("devinfo")).unwrap();
    fs::write(dir.path().join("devinfo/devnuid.txt"), "8861245090\n").unwrap();
    let context = EdgeContext::new(dir.path()).unwrap();
    (dir, context)
}

#[test]
fn context_reads_nuid_and_creates_layout() {
    let (dir, context) = exchange_root();
    assert_eq!(context.nuid(), "8861245090");
    for folder in ["lb/data", "lb/cfg", "lb/do-msg", "lb/dt-msg", "hb/do/data", "hb/dt"] {
        assert!(dir.path().join(folder).is_dir(), "missing {folder}");
    }
}

#[test]
fn context_requires_the_nuid_file() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        EdgeContext::new(dir.path()).unwrap_err(),
        Error::InvalidBasePath
    );
}

#[test]
fn timestamp_only_status_exports_exactly_one_key() {
    let (dir, context) = exchange_root();
    let status = Status::new(TIMESTAMP);

    context.export_data(&status, &mut []).unwrap();

    let status_file = dir
        .path()
        .join("lb/data")
        .join(TIMESTAMP)
        .join("sys_status.json");
    let contents = fs::read_to_string(status_file).unwrap();
    assert_eq!(contents, format!("{{\n\t\"timestamp\":\"{TIMESTAMP}\"\n}}"));
}

#[test]
fn end_to_end_status_with_latitude() {
    let (dir, context) = exchange_root();
    let mut status = Status::new(TIMESTAMP);
    status.set_latitude(47.6062).unwrap();

    context.export_data(&status, &mut []).unwrap();

    let contents = fs::read_to_string(
        dir.path()
            .join("lb/data")
            .join(TIMESTAMP)
            .join("sys_status.json"),
    )
    .unwrap();
    assert!(contents.contains(&format!("\"timestamp\":\"{TIMESTAMP}\"")));
    assert!(contents.contains("\"latitude\":47.606200"));
    assert!(!contents.contains("heading"));
    assert!(!contents.contains("roll_angle"));
}

#[test]
fn export_without_timestamp_writes_nothing() {
    let (dir, context) = exchange_root();
    let status = Status::default();

    assert_eq!(
        context.export_data(&status, &mut []),
        Err(Error::RequiredFieldMissing)
    );
    let entries: Vec<_> = fs::read_dir(dir.path().join("lb/data")).unwrap().collect();
    assert!(entries.is_empty());
}

#[test]
fn snippet_files_are_named_by_type_and_instance() {
    let (dir, context) = exchange_root();
    let status = Status::new(TIMESTAMP);
    let mut snippet = DataSnippet::new("cls", 7).unwrap();
    snippet.set_data_timestamp("2020-09-03T17:14:27.2-04:00");

    context.export_data(&status, &mut [snippet]).unwrap();

    let contents = fs::read_to_string(
        dir.path().join("lb/data").join(TIMESTAMP).join("cls7.json"),
    )
    .unwrap();
    assert!(contents.contains("\"type\":\"cls\""));
    assert!(contents.contains("\"instance\":7"));
    assert!(contents.contains("\"data_time_offset\":2000"));
}

#[test]
fn payload_file_is_moved_when_delete_on_export_is_set() {
    let (dir, context) = exchange_root();
    let payload = dir.path().join("capture.bin");
    fs::write(&payload, b"sensor bytes").unwrap();

    let status = Status::new(TIMESTAMP);
    let mut snippet = DataSnippet::new("img", 0).unwrap();
    snippet.set_data_file(&payload, true);

    context.export_data(&status, &mut [snippet]).unwrap();

    let record_dir = dir.path().join("lb/data").join(TIMESTAMP);
    assert!(!payload.exists(), "original should have been moved");
    assert_eq!(fs::read(record_dir.join("capture.bin")).unwrap(), b"sensor bytes");

    let contents = fs::read_to_string(record_dir.join("img0.json")).unwrap();
    assert!(contents.contains("\"data_file\":\"capture.bin\""));
}

#[test]
fn payload_file_is_copied_by_default() {
    let (dir, context) = exchange_root();
    let payload = dir.path().join("capture.bin");
    fs::write(&payload, b"sensor bytes").unwrap();

    let status = Status::new(TIMESTAMP);
    let mut snippet = DataSnippet::new("img", 1).unwrap();
    snippet.set_data_file(&payload, false);

    context.export_data(&status, &mut [snippet]).unwrap();

    assert!(payload.exists(), "original should remain after a copy");
    let record_dir = dir.path().join("lb/data").join(TIMESTAMP);
    assert_eq!(fs::read(record_dir.join("capture.bin")).unwrap(), b"sensor bytes");
}

#[test]
fn general_export_numbering_is_sequential_without_gaps() {
    let (dir, mut context) = exchange_root();

    let mut message = General::new();
    message.set_payload("seq", ParamValue::Int64(1));
    context.export_general(&message).unwrap();
    context.export_general(&message).unwrap();

    // A failed export must neither write a file nor consume a slot.
    let empty = General::new();
    assert_eq!(
        context.export_general(&empty),
        Err(Error::RequiredFieldMissing)
    );

    context.export_general(&message).unwrap();

    let do_dir = dir.path().join("lb/do-msg");
    assert!(do_dir.join("general_do_0.json").is_file());
    assert!(do_dir.join("general_do_1.json").is_file());
    assert!(do_dir.join("general_do_2.json").is_file());
    assert!(!do_dir.join("general_do_3.json").exists());
}
