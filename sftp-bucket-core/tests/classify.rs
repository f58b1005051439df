use sftp_bucket_core::classify::{classify, ArtifactKind, FileDescriptor};

#[test]
fn standalone_csv_has_no_part_number() {
    let d = classify("20240115_report.csv").expect("standard name should classify");
    assert_eq!(
        d,
        FileDescriptor {
            part_number: None,
            date: "20240115".to_string(),
            base_name: "report".to_string(),
            kind: ArtifactKind::Plain,
            original_name: "20240115_report.csv".to_string(),
        }
    );
    assert!(!d.is_archive());
}

#[test]
fn numeric_prefix_becomes_part_number() {
    let d = classify("01_20240115_report.csv").expect("multi-part name should classify");
    assert_eq!(d.part_number, Some(1));
    assert_eq!(d.date, "20240115");
    assert_eq!(d.base_name, "report");
    assert_eq!(d.original_name, "01_20240115_report.csv");
}

#[test]
fn leading_zeros_do_not_change_part_number() {
    let padded = classify("001_20240115_report.csv").unwrap();
    let bare = classify("1_20240115_report.csv").unwrap();
    assert_eq!(padded.part_number, bare.part_number);
    assert_eq!(padded.group_key(), bare.group_key());
}

#[test]
fn zip_extension_marks_archive() {
    let d = classify("20240115_sales.zip").unwrap();
    assert_eq!(d.kind, ArtifactKind::Archive);
    assert!(d.is_archive());
    assert_eq!(d.base_name, "sales");
}

#[test]
fn underscores_inside_base_name_are_kept() {
    let d = classify("03_20240115_daily_sales_eu.csv").unwrap();
    assert_eq!(d.part_number, Some(3));
    assert_eq!(d.date, "20240115");
    assert_eq!(d.base_name, "daily_sales_eu");
}

#[test]
fn date_is_the_segment_after_the_prefix() {
    // A leading 8-digit run followed by another date is a part number.
    let d = classify("20240115_20240116_x.csv").unwrap();
    assert_eq!(d.part_number, Some(20240115));
    assert_eq!(d.date, "20240116");
    assert_eq!(d.base_name, "x");
}

#[test]
fn dotted_base_name_stops_at_final_extension() {
    let d = classify("20240115_report.v2.csv").unwrap();
    assert_eq!(d.base_name, "report.v2");
    assert_eq!(d.kind, ArtifactKind::Plain);
}

#[test]
fn unrecognised_names_are_rejected() {
    let rejected = [
        "report.csv",
        "2024011_report.csv",
        "20240115report.csv",
        "20240115_report.txt",
        "20240115_report.csv.bak",
        "20240115_.csv",
        "a1_20240115_report.csv",
        "x20240115_report.csv",
        "20240115_report.CSV",
        "",
        ".",
        "..",
    ];
    for name in rejected {
        assert!(classify(name).is_none(), "{name:?} should be rejected");
    }
}

#[test]
fn oversized_prefix_still_marks_a_part() {
    let d = classify("123456789012345678901234_20240115_report.csv")
        .expect("well-formed name with a long prefix should classify");
    assert_eq!(d.part_number, Some(u64::MAX));
    assert_eq!(d.date, "20240115");
    assert_eq!(d.base_name, "report");
}

#[test]
fn classification_is_deterministic() {
    let names = [
        "20240115_report.csv",
        "02_20240115_report.csv",
        "20240301_archive_set.zip",
        "not-a-data-file.txt",
    ];
    for name in names {
        assert_eq!(classify(name), classify(name));
    }
}
