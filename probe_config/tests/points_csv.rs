use std::fs::File;
use std::io::Write;

use probe_config::{PointRow, load_points_csv, save_points_csv};
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn loads_points_with_exact_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("points.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw,reference").unwrap();
    writeln!(f, "16.8,0.0").unwrap();
    writeln!(f, "494.2, 100.0").unwrap();
    drop(f);

    let rows = load_points_csv(&path).unwrap();
    assert_eq!(
        rows,
        vec![
            PointRow {
                raw: 16.8,
                reference: 0.0
            },
            PointRow {
                raw: 494.2,
                reference: 100.0
            },
        ]
    );
}

#[rstest]
fn rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("points.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw,celsius").unwrap();
    writeln!(f, "100,0.0").unwrap();
    drop(f);

    let err = load_points_csv(&path).expect_err("should fail on header");
    assert!(
        format!("{err}").contains("must have headers 'raw,reference'"),
        "unexpected error: {err}"
    );
}

#[rstest]
fn reports_row_number_of_bad_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("points.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw,reference").unwrap();
    writeln!(f, "100,0.0").unwrap();
    writeln!(f, "abc,100.0").unwrap();
    drop(f);

    let err = load_points_csv(&path).expect_err("should fail on bad row");
    assert!(format!("{err}").contains("invalid CSV row 3"));
}

#[rstest]
fn saved_points_load_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("captured.csv");
    let rows = vec![
        PointRow {
            raw: 401.25,
            reference: 25.0,
        },
        PointRow {
            raw: 812.5,
            reference: 100.0,
        },
    ];
    save_points_csv(&path, &rows).unwrap();
    assert_eq!(load_points_csv(&path).unwrap(), rows);
}

#[rstest]
fn missing_file_names_the_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.csv");
    let err = load_points_csv(&path).expect_err("missing file");
    assert!(format!("{err}").contains("nope.csv"));
}
