//! Error handling and edge case tests.

use timeseries_tree::{
    Column, DataSet, DataSetConfig, Fields, Mask, MaskedCopy, Point, RecorderError, TimeSeries,
};

fn finalized(path: &str, times: &[f64]) -> DataSet {
    let mut data = DataSet::new();
    for &t in times {
        data.add_point(path, Point::at(t).with_field("x", t)).unwrap();
    }
    data.finalize().unwrap();
    data
}

// --- State Errors ---

#[test]
fn test_add_after_finalize() {
    let mut data = finalized("a/b", &[0.0, 1.0]);

    let result = data.add_point("a/b", Point::at(2.0).with_field("x", 2.0));
    assert_eq!(
        result,
        Err(RecorderError::AlreadyFinalized { path: "a/b".into() })
    );
    assert_eq!(data.series("a/b").unwrap().len(), 2);
}

#[test]
fn test_query_before_finalize() {
    let mut data = DataSet::new();
    data.add_point("a/b", Point::at(0.0)).unwrap();

    for result in [data.get_view(0.0, 1.0), data.get_after(0.0), data.get_all()] {
        assert_eq!(
            result.unwrap_err(),
            RecorderError::NotFinalized { path: "a/b".into() }
        );
    }
    assert!(data.series("a/b").unwrap().point_iter().is_err());
    assert!(data.series("a/b").unwrap().relative_times().is_err());
}

#[test]
fn test_finalize_twice() {
    let mut data = finalized("s", &[0.0]);
    assert!(matches!(
        data.finalize(),
        Err(RecorderError::AlreadyFinalized { .. })
    ));

    let mut series = TimeSeries::new();
    series.finalize().unwrap();
    assert!(matches!(
        series.finalize(),
        Err(RecorderError::AlreadyFinalized { .. })
    ));
}

#[test]
fn test_recording_resumes_after_finalize() {
    let mut data = finalized("a", &[0.0, 1.0]);

    data.add_point("b", Point::at(0.5).with_field("x", 5.0)).unwrap();
    assert_eq!(
        data.get_view(0.0, 1.0).unwrap_err(),
        RecorderError::NotFinalized { path: "b".into() }
    );

    data.finalize().unwrap();
    let view = data.get_view(0.0, 1.0).unwrap();
    assert_eq!(view.series("a").unwrap().len(), 2);
    assert_eq!(view.series("b").unwrap().scalars("x").unwrap(), &[5.0]);
    assert!(data.get_all().is_ok());
}

// --- Schema Errors ---

#[test]
fn test_field_kind_change() {
    let mut data = DataSet::new();
    data.add_point("s", Point::at(0.0).with_field("x", 1.0)).unwrap();

    let result = data.add_point("s", Point::at(1.0).with_field("x", [1.0, 2.0]));
    assert_eq!(
        result,
        Err(RecorderError::SchemaMismatch {
            path: "s".into(),
            field: "x".into(),
            expected: "scalar".into(),
            found: "vector[2]".into(),
        })
    );
}

#[test]
fn test_nested_group_replaced_by_scalar() {
    let mut data = DataSet::new();
    data.add_point(
        "s",
        Point::at(0.0).with_field("cmd", Fields::new().with("thrust", 1.0)),
    )
    .unwrap();

    let result = data.add_point("s", Point::at(1.0).with_field("cmd", 1.0));
    assert!(matches!(
        result,
        Err(RecorderError::SchemaMismatch { ref expected, ref found, .. })
            if expected == "record" && found == "scalar"
    ));
}

#[test]
fn test_missing_field_is_rejected() {
    let mut data = DataSet::new();
    data.add_point("s", Point::at(0.0).with_field("x", 1.0).with_field("y", 2.0))
        .unwrap();

    let result = data.add_point("s", Point::at(1.0).with_field("x", 1.0));
    assert!(matches!(
        result,
        Err(RecorderError::SchemaMismatch { ref path, ref field, .. })
            if path == "s" && field == "y"
    ));

    // The rejected point left nothing behind.
    data.finalize().unwrap();
    let series = data.series("s").unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series.scalars("y").unwrap().len(), 1);
}

#[test]
fn test_meta_time_presence_is_fixed() {
    let mut data = DataSet::new();
    data.add_point("with", Point::at(0.0).with_meta_time(1.0)).unwrap();
    data.add_point("without", Point::at(0.0)).unwrap();

    assert!(matches!(
        data.add_point("with", Point::at(1.0)),
        Err(RecorderError::MetaTimeMismatch { .. })
    ));
    assert!(matches!(
        data.add_point("without", Point::at(1.0).with_meta_time(2.0)),
        Err(RecorderError::MetaTimeMismatch { .. })
    ));
}

#[test]
fn test_non_finite_time() {
    let mut data = DataSet::new();
    data.add_point("s", Point::at(0.0).with_field("x", 0.0)).unwrap();

    assert!(matches!(
        data.add_point("s", Point::at(f64::NAN).with_field("x", 1.0)),
        Err(RecorderError::InvalidTime(t)) if t.is_nan()
    ));
    data.finalize().unwrap();
    assert_eq!(data.get_all().unwrap(), data);
}

// --- Path Errors ---

#[test]
fn test_invalid_paths() {
    let mut data = DataSet::new();

    assert!(matches!(
        data.add_point("", Point::at(0.0)),
        Err(RecorderError::InvalidPath(_))
    ));
    assert!(matches!(
        data.add_point("///", Point::at(0.0)),
        Err(RecorderError::InvalidPath(_))
    ));
    assert!(matches!(
        data.add_point_with_delim("a/b", "", Point::at(0.0)),
        Err(RecorderError::InvalidPath(_))
    ));
    assert!(data.is_empty());
}

#[test]
fn test_missing_paths() {
    let data = finalized("a/b", &[0.0]);

    assert!(matches!(data.node("a/c"), Err(RecorderError::PathNotFound(_))));
    assert!(matches!(data.series("x"), Err(RecorderError::PathNotFound(_))));
    assert!(data.get("missing").is_none());
}

#[test]
fn test_missing_field() {
    let data = finalized("s", &[0.0]);
    let series = data.series("s").unwrap();

    assert_eq!(
        series.column("y").unwrap_err(),
        RecorderError::FieldNotFound("y".into())
    );
    assert!(series.column("x/deeper").is_err());
}

// --- Degenerate Views ---

#[test]
fn test_out_of_range_view_is_empty() {
    let data = finalized("s", &[0.0, 1.0, 2.0]);

    let view = data.get_view(10.0, 20.0).unwrap();
    let series = view.series("s").unwrap();
    assert!(series.is_empty());
    assert!(series.scalars("x").unwrap().is_empty());
    assert_eq!(series.t0(), Some(0.0));

    let inverted = data.get_view(2.0, 0.0).unwrap();
    assert!(inverted.series("s").unwrap().is_empty());

    let nan = data.get_view(f64::NAN, f64::NAN).unwrap();
    assert!(nan.series("s").unwrap().is_empty());
}

#[test]
fn test_mask_length_mismatch() {
    let data = finalized("s", &[0.0, 1.0, 2.0]);
    let series = data.series("s").unwrap();

    assert_eq!(
        series.masked(&Mask::from_bools(vec![true; 4])).unwrap_err(),
        RecorderError::MaskLength {
            expected: 3,
            found: 4
        }
    );
}

#[test]
fn test_masked_column_rejects_wrong_length() {
    let column = Column::Vector {
        dim: 2,
        rows: 2,
        data: vec![1.0, 2.0, 3.0, 4.0].into(),
    };

    assert_eq!(
        column.masked_copy(&Mask::from_bools(vec![true, true, true])),
        Err(RecorderError::MaskLength {
            expected: 2,
            found: 3
        })
    );
    let kept = column.masked_copy(&Mask::from_bools(vec![true, true])).unwrap();
    assert_eq!(kept.len(), 2);
    assert_eq!(kept.vector_row(1), Some(&[3.0, 4.0][..]));
}

#[test]
fn test_error_paths_follow_delimiter() {
    let mut data = DataSet::with_config(DataSetConfig {
        delimiter: ".".to_string(),
    });
    data.add_point("vehicle.imu", Point::at(0.0)).unwrap();
    data.finalize().unwrap();

    let leaves: Vec<String> = data.leaves().map(|(path, _)| path).collect();
    assert_eq!(leaves, vec!["vehicle.imu"]);
    assert_eq!(
        data.finalize(),
        Err(RecorderError::AlreadyFinalized {
            path: "vehicle.imu".into()
        })
    );
    assert_eq!(
        data.add_point("vehicle.imu", Point::at(1.0)),
        Err(RecorderError::AlreadyFinalized {
            path: "vehicle.imu".into()
        })
    );
}

#[test]
fn test_error_messages() {
    let err = RecorderError::NotFinalized { path: "a/b".into() };
    assert_eq!(err.to_string(), "Series not finalized: a/b");

    let err = RecorderError::SchemaMismatch {
        path: "s".into(),
        field: "x".into(),
        expected: "scalar".into(),
        found: "missing".into(),
    };
    assert!(err.to_string().contains("'s'"));
    assert!(err.to_string().contains("'x'"));
    assert!(err.to_string().contains("missing"));
}
