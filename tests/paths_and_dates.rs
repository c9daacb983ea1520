use datalake_utils::{
    is_temp_file, iter_dates, last_segment, resolve_index_path, streamset_path, DatalakeError, ReadDate,
};
use serde_json::json;
use time::macros::date;

/// The same partition path comes out whether the date is a calendar value or an ISO string.
#[test]
fn index_path_accepts_date_or_iso_string() {
    let from_date = resolve_index_path("prod", "disney", date!(2018 - 03 - 07)).unwrap();
    let from_str = resolve_index_path("prod", "disney", "2018-03-07").unwrap();
    let from_string = resolve_index_path("prod", "disney", String::from("2018-03-07")).unwrap();

    assert_eq!(from_date, "streamsets/prod/disney/2018-03-07");
    assert_eq!(from_str, from_date);
    assert_eq!(from_string, from_date);
}

/// Stream-set and index are passed through verbatim.
#[test]
fn index_path_passes_segments_through() {
    let p = resolve_index_path("Staging Set", "Brand_X", date!(2020 - 12 - 31)).unwrap();
    assert_eq!(p, "streamsets/Staging Set/Brand_X/2020-12-31");
}

#[test]
fn index_path_rejects_non_date_arguments() {
    let err = resolve_index_path("prod", "disney", 20180307i64).unwrap_err();
    assert!(matches!(err, DatalakeError::InvalidArgument(_)), "got {err:?}");

    let err = resolve_index_path("prod", "disney", &json!(20180307)).unwrap_err();
    assert!(matches!(err, DatalakeError::InvalidArgument(_)), "got {err:?}");

    let err = resolve_index_path("prod", "disney", "07/03/2018").unwrap_err();
    assert!(matches!(err, DatalakeError::InvalidArgument(_)), "got {err:?}");
}

#[test]
fn index_path_accepts_json_string_dates() {
    let p = resolve_index_path("prod", "disney", &json!("2019-01-02")).unwrap();
    assert_eq!(p, "streamsets/prod/disney/2019-01-02");
}

#[test]
fn read_date_displays_iso() {
    let d: ReadDate = "2021-02-03".parse().unwrap();
    assert_eq!(d.to_string(), "2021-02-03");
    assert_eq!(d.date(), date!(2021 - 02 - 03));
}

/// Iteration crosses month ends and is empty when reversed.
#[test]
fn date_iteration_is_inclusive() {
    let start: ReadDate = "2020-02-28".parse().unwrap();
    let end: ReadDate = "2020-03-01".parse().unwrap();
    let days: Vec<String> = iter_dates(start, end).map(|d| d.to_string()).collect();
    assert_eq!(days, vec!["2020-02-28", "2020-02-29", "2020-03-01"]);
    assert_eq!(iter_dates(end, start).count(), 0);
}

#[test]
fn temp_files_and_segments() {
    assert!(is_temp_file("streamsets/prod/disney/2018-03-07/part-0001_tmp"));
    assert!(is_temp_file("streamsets/prod/disney/2018-03-07/_tmp_part"));
    assert!(!is_temp_file("streamsets/prod/disney/2018-03-07/part-0001.json"));

    assert_eq!(last_segment("uploads/test.txt"), "test.txt");
    assert_eq!(last_segment("test.txt"), "test.txt");
    assert_eq!(last_segment("a/b/dir/"), "dir");
    assert_eq!(streamset_path("prod"), "streamsets/prod");
}
