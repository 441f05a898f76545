//! Host target parsing and normalization.

use bqcompile::model::{
    ColumnPart, ColumnSpec, GroupPart, QueryDescriptor, WhereClausePart, WindowKind,
};

#[test]
fn test_empty_target_is_not_raw() {
    let desc = QueryDescriptor::from_json("{}").unwrap();
    assert!(!desc.raw_query);
}

#[test]
fn test_raw_sql_target_is_raw() {
    let desc = QueryDescriptor::from_json(r#"{"rawSql": "SELECT 1"}"#).unwrap();
    assert!(desc.raw_query);
    assert_eq!(desc.raw_sql.as_deref(), Some("SELECT 1"));
}

#[test]
fn test_full_target() {
    let json = r#"{
        "dataset": "ds",
        "table": "events",
        "rawQuery": false,
        "timeColumn": "ts",
        "timeColumnType": "TIMESTAMP",
        "metricColumn": "host",
        "select": [
            [
                {"type": "column", "params": ["v"]},
                {"type": "alias", "params": ["a"]},
                {"type": "window", "params": ["rate"]},
                {"type": "aggregate", "params": ["first"]}
            ],
            [
                {"type": "column", "params": ["w"]},
                {"type": "moving_window", "params": ["avg", 4]}
            ]
        ],
        "where": [
            {"type": "macro", "name": "$__timeFilter", "params": []},
            {"type": "expression", "params": ["v", ">", "0"]}
        ],
        "group": [
            {"type": "time", "params": ["$__interval", "none"]},
            {"type": "column", "params": ["host"]}
        ]
    }"#;

    let desc = QueryDescriptor::from_json(json).unwrap();

    assert_eq!(desc.dataset.as_deref(), Some("ds"));
    assert_eq!(desc.table, "events");
    assert_eq!(desc.time_column_type.as_deref(), Some("TIMESTAMP"));
    assert_eq!(desc.metric_column(), Some("host"));
    assert_eq!(
        desc.select,
        vec![
            ColumnSpec::column("v")
                .alias("a")
                .window(WindowKind::Rate)
                .aggregate("first"),
            ColumnSpec::new(vec![
                ColumnPart::Column("w".into()),
                ColumnPart::MovingWindow {
                    function: "avg".into(),
                    rows: Some(4),
                },
            ]),
        ]
    );
    assert_eq!(
        desc.where_parts,
        vec![
            WhereClausePart::time_filter(),
            WhereClausePart::expression("v", ">", "0"),
        ]
    );
    assert_eq!(
        desc.group,
        vec![
            GroupPart::time("$__interval", Some("none")),
            GroupPart::Column("host".into()),
        ]
    );
}

#[test]
fn test_missing_sections_get_editor_defaults() {
    let desc = QueryDescriptor::from_json(r#"{"table": "t", "timeColumn": "ts"}"#).unwrap();

    assert_eq!(desc.select, vec![ColumnSpec::column("value")]);
    assert_eq!(desc.where_parts, vec![WhereClausePart::time_filter()]);
    assert!(desc.group.is_empty());
    assert_eq!(desc.metric_column(), None);
}

#[test]
fn test_explicit_empty_where_is_kept() {
    let desc = QueryDescriptor::from_json(r#"{"where": []}"#).unwrap();
    assert!(desc.where_parts.is_empty());
}

#[test]
fn test_unknown_part_type_is_an_error() {
    let err = QueryDescriptor::from_json(r#"{"group": [{"type": "fill", "params": ["0"]}]}"#)
        .unwrap_err();
    assert!(err.to_string().contains("Unknown group part type: fill"), "{}", err);
}

#[test]
fn test_serialized_descriptor_roundtrips() {
    let desc = QueryDescriptor::new("t")
        .with_dataset("ds")
        .with_time_column("ts")
        .with_metric_column("none")
        .with_select(vec![ColumnSpec::column("v")
            .percentile("percentile_cont", "0.95")
            .moving_window("avg", None)])
        .with_group(vec![GroupPart::time("5m", Some("NULL"))]);

    let json = desc.to_json().unwrap();
    assert!(json.contains(r#""where":[]"#), "{}", json);
    assert_eq!(QueryDescriptor::from_json(&json).unwrap(), desc);
}
