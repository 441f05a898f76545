//! Whole-statement assembly.

use bqcompile::compiler::{CompileError, CompileOptions, QueryCompiler, ShapeError};
use bqcompile::model::{ColumnSpec, GroupPart, QueryDescriptor, WhereClausePart, WindowKind};
use insta::assert_snapshot;

fn base() -> QueryDescriptor {
    QueryDescriptor::new("table")
        .with_time_column("t")
        .with_select(vec![ColumnSpec::column("value")])
        .with_where(vec![])
}

#[test]
fn test_complete_statement() {
    let mut desc = base();
    assert_eq!(
        QueryCompiler::new(&desc).build_query().unwrap(),
        "#standardSQL\nSELECT\n t AS time,\n  value\nFROM undefined.table\nORDER BY 1"
    );

    desc.metric_column = Some("m".into());
    assert_eq!(
        QueryCompiler::new(&desc).build_query().unwrap(),
        "#standardSQL\nSELECT\n t AS time,\n  m AS metric,\n  value\nFROM undefined.table\nORDER BY 1,2"
    );
}

#[test]
fn test_dataset_is_used_when_set() {
    let desc = base().with_dataset("metrics");
    let sql = QueryCompiler::new(&desc).build_query().unwrap();
    assert!(sql.contains("\nFROM metrics.table\n"), "{}", sql);
}

#[test]
fn test_dashboard_panel_statement() {
    let desc = QueryDescriptor::new("cpu")
        .with_dataset("monitoring")
        .with_time_column("ts")
        .with_metric_column("host")
        .with_select(vec![
            ColumnSpec::column("usage").alias("avg_usage").aggregate("avg"),
            ColumnSpec::column("bytes")
                .alias("bytes_rate")
                .aggregate("max")
                .window(WindowKind::Rate),
        ])
        .with_where(vec![
            WhereClausePart::time_filter(),
            WhereClausePart::expression("region", "=", "'eu'"),
        ])
        .with_group(vec![
            GroupPart::time("$__interval", Some("none")),
            GroupPart::Column("host".into()),
        ]);

    let sql = QueryCompiler::new(&desc).build_query().unwrap();
    assert_snapshot!(sql, @r"
    #standardSQL
    SELECT
     $__timeGroupAlias(ts,$__interval),
      host AS metric,
      avg(usage) AS avg_usage,
      max(bytes) as tmpv, (CASE WHEN max(bytes) >= lag(max(bytes)) OVER (PARTITION BY host ORDER BY ts) THEN max(bytes) - lag(max(bytes)) OVER (PARTITION BY host ORDER BY ts) WHEN lag(max(bytes)) OVER (PARTITION BY host ORDER BY ts) IS NULL THEN NULL ELSE max(bytes) END)/(UNIX_SECONDS(min(ts)) -UNIX_SECONDS(  lag(min(ts)) OVER (ORDER BY ts))) AS bytes_rate
    FROM monitoring.cpu
    WHERE
      $__timeFilter(ts) AND
      region = 'eu'
    GROUP BY 1,2
    ORDER BY 1,2
    ");
}

#[test]
fn test_moving_average_statement() {
    let desc = QueryDescriptor::new("sensor")
        .with_dataset("iot")
        .with_time_column("reading_time")
        .with_select(vec![ColumnSpec::column("temp")
            .alias("temp_ma")
            .moving_window("avg", Some(5))])
        .with_where(vec![WhereClausePart::time_filter()]);

    let sql = QueryCompiler::new(&desc).build_query().unwrap();
    assert_snapshot!(sql, @r"
    #standardSQL
    SELECT
     reading_time AS time,
      temp as tmpv, temp as tmpv, avg(temp) OVER (ORDER BY reading_time ROWS 5 PRECEDING) AS temp_ma
    FROM iot.sensor
    WHERE
      $__timeFilter(reading_time)
    ORDER BY 1
    ");
}

#[test]
fn test_statement_with_options() {
    let desc = QueryDescriptor::new("t")
        .with_select(vec![ColumnSpec::column("v").window(WindowKind::Delta)])
        .with_where(vec![]);
    let options = CompileOptions::default()
        .with_time_placeholder("_PARTITIONTIME")
        .with_dataset_placeholder("default_ds");

    let sql = QueryCompiler::with_options(&desc, options).build_query().unwrap();
    assert_eq!(
        sql,
        "#standardSQL\nSELECT\n _PARTITIONTIME AS time,\n  v as tmpv, v - lag(v) OVER (ORDER BY _PARTITIONTIME) AS v\nFROM default_ds.t\nORDER BY 1"
    );
}

#[test]
fn test_invalid_column_reports_position() {
    let desc = base().with_select(vec![
        ColumnSpec::column("a"),
        ColumnSpec::column("b"),
        ColumnSpec::column("c").aggregate("max").aggregate("min"),
    ]);

    let err = QueryCompiler::new(&desc).build_query().unwrap_err();
    assert_eq!(
        err,
        CompileError::InvalidSelectColumn {
            index: 2,
            shape: ShapeError::MultipleReducers,
        }
    );
    assert_eq!(
        err.to_string(),
        "Invalid query shape in select column 2: column spec has more than one aggregate or percentile part"
    );
}

#[test]
fn test_recompile_after_mutation() {
    let mut desc = base();
    let before = QueryCompiler::new(&desc).build_query().unwrap();

    desc.group.push(GroupPart::time("1h", Some("NULL")));
    let after = QueryCompiler::new(&desc).build_query().unwrap();

    assert_ne!(before, after);
    assert_eq!(
        after,
        "#standardSQL\nSELECT\n $__timeGroupAlias(t,1h,NULL),\n  value\nFROM undefined.table\nGROUP BY 1\nORDER BY 1"
    );
}
