//! Value column rendering: reducers, window computations and moving windows.

use bqcompile::compiler::{CompileError, QueryCompiler, ShapeError};
use bqcompile::model::{ColumnSpec, QueryDescriptor, WindowKind};

fn build(desc: &QueryDescriptor, column: ColumnSpec) -> String {
    QueryCompiler::new(desc).build_value_column(&column).unwrap()
}

// ============================================================================
// Without metric column
// ============================================================================

#[test]
fn test_bare_column() {
    let desc = QueryDescriptor::default();
    assert_eq!(build(&desc, ColumnSpec::column("value")), "value");
}

#[test]
fn test_column_with_alias() {
    let desc = QueryDescriptor::default();
    assert_eq!(
        build(&desc, ColumnSpec::column("value").alias("alias")),
        "value AS alias"
    );
}

#[test]
fn test_aggregate() {
    let desc = QueryDescriptor::default();
    assert_eq!(
        build(&desc, ColumnSpec::column("v").alias("a").aggregate("max")),
        "max(v) AS a"
    );
}

#[test]
fn test_increase_without_time_column() {
    let desc = QueryDescriptor::default();
    assert_eq!(
        build(
            &desc,
            ColumnSpec::column("v").alias("a").window(WindowKind::Increase)
        ),
        "v as tmpv, (CASE WHEN v >= lag(v) OVER (ORDER BY -- time --) \
         THEN v - lag(v) OVER (ORDER BY -- time --) \
         WHEN lag(v) OVER (ORDER BY -- time --) IS NULL THEN NULL ELSE v END) AS a"
    );
}

#[test]
fn test_delta_without_time_column() {
    let desc = QueryDescriptor::default();
    assert_eq!(
        build(
            &desc,
            ColumnSpec::column("v").alias("a").window(WindowKind::Delta)
        ),
        "v as tmpv, v - lag(v) OVER (ORDER BY -- time --) AS a"
    );
}

#[test]
fn test_rate() {
    let desc = QueryDescriptor::default().with_time_column("timC");
    assert_eq!(
        build(&desc, ColumnSpec::column("v").alias("a").window(WindowKind::Rate)),
        "v as tmpv, (CASE WHEN v >= lag(v) OVER (ORDER BY timC) THEN v - lag(v) OVER (ORDER BY timC) \
         WHEN lag(v) OVER (ORDER BY timC) IS NULL THEN NULL ELSE v END)\
         /(UNIX_SECONDS(timC) -UNIX_SECONDS(  lag(timC) OVER (ORDER BY timC))) AS a"
    );
}

#[test]
fn test_rate_with_first_listed_after_window() {
    let desc = QueryDescriptor::default().with_time_column("timC");
    let column = ColumnSpec::column("v")
        .alias("a")
        .window(WindowKind::Rate)
        .aggregate("first");
    assert_eq!(
        build(&desc, column),
        "first(v,timC) as tmpv, (CASE WHEN first(v,timC) >= lag(first(v,timC)) OVER (ORDER BY timC) \
         THEN first(v,timC) - lag(first(v,timC)) OVER (ORDER BY timC) \
         WHEN lag(first(v,timC)) OVER (ORDER BY timC) IS NULL THEN NULL ELSE first(v,timC) END)\
         /(UNIX_SECONDS(min(timC)) -UNIX_SECONDS(  lag(min(timC)) OVER (ORDER BY timC))) AS a"
    );
}

#[test]
fn test_rate_with_percentile() {
    let desc = QueryDescriptor::default().with_time_column("timC");
    let column = ColumnSpec::column("v")
        .alias("a")
        .window(WindowKind::Rate)
        .percentile("p1", "p2");
    assert_eq!(
        build(&desc, column),
        "p1(p2) WITHIN GROUP (ORDER BY v) as tmpv, \
         (CASE WHEN p1(p2) WITHIN GROUP (ORDER BY v) >= lag(p1(p2) WITHIN GROUP (ORDER BY v)) OVER (ORDER BY timC) \
         THEN p1(p2) WITHIN GROUP (ORDER BY v) - lag(p1(p2) WITHIN GROUP (ORDER BY v)) OVER (ORDER BY timC) \
         WHEN lag(p1(p2) WITHIN GROUP (ORDER BY v)) OVER (ORDER BY timC) IS NULL THEN NULL \
         ELSE p1(p2) WITHIN GROUP (ORDER BY v) END)\
         /(UNIX_SECONDS(min(timC)) -UNIX_SECONDS(  lag(min(timC)) OVER (ORDER BY timC))) AS a"
    );
}

#[test]
fn test_moving_window_without_size() {
    let desc = QueryDescriptor::default().with_time_column("timC");
    assert_eq!(
        build(
            &desc,
            ColumnSpec::column("v")
                .alias("a")
                .moving_window("moving_window", None)
        ),
        "v as tmpv, v as tmpv, moving_window(v) OVER (ORDER BY timC ROWS undefined PRECEDING) AS a"
    );
}

#[test]
fn test_window_without_alias_uses_column_name() {
    let desc = QueryDescriptor::default().with_time_column("t");
    assert_eq!(
        build(&desc, ColumnSpec::column("v").window(WindowKind::Delta)),
        "v as tmpv, v - lag(v) OVER (ORDER BY t) AS v"
    );
}

#[test]
fn test_quoted_names_pass_through() {
    let desc = QueryDescriptor::default().with_time_column("`ts`");
    assert_eq!(
        build(
            &desc,
            ColumnSpec::column("`v`").alias("`a b`").window(WindowKind::Delta)
        ),
        "`v` as tmpv, `v` - lag(`v`) OVER (ORDER BY `ts`) AS `a b`"
    );
}

// ============================================================================
// With metric column
// ============================================================================

fn with_metric() -> QueryDescriptor {
    QueryDescriptor::default().with_metric_column("host")
}

#[test]
fn test_metric_does_not_affect_plain_columns() {
    let desc = with_metric();
    assert_eq!(build(&desc, ColumnSpec::column("value")), "value");
    assert_eq!(
        build(&desc, ColumnSpec::column("value").alias("alias")),
        "value AS alias"
    );
    assert_eq!(
        build(&desc, ColumnSpec::column("v").alias("a").aggregate("max")),
        "max(v) AS a"
    );
}

#[test]
fn test_increase_partitioned_by_metric() {
    let desc = with_metric();
    assert_eq!(
        build(
            &desc,
            ColumnSpec::column("v").alias("a").window(WindowKind::Increase)
        ),
        "v as tmpv, (CASE WHEN v >= lag(v) OVER (PARTITION BY host ORDER BY -- time --) \
         THEN v - lag(v) OVER (PARTITION BY host ORDER BY -- time --) \
         WHEN lag(v) OVER (PARTITION BY host ORDER BY -- time --) IS NULL THEN NULL ELSE v END) AS a"
    );
}

#[test]
fn test_aggregated_increase_partitioned_by_metric() {
    let desc = with_metric();
    let column = ColumnSpec::column("v")
        .alias("a")
        .aggregate("max")
        .window(WindowKind::Increase);
    assert_eq!(
        build(&desc, column),
        "max(v) as tmpv, (CASE WHEN max(v) >= lag(max(v)) OVER (PARTITION BY host ORDER BY -- time --) \
         THEN max(v) - lag(max(v)) OVER (PARTITION BY host ORDER BY -- time --) \
         WHEN lag(max(v)) OVER (PARTITION BY host ORDER BY -- time --) IS NULL THEN NULL ELSE max(v) END) AS a"
    );
}

#[test]
fn test_rate_divisor_is_never_partitioned() {
    let desc = with_metric().with_time_column("t");
    let sql = build(
        &desc,
        ColumnSpec::column("v")
            .alias("a")
            .aggregate("sum")
            .window(WindowKind::Rate),
    );
    assert!(sql.contains("lag(sum(v)) OVER (PARTITION BY host ORDER BY t)"));
    assert!(sql.ends_with(
        "/(UNIX_SECONDS(min(t)) -UNIX_SECONDS(  lag(min(t)) OVER (ORDER BY t))) AS a"
    ));
}

#[test]
fn test_metric_sentinel_disables_partition() {
    let desc = QueryDescriptor::default()
        .with_metric_column("none")
        .with_time_column("t");
    assert_eq!(
        build(
            &desc,
            ColumnSpec::column("v").alias("a").window(WindowKind::Delta)
        ),
        "v as tmpv, v - lag(v) OVER (ORDER BY t) AS a"
    );
}

#[test]
fn test_moving_window_is_never_partitioned() {
    let desc = with_metric().with_time_column("t");
    assert_eq!(
        build(&desc, ColumnSpec::column("v").moving_window("avg", Some(3))),
        "v as tmpv, v as tmpv, avg(v) OVER (ORDER BY t ROWS 3 PRECEDING) AS v"
    );
}

// ============================================================================
// Shape errors
// ============================================================================

#[test]
fn test_window_and_moving_window_rejected() {
    let desc = QueryDescriptor::default();
    let column = ColumnSpec::column("v")
        .moving_window("avg", Some(3))
        .window(WindowKind::Increase);

    let err = QueryCompiler::new(&desc)
        .build_value_column(&column)
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::InvalidQueryShape(ShapeError::ConflictingWindows)
    );
}

#[test]
fn test_window_without_column_rejected() {
    let desc = QueryDescriptor::default();
    let column = ColumnSpec::default().alias("a").window(WindowKind::Delta);

    let err = QueryCompiler::new(&desc)
        .build_value_column(&column)
        .unwrap_err();
    assert_eq!(err.shape(), ShapeError::MissingColumn);
    assert_eq!(
        err.to_string(),
        "Invalid query shape: column spec has no column part"
    );
}
