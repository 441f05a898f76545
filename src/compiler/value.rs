//! Value column rendering.
//!
//! A column spec is first classified into a [`ColumnShape`] (one column,
//! optional alias, at most one reducer, at most one window stage), then its
//! stages are folded over a [`ValueState`] in a fixed order: reducer first,
//! window second, whatever order the parts were listed in.
//!
//! Window stages need the reduced value three times (current row, lagged row,
//! and the output itself), so they emit `<reduced> as tmpv` helper columns
//! ahead of the final aliased expression.

use crate::model::{ColumnPart, ColumnSpec, WindowKind};
use crate::sql::token::{Token, TokenStream};

use super::error::ShapeError;

/// Aggregates that take the time column as an ordering argument.
const TIME_ORDERED_AGGREGATES: &[&str] = &["first", "last"];

/// Ambient descriptor values the value builder reads.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueContext<'a> {
    /// Time column, or the placeholder when unset.
    pub time_column: &'a str,
    pub metric_column: Option<&'a str>,
    pub rows_placeholder: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Reducer<'a> {
    Aggregate(&'a str),
    Percentile { function: &'a str, argument: &'a str },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WindowStage<'a> {
    Lag(WindowKind),
    Moving { function: &'a str, rows: Option<u32> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage<'a> {
    Reduce(Reducer<'a>),
    Window(WindowStage<'a>),
}

/// A column spec with its parts sorted into roles.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ColumnShape<'a> {
    column: &'a str,
    alias: Option<&'a str>,
    reducer: Option<Reducer<'a>>,
    window: Option<WindowStage<'a>>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, err: ShapeError) -> Result<(), ShapeError> {
    if slot.is_some() {
        return Err(err);
    }
    *slot = Some(value);
    Ok(())
}

impl<'a> ColumnShape<'a> {
    pub fn from_spec(spec: &'a ColumnSpec) -> Result<Self, ShapeError> {
        let mut column = None;
        let mut alias = None;
        let mut reducer = None;
        let mut window = None;

        for part in spec.parts() {
            match part {
                ColumnPart::Column(name) => {
                    set_once(&mut column, name.as_str(), ShapeError::MultipleColumns)?
                }
                ColumnPart::Alias(name) => {
                    set_once(&mut alias, name.as_str(), ShapeError::MultipleAliases)?
                }
                ColumnPart::Aggregate(func) => set_once(
                    &mut reducer,
                    Reducer::Aggregate(func.as_str()),
                    ShapeError::MultipleReducers,
                )?,
                ColumnPart::Percentile { function, argument } => set_once(
                    &mut reducer,
                    Reducer::Percentile {
                        function: function.as_str(),
                        argument: argument.as_str(),
                    },
                    ShapeError::MultipleReducers,
                )?,
                ColumnPart::Window(kind) => {
                    Self::set_window(&mut window, WindowStage::Lag(*kind))?
                }
                ColumnPart::MovingWindow { function, rows } => Self::set_window(
                    &mut window,
                    WindowStage::Moving {
                        function: function.as_str(),
                        rows: *rows,
                    },
                )?,
            }
        }

        Ok(Self {
            column: column.ok_or(ShapeError::MissingColumn)?,
            alias,
            reducer,
            window,
        })
    }

    fn set_window(
        slot: &mut Option<WindowStage<'a>>,
        stage: WindowStage<'a>,
    ) -> Result<(), ShapeError> {
        match (*slot, stage) {
            (None, _) => {
                *slot = Some(stage);
                Ok(())
            }
            (Some(WindowStage::Lag(_)), WindowStage::Lag(_))
            | (Some(WindowStage::Moving { .. }), WindowStage::Moving { .. }) => {
                Err(ShapeError::MultipleWindows)
            }
            _ => Err(ShapeError::ConflictingWindows),
        }
    }

    fn stages(&self) -> Vec<Stage<'a>> {
        self.reducer
            .map(Stage::Reduce)
            .into_iter()
            .chain(self.window.map(Stage::Window))
            .collect()
    }

    /// Fold the stages and render the final select-list fragment.
    pub fn render(&self, ctx: &ValueContext<'_>) -> TokenStream {
        let state = self
            .stages()
            .into_iter()
            .fold(ValueState::new(self.column), |state, stage| {
                state.apply(stage, ctx)
            });

        // Derived expressions always get a name; a bare column only when asked.
        let alias = match (self.alias, state.is_derived()) {
            (Some(alias), _) => Some(alias),
            (None, true) => Some(self.column),
            (None, false) => None,
        };
        state.finish(alias)
    }
}

/// Accumulator threaded through the stage fold.
#[derive(Debug, Clone)]
struct ValueState {
    /// Current SQL for the value.
    expr: TokenStream,
    /// The value after reduction; equal to the bare column until a reducer runs.
    reduced_expr: TokenStream,
    reduced: bool,
    /// `<x> as tmpv` helper columns emitted ahead of `expr`.
    prelude: Vec<TokenStream>,
}

impl ValueState {
    fn new(column: &str) -> Self {
        let mut expr = TokenStream::new();
        expr.push(Token::Ident(column.to_string()));
        Self {
            reduced_expr: expr.clone(),
            expr,
            reduced: false,
            prelude: vec![],
        }
    }

    fn is_derived(&self) -> bool {
        self.reduced || !self.prelude.is_empty()
    }

    fn apply(mut self, stage: Stage<'_>, ctx: &ValueContext<'_>) -> Self {
        match stage {
            Stage::Reduce(reducer) => {
                self.expr = reduce(&self.expr, reducer, ctx);
                self.reduced_expr = self.expr.clone();
                self.reduced = true;
            }
            Stage::Window(WindowStage::Lag(kind)) => {
                self.prelude.push(tmpv(&self.reduced_expr));
                self.expr = lag_window(&self.reduced_expr, kind, self.reduced, ctx);
            }
            Stage::Window(WindowStage::Moving { function, rows }) => {
                // The helper column appears twice in this form.
                self.prelude.push(tmpv(&self.reduced_expr));
                self.prelude.push(tmpv(&self.reduced_expr));
                self.expr = moving_window(&self.reduced_expr, function, rows, ctx);
            }
        }
        self
    }

    fn finish(self, alias: Option<&str>) -> TokenStream {
        let mut ts = TokenStream::new();
        for helper in &self.prelude {
            ts.append(helper).comma().space();
        }
        ts.append(&self.expr);
        if let Some(alias) = alias {
            ts.space()
                .push(Token::As)
                .space()
                .push(Token::Ident(alias.to_string()));
        }
        ts
    }
}

fn reduce(expr: &TokenStream, reducer: Reducer<'_>, ctx: &ValueContext<'_>) -> TokenStream {
    let mut ts = TokenStream::new();
    match reducer {
        Reducer::Aggregate(func) => {
            ts.push(Token::FunctionName(func.to_string()))
                .lparen()
                .append(expr);
            if TIME_ORDERED_AGGREGATES.contains(&func) {
                ts.comma().push(Token::Ident(ctx.time_column.to_string()));
            }
            ts.rparen();
        }
        Reducer::Percentile { function, argument } => {
            ts.push(Token::FunctionName(function.to_string()))
                .lparen()
                .raw(argument)
                .rparen()
                .space()
                .push(Token::WithinGroup)
                .space()
                .lparen()
                .push(Token::OrderBy)
                .space()
                .append(expr)
                .rparen();
        }
    }
    ts
}

fn tmpv(value: &TokenStream) -> TokenStream {
    let mut ts = value.clone();
    ts.space()
        .push(Token::AsLower)
        .space()
        .push(Token::Ident("tmpv".into()));
    ts
}

/// `[PARTITION BY <metric> ]ORDER BY <order>`
fn over_clause(partition: Option<&str>, order: &str) -> TokenStream {
    let mut ts = TokenStream::new();
    if let Some(metric) = partition {
        ts.push(Token::PartitionBy)
            .space()
            .push(Token::Ident(metric.to_string()))
            .space();
    }
    ts.push(Token::OrderBy)
        .space()
        .push(Token::Ident(order.to_string()));
    ts
}

/// `lag(<value>) OVER (<over>)`
fn lag(value: &TokenStream, over: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName("lag".into()))
        .lparen()
        .append(value)
        .rparen()
        .space()
        .push(Token::Over)
        .space()
        .lparen()
        .append(over)
        .rparen();
    ts
}

/// Counter-reset aware increase:
/// `(CASE WHEN c >= p THEN c - p WHEN p IS NULL THEN NULL ELSE c END)`
fn increase(curr: &TokenStream, prev: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.lparen()
        .push(Token::Case)
        .space()
        .push(Token::When)
        .space()
        .append(curr)
        .space()
        .push(Token::Gte)
        .space()
        .append(prev)
        .space()
        .push(Token::Then)
        .space()
        .append(curr)
        .space()
        .push(Token::Minus)
        .space()
        .append(prev)
        .space()
        .push(Token::When)
        .space()
        .append(prev)
        .space()
        .push(Token::IsNull)
        .space()
        .push(Token::Then)
        .space()
        .push(Token::Null)
        .space()
        .push(Token::Else)
        .space()
        .append(curr)
        .space()
        .push(Token::End)
        .rparen();
    ts
}

fn unix_seconds(value: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName("UNIX_SECONDS".into()))
        .lparen()
        .append(value)
        .rparen();
    ts
}

fn lag_window(
    value: &TokenStream,
    kind: WindowKind,
    reduced: bool,
    ctx: &ValueContext<'_>,
) -> TokenStream {
    let over = over_clause(ctx.metric_column, ctx.time_column);
    let prev = lag(value, &over);

    match kind {
        WindowKind::Delta => {
            let mut ts = value.clone();
            ts.space().push(Token::Minus).space().append(&prev);
            ts
        }
        WindowKind::Increase => increase(value, &prev),
        WindowKind::Rate => {
            // The time reference must sit at the same grain as the value.
            let mut time = TokenStream::new();
            if reduced {
                time.push(Token::FunctionName("min".into()))
                    .lparen()
                    .push(Token::Ident(ctx.time_column.to_string()))
                    .rparen();
            } else {
                time.push(Token::Ident(ctx.time_column.to_string()));
            }
            // The divisor's window is never partitioned.
            let prev_time = lag(&time, &over_clause(None, ctx.time_column));

            let mut elapsed = TokenStream::new();
            elapsed.space().push(Token::Space).append(&prev_time);

            let mut ts = increase(value, &prev);
            ts.push(Token::Div)
                .lparen()
                .append(&unix_seconds(&time))
                .space()
                .push(Token::Minus)
                .append(&unix_seconds(&elapsed))
                .rparen();
            ts
        }
    }
}

fn moving_window(
    value: &TokenStream,
    function: &str,
    rows: Option<u32>,
    ctx: &ValueContext<'_>,
) -> TokenStream {
    let rows = match rows {
        Some(n) => Token::LitInt(i64::from(n)),
        None => Token::Raw(ctx.rows_placeholder.to_string()),
    };

    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName(function.to_string()))
        .lparen()
        .append(value)
        .rparen()
        .space()
        .push(Token::Over)
        .space()
        .lparen()
        .append(&over_clause(None, ctx.time_column))
        .space()
        .push(Token::Rows)
        .space()
        .push(rows)
        .space()
        .push(Token::Preceding)
        .rparen();
    ts
}
