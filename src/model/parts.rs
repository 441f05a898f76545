//! Tagged query parts.
//!
//! On the wire every part is an object of the form
//! `{ "type": <kind>, "params": [...] }` (where-clause macros also carry a
//! `name`). In Rust each category is a closed enum so the clause builders
//! match exhaustively; conversion to and from the wire form goes through
//! [`RawPart`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors raised while converting wire-format parts into typed parts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    #[error("Unknown {category} part type: {kind}")]
    UnknownKind { category: &'static str, kind: String },

    #[error("Part '{kind}' is missing parameter {index}")]
    MissingParam { kind: String, index: usize },

    #[error("Part '{kind}' has invalid parameter: {value}")]
    InvalidParam { kind: String, value: String },

    #[error("Unknown window kind: {0}")]
    UnknownWindow(String),

    #[error("Unknown where macro: {0}")]
    UnknownMacro(String),
}

/// Wire form shared by all part categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    params: Vec<Value>,
}

impl RawPart {
    fn new(kind: &str, params: Vec<Value>) -> Self {
        Self {
            kind: kind.to_string(),
            name: None,
            params,
        }
    }

    /// Parameter `index` as text. Numbers and booleans are accepted and
    /// rendered the way they were written.
    fn param(&self, index: usize) -> Option<String> {
        match self.params.get(index)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    fn required(&self, index: usize) -> Result<String, DescriptorError> {
        self.param(index).ok_or_else(|| DescriptorError::MissingParam {
            kind: self.kind.clone(),
            index,
        })
    }
}

fn text(s: &str) -> Value {
    Value::String(s.to_string())
}

// =============================================================================
// Column parts
// =============================================================================

/// Time-series comparison against the preceding row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Increase,
    Delta,
    Rate,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Increase => "increase",
            WindowKind::Delta => "delta",
            WindowKind::Rate => "rate",
        }
    }
}

impl std::str::FromStr for WindowKind {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increase" => Ok(WindowKind::Increase),
            "delta" => Ok(WindowKind::Delta),
            "rate" => Ok(WindowKind::Rate),
            other => Err(DescriptorError::UnknownWindow(other.to_string())),
        }
    }
}

/// One element of a [`ColumnSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPart", into = "RawPart")]
pub enum ColumnPart {
    /// Base column reference.
    Column(String),
    /// Output name.
    Alias(String),
    /// `fn(expr)` reducer.
    Aggregate(String),
    /// `fn(arg) WITHIN GROUP (ORDER BY expr)` reducer.
    Percentile { function: String, argument: String },
    /// Lag-based comparison against the previous row.
    Window(WindowKind),
    /// `fn(expr) OVER (ORDER BY time ROWS n PRECEDING)`.
    MovingWindow { function: String, rows: Option<u32> },
}

impl TryFrom<RawPart> for ColumnPart {
    type Error = DescriptorError;

    fn try_from(raw: RawPart) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "column" => Ok(ColumnPart::Column(raw.required(0)?)),
            "alias" => Ok(ColumnPart::Alias(raw.required(0)?)),
            "aggregate" => Ok(ColumnPart::Aggregate(raw.required(0)?)),
            "percentile" => Ok(ColumnPart::Percentile {
                function: raw.required(0)?,
                argument: raw.required(1)?,
            }),
            "window" => Ok(ColumnPart::Window(raw.required(0)?.parse()?)),
            "moving_window" => {
                let rows = match raw.param(1) {
                    Some(value) => Some(value.trim().parse::<u32>().map_err(|_| {
                        DescriptorError::InvalidParam {
                            kind: raw.kind.clone(),
                            value,
                        }
                    })?),
                    None => None,
                };
                Ok(ColumnPart::MovingWindow {
                    function: raw.required(0)?,
                    rows,
                })
            }
            other => Err(DescriptorError::UnknownKind {
                category: "column",
                kind: other.to_string(),
            }),
        }
    }
}

impl From<ColumnPart> for RawPart {
    fn from(part: ColumnPart) -> Self {
        match part {
            ColumnPart::Column(name) => RawPart::new("column", vec![text(&name)]),
            ColumnPart::Alias(name) => RawPart::new("alias", vec![text(&name)]),
            ColumnPart::Aggregate(func) => RawPart::new("aggregate", vec![text(&func)]),
            ColumnPart::Percentile { function, argument } => {
                RawPart::new("percentile", vec![text(&function), text(&argument)])
            }
            ColumnPart::Window(kind) => RawPart::new("window", vec![text(kind.as_str())]),
            ColumnPart::MovingWindow { function, rows } => {
                let mut params = vec![text(&function)];
                if let Some(n) = rows {
                    params.push(Value::from(n));
                }
                RawPart::new("moving_window", params)
            }
        }
    }
}

/// One output value column: an ordered list of parts.
///
/// Built fluently for programmatic use:
///
/// ```
/// use bqcompile::model::{ColumnSpec, WindowKind};
///
/// let spec = ColumnSpec::column("v")
///     .alias("a")
///     .aggregate("max")
///     .window(WindowKind::Increase);
/// assert_eq!(spec.parts().len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use = "builders have no effect until used"]
pub struct ColumnSpec(pub Vec<ColumnPart>);

impl ColumnSpec {
    pub fn new(parts: Vec<ColumnPart>) -> Self {
        Self(parts)
    }

    pub fn column(name: &str) -> Self {
        Self(vec![ColumnPart::Column(name.into())])
    }

    pub fn parts(&self) -> &[ColumnPart] {
        &self.0
    }

    pub fn push(mut self, part: ColumnPart) -> Self {
        self.0.push(part);
        self
    }

    pub fn alias(self, name: &str) -> Self {
        self.push(ColumnPart::Alias(name.into()))
    }

    pub fn aggregate(self, func: &str) -> Self {
        self.push(ColumnPart::Aggregate(func.into()))
    }

    pub fn percentile(self, func: &str, argument: &str) -> Self {
        self.push(ColumnPart::Percentile {
            function: func.into(),
            argument: argument.into(),
        })
    }

    pub fn window(self, kind: WindowKind) -> Self {
        self.push(ColumnPart::Window(kind))
    }

    pub fn moving_window(self, func: &str, rows: Option<u32>) -> Self {
        self.push(ColumnPart::MovingWindow {
            function: func.into(),
            rows,
        })
    }
}

impl From<Vec<ColumnPart>> for ColumnSpec {
    fn from(parts: Vec<ColumnPart>) -> Self {
        Self(parts)
    }
}

// =============================================================================
// Where parts
// =============================================================================

/// Macros recognised in the WHERE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhereMacro {
    /// `$__timeFilter(<timeColumn>)`
    TimeFilter,
}

impl WhereMacro {
    pub fn name(&self) -> &'static str {
        match self {
            WhereMacro::TimeFilter => "$__timeFilter",
        }
    }
}

impl std::str::FromStr for WhereMacro {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "$__timeFilter" => Ok(WhereMacro::TimeFilter),
            other => Err(DescriptorError::UnknownMacro(other.to_string())),
        }
    }
}

/// One condition of the WHERE clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPart", into = "RawPart")]
pub enum WhereClausePart {
    Macro(WhereMacro),
    /// Rendered as `left op right` with no quoting applied.
    Expression {
        left: String,
        op: String,
        right: String,
    },
}

impl WhereClausePart {
    pub fn time_filter() -> Self {
        WhereClausePart::Macro(WhereMacro::TimeFilter)
    }

    pub fn expression(left: &str, op: &str, right: &str) -> Self {
        WhereClausePart::Expression {
            left: left.into(),
            op: op.into(),
            right: right.into(),
        }
    }
}

impl TryFrom<RawPart> for WhereClausePart {
    type Error = DescriptorError;

    fn try_from(raw: RawPart) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "macro" => {
                let name = match &raw.name {
                    Some(name) => name.clone(),
                    None => raw.required(0)?,
                };
                Ok(WhereClausePart::Macro(name.parse()?))
            }
            "expression" => Ok(WhereClausePart::Expression {
                left: raw.required(0)?,
                op: raw.required(1)?,
                right: raw.required(2)?,
            }),
            other => Err(DescriptorError::UnknownKind {
                category: "where",
                kind: other.to_string(),
            }),
        }
    }
}

impl From<WhereClausePart> for RawPart {
    fn from(part: WhereClausePart) -> Self {
        match part {
            WhereClausePart::Macro(m) => RawPart {
                kind: "macro".to_string(),
                name: Some(m.name().to_string()),
                params: vec![],
            },
            WhereClausePart::Expression { left, op, right } => {
                RawPart::new("expression", vec![text(&left), text(&op), text(&right)])
            }
        }
    }
}

// =============================================================================
// Group parts
// =============================================================================

/// One element of the GROUP BY list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPart", into = "RawPart")]
pub enum GroupPart {
    /// Time bucketing. `fill` may hold the `"none"` sentinel.
    Time {
        interval: String,
        fill: Option<String>,
    },
    /// Informational only; grouping by metric follows `metricColumn`.
    Column(String),
}

impl GroupPart {
    pub fn time(interval: &str, fill: Option<&str>) -> Self {
        GroupPart::Time {
            interval: interval.into(),
            fill: fill.map(Into::into),
        }
    }

    /// The fill mode, with the `"none"` sentinel treated as absent.
    pub fn fill_mode(&self) -> Option<&str> {
        match self {
            GroupPart::Time { fill, .. } => super::descriptor::unless_sentinel(fill.as_deref()),
            GroupPart::Column(_) => None,
        }
    }
}

impl TryFrom<RawPart> for GroupPart {
    type Error = DescriptorError;

    fn try_from(raw: RawPart) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "time" => Ok(GroupPart::Time {
                interval: raw.required(0)?,
                fill: raw.param(1),
            }),
            "column" => Ok(GroupPart::Column(raw.required(0)?)),
            other => Err(DescriptorError::UnknownKind {
                category: "group",
                kind: other.to_string(),
            }),
        }
    }
}

impl From<GroupPart> for RawPart {
    fn from(part: GroupPart) -> Self {
        match part {
            GroupPart::Time { interval, fill } => {
                let mut params = vec![text(&interval)];
                if let Some(fill) = fill {
                    params.push(text(&fill));
                }
                RawPart::new("time", params)
            }
            GroupPart::Column(name) => RawPart::new("column", vec![text(&name)]),
        }
    }
}
