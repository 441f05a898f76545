//! Time, metric, WHERE, GROUP BY and ORDER BY clause builders.

use crate::model::{GroupPart, WhereClausePart, WhereMacro};
use crate::sql::token::{Token, TokenStream};

use super::QueryCompiler;

impl QueryCompiler<'_> {
    /// Render the time column.
    ///
    /// Without a time group this is `<timeColumn> AS time`. With one it is
    /// the `$__timeGroupAlias(...)` macro, or `$__timeGroup(...)` when
    /// `alias` is false.
    pub fn build_time_column(&self, alias: bool) -> String {
        self.time_column_tokens(alias).serialize()
    }

    pub(super) fn time_column_tokens(&self, alias: bool) -> TokenStream {
        let mut ts = TokenStream::new();
        let time = Token::Ident(self.time_column().to_string());

        let time_group = self.descriptor.time_group();
        match time_group {
            Some(GroupPart::Time { interval, .. }) => {
                let name = if alias { "timeGroupAlias" } else { "timeGroup" };
                ts.push(Token::Macro(name))
                    .lparen()
                    .push(time)
                    .comma()
                    .raw(interval);
                if let Some(fill) = time_group.and_then(GroupPart::fill_mode) {
                    ts.comma().raw(fill);
                }
                ts.rparen();
            }
            _ => {
                ts.push(time)
                    .space()
                    .push(Token::As)
                    .space()
                    .push(Token::Ident("time".into()));
            }
        }

        tracing::trace!(alias, "time column");
        ts
    }

    /// Render the metric column, or the empty string when unset.
    pub fn build_metric_column(&self) -> String {
        self.metric_column_tokens()
            .map(|ts| ts.serialize())
            .unwrap_or_default()
    }

    pub(super) fn metric_column_tokens(&self) -> Option<TokenStream> {
        let metric = self.descriptor.metric_column()?;
        let mut ts = TokenStream::new();
        ts.push(Token::Ident(metric.to_string()))
            .space()
            .push(Token::As)
            .space()
            .push(Token::Ident("metric".into()));
        Some(ts)
    }

    /// Render the WHERE clause, including its leading newline.
    pub fn build_where_clause(&self) -> String {
        self.where_clause_tokens().serialize()
    }

    pub(super) fn where_clause_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        if self.descriptor.where_parts.is_empty() {
            return ts;
        }

        let conditions: Vec<TokenStream> = self
            .descriptor
            .where_parts
            .iter()
            .map(|part| self.condition_tokens(part))
            .collect();

        let mut separator = TokenStream::new();
        separator.space().push(Token::And).newline().indent(1);

        ts.newline()
            .push(Token::Where)
            .newline()
            .indent(1)
            .join(&conditions, &separator);
        tracing::trace!(conditions = conditions.len(), "where clause");
        ts
    }

    fn condition_tokens(&self, part: &WhereClausePart) -> TokenStream {
        let mut ts = TokenStream::new();
        match part {
            WhereClausePart::Macro(WhereMacro::TimeFilter) => {
                ts.push(Token::Macro("timeFilter"))
                    .lparen()
                    .push(Token::Ident(self.time_column().to_string()))
                    .rparen();
            }
            WhereClausePart::Expression { left, op, right } => {
                ts.raw(left).space().raw(op).space().raw(right);
            }
        }
        ts
    }

    /// Render the GROUP BY clause, or the empty string when there are no
    /// group parts. Grouping is always by ordinal position.
    pub fn build_group_clause(&self) -> String {
        self.group_clause_tokens().serialize()
    }

    pub(super) fn group_clause_tokens(&self) -> TokenStream {
        if self.descriptor.group.is_empty() {
            return TokenStream::new();
        }
        tracing::trace!(parts = self.descriptor.group.len(), "group clause");
        self.ordinal_clause(Token::GroupBy)
    }

    /// Render the trailing ORDER BY clause. Always present.
    pub fn build_order_clause(&self) -> String {
        self.order_clause_tokens().serialize()
    }

    pub(super) fn order_clause_tokens(&self) -> TokenStream {
        self.ordinal_clause(Token::OrderBy)
    }

    /// Output positions: 1 is the time column, 2 the metric column.
    fn ordinals(&self) -> Vec<i64> {
        if self.descriptor.has_metric_column() {
            vec![1, 2]
        } else {
            vec![1]
        }
    }

    fn ordinal_clause(&self, keyword: Token) -> TokenStream {
        let positions: Vec<TokenStream> = self
            .ordinals()
            .into_iter()
            .map(|n| {
                let mut ts = TokenStream::new();
                ts.push(Token::LitInt(n));
                ts
            })
            .collect();

        let mut separator = TokenStream::new();
        separator.comma();

        let mut ts = TokenStream::new();
        ts.newline()
            .push(keyword)
            .space()
            .join(&positions, &separator);
        ts
    }
}
