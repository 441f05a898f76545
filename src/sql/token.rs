//! SQL Tokens - the atomic units of SQL output.
//!
//! Column names, aliases and function names coming from the descriptor are
//! emitted verbatim: quoting is the caller's responsibility, and the editor
//! often hands over already-quoted text such as `"time"`.

/// SQL Token - every element the compiler emits.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Pragmas ===
    /// `#standardSQL` - selects the standard dialect on the engine.
    StandardSql,

    // === Keywords ===
    Select,
    From,
    Where,
    And,
    As,
    /// Lower-case `as`, used for the `tmpv` helper columns.
    AsLower,
    GroupBy,
    OrderBy,
    Case,
    When,
    Then,
    Else,
    End,
    IsNull,
    Null,
    WithinGroup,

    // === Window Function Keywords ===
    Over,
    PartitionBy,
    Rows,
    Preceding,

    // === Punctuation ===
    Comma,
    Dot,
    LParen,
    RParen,

    // === Operators ===
    Gte,
    Minus,
    Div,

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),

    // === Dynamic Content ===
    /// Column, table or alias name, passed through unchanged.
    Ident(String),
    /// Function name, passed through unchanged (case preserved).
    FunctionName(String),
    /// Engine-side macro, rendered as `$__<name>`.
    Macro(&'static str),
    /// Ordinal column position.
    LitInt(i64),

    // === Escape Hatch ===
    /// Raw SQL passed directly to output.
    ///
    /// Used for already-rendered sub-expressions and for editor-supplied
    /// condition text, which is never escaped by the compiler.
    Raw(String),
}

impl Token {
    /// Serialize this token to a string.
    pub fn serialize(&self) -> String {
        match self {
            Token::StandardSql => "#standardSQL".into(),

            // Keywords
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::As => "AS".into(),
            Token::AsLower => "as".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Case => "CASE".into(),
            Token::When => "WHEN".into(),
            Token::Then => "THEN".into(),
            Token::Else => "ELSE".into(),
            Token::End => "END".into(),
            Token::IsNull => "IS NULL".into(),
            Token::Null => "NULL".into(),
            Token::WithinGroup => "WITHIN GROUP".into(),

            // Window function keywords
            Token::Over => "OVER".into(),
            Token::PartitionBy => "PARTITION BY".into(),
            Token::Rows => "ROWS".into(),
            Token::Preceding => "PRECEDING".into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            // Operators
            Token::Gte => ">=".into(),
            Token::Minus => "-".into(),
            Token::Div => "/".into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => "  ".repeat(*n),

            // Dynamic
            Token::Ident(name) => name.clone(),
            Token::FunctionName(name) => name.clone(),
            Token::Macro(name) => format!("$__{}", name),
            Token::LitInt(n) => n.to_string(),

            // Escape hatch
            Token::Raw(s) => s.clone(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Append `items`, separated by a copy of `separator`.
    pub fn join(&mut self, items: &[TokenStream], separator: &TokenStream) -> &mut Self {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.append(separator);
            }
            self.append(item);
        }
        self
    }

    /// Serialize all tokens to a SQL string.
    pub fn serialize(&self) -> String {
        self.tokens.iter().map(Token::serialize).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
    pub fn raw(&mut self, sql: &str) -> &mut Self {
        self.push(Token::Raw(sql.to_string()))
    }
}

impl std::fmt::Display for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for token in &self.tokens {
            f.write_str(&token.serialize())?;
        }
        Ok(())
    }
}
