//! Parser for `or(<field>.<op>."<pattern>",...)` filter clauses.
//!
//! Inside a quoted pattern a doubled quote stands for one literal quote;
//! a single quote closes the pattern.

use crate::search::pattern::PATTERN_QUOTE;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One `<field>.<op>."<pattern>"` condition with the pattern unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
    pub field: String,
    pub operator: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseError {
    /// Clause is not wrapped in `or(...)`.
    MissingGroup,
    ExpectedIdentifier { at: String },
    ExpectedSeparator { at: String },
    ExpectedQuote { at: String },
    UnterminatedPattern,
    TrailingInput(String),
}

impl Display for ClauseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingGroup => write!(f, "filter clause must be wrapped in `or(...)`"),
            Self::ExpectedIdentifier { at } => write!(f, "expected identifier at `{at}`"),
            Self::ExpectedSeparator { at } => write!(f, "expected `.` at `{at}`"),
            Self::ExpectedQuote { at } => write!(f, "expected quoted pattern at `{at}`"),
            Self::UnterminatedPattern => write!(f, "unterminated quoted pattern"),
            Self::TrailingInput(rest) => write!(f, "unexpected input after condition: `{rest}`"),
        }
    }
}

impl Error for ClauseError {}

/// Parses an OR group into its conditions.
pub fn parse_or_clause(clause: &str) -> Result<Vec<FilterCondition>, ClauseError> {
    let body = clause
        .strip_prefix("or(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or(ClauseError::MissingGroup)?;

    let mut conditions = Vec::new();
    let mut rest = body;
    loop {
        let (condition, remaining) = parse_condition(rest)?;
        conditions.push(condition);
        if remaining.is_empty() {
            return Ok(conditions);
        }
        rest = remaining
            .strip_prefix(',')
            .ok_or_else(|| ClauseError::TrailingInput(remaining.to_string()))?;
    }
}

fn parse_condition(input: &str) -> Result<(FilterCondition, &str), ClauseError> {
    let (field, rest) = take_identifier(input)?;
    let rest = take_separator(rest)?;
    let (operator, rest) = take_identifier(rest)?;
    let rest = take_separator(rest)?;
    let (pattern, rest) = take_quoted(rest)?;
    Ok((
        FilterCondition {
            field: field.to_string(),
            operator: operator.to_string(),
            pattern,
        },
        rest,
    ))
}

fn take_identifier(input: &str) -> Result<(&str, &str), ClauseError> {
    let end = input
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .unwrap_or(input.len());
    if end == 0 {
        return Err(ClauseError::ExpectedIdentifier {
            at: input.to_string(),
        });
    }
    Ok(input.split_at(end))
}

fn take_separator(input: &str) -> Result<&str, ClauseError> {
    input
        .strip_prefix('.')
        .ok_or_else(|| ClauseError::ExpectedSeparator {
            at: input.to_string(),
        })
}

fn take_quoted(input: &str) -> Result<(String, &str), ClauseError> {
    let inner = input
        .strip_prefix(PATTERN_QUOTE)
        .ok_or_else(|| ClauseError::ExpectedQuote {
            at: input.to_string(),
        })?;

    let mut value = String::new();
    let mut chars = inner.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        if ch != PATTERN_QUOTE {
            value.push(ch);
            continue;
        }
        if matches!(chars.peek(), Some((_, next)) if *next == PATTERN_QUOTE) {
            chars.next();
            value.push(PATTERN_QUOTE);
            continue;
        }
        return Ok((value, &inner[index + ch.len_utf8()..]));
    }

    Err(ClauseError::UnterminatedPattern)
}
