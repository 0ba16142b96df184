//! Two-stage payload parsing.
//!
//! The payload on stdin is read as JSON first and as literal notation second.
//! When neither parses, the result is [`ParseResult::Empty`] instead of an
//! error: an unreadable listing selects nothing.
//!
//! The JSON stage also accepts the non-finite constants `NaN`, `Infinity` and
//! `-Infinity`, which strict JSON parsers reject.

use serde_json::Value;
use tracing::debug;

use crate::literal::{self, Literal};

/// One element of the parsed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    /// A string element, the only kind that can name a backup.
    Text(String),
    /// Any other element (number, bool, null, bytes, nested container).
    Other,
}

impl PayloadItem {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Other => None,
        }
    }
}

/// Which notation the payload was read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    Json,
    Literal,
}

impl Notation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Literal => "literal",
        }
    }
}

/// Outcome of [`parse_payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    Success {
        items: Vec<PayloadItem>,
        notation: Notation,
    },
    Empty,
}

impl ParseResult {
    pub fn items(&self) -> &[PayloadItem] {
        match self {
            Self::Success { items, .. } => items,
            Self::Empty => &[],
        }
    }

    pub fn into_items(self) -> Vec<PayloadItem> {
        match self {
            Self::Success { items, .. } => items,
            Self::Empty => Vec::new(),
        }
    }

    pub fn notation(&self) -> Option<Notation> {
        match self {
            Self::Success { notation, .. } => Some(*notation),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

/// Parses a payload as JSON, falling back to literal notation.
///
/// Sequences yield their elements and mappings yield their keys, both in
/// source order. A top-level string or scalar is not a listing and yields
/// [`ParseResult::Empty`].
pub fn parse_payload(raw: &str) -> ParseResult {
    match parse_json(raw) {
        Ok(value) => return from_json(value),
        Err(e) => debug!(error = %e, "Payload is not JSON, trying literal notation"),
    }

    match literal::parse(raw) {
        Ok(value) => from_literal(value),
        Err(e) => {
            debug!(error = %e, "Payload is not literal notation either, treating as empty");
            ParseResult::Empty
        }
    }
}

/// Non-finite float constants and their replacement. Longest first, so
/// `-Infinity` is not read as `-` followed by `Infinity`.
const NON_FINITE: [&str; 3] = ["-Infinity", "Infinity", "NaN"];
const NON_FINITE_REPLACEMENT: &str = "null";

fn parse_json(raw: &str) -> serde_json::Result<Value> {
    serde_json::from_str(raw).or_else(|err| match replace_non_finite(raw) {
        Some(patched) => serde_json::from_str(&patched),
        None => Err(err),
    })
}

/// Rewrites non-finite constants outside string literals to `null`.
///
/// Returns `None` when there was nothing to rewrite. Each element only needs
/// to stay a non-text item, so the float value itself is not kept.
fn replace_non_finite(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut replaced = false;
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = raw;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE.iter().find(|t| rest.starts_with(**t)) {
            out.push_str(NON_FINITE_REPLACEMENT);
            rest = &rest[token.len()..];
            replaced = true;
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    replaced.then_some(out)
}

fn from_json(value: Value) -> ParseResult {
    let items = match value {
        Value::Array(elements) => elements
            .into_iter()
            .map(|element| match element {
                Value::String(s) => PayloadItem::Text(s),
                _ => PayloadItem::Other,
            })
            .collect(),
        Value::Object(map) => map.into_iter().map(|(key, _)| PayloadItem::Text(key)).collect(),
        other => {
            debug!(kind = json_kind(&other), "JSON payload is not a list");
            return ParseResult::Empty;
        }
    };

    ParseResult::Success {
        items,
        notation: Notation::Json,
    }
}

fn from_literal(value: Literal) -> ParseResult {
    let items = match value {
        Literal::List(elements) | Literal::Tuple(elements) | Literal::Set(elements) => {
            elements.into_iter().map(literal_item).collect()
        }
        Literal::Dict(entries) => entries.into_iter().map(|(key, _)| literal_item(key)).collect(),
        other => {
            debug!(kind = other.kind(), "Literal payload is not a list");
            return ParseResult::Empty;
        }
    };

    ParseResult::Success {
        items,
        notation: Notation::Literal,
    }
}

fn literal_item(value: Literal) -> PayloadItem {
    match value {
        Literal::Str(s) => PayloadItem::Text(s),
        _ => PayloadItem::Other,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
