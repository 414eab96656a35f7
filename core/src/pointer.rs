//! # JSON Pointer
//!
//! RFC 6901 pointers over `serde_json::Value`. Tokens are stored unescaped;
//! the `Display` form is the canonical escaped pointer, which is what the
//! bundle registry keys on.

use crate::error::{json_type_name, PointerError};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// A parsed JSON Pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// The pointer to the document root (`""`).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a pointer such as `/paths/~1foo/post`.
    ///
    /// `~1` decodes to `/` and `~0` to `~`; any other `~` sequence is rejected.
    pub fn parse(pointer: &str) -> Result<Self, PointerError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(PointerError::MissingLeadingSlash(pointer.to_string()));
        };
        let tokens = rest
            .split('/')
            .map(unescape_token)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    /// Unescaped reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether this is the root pointer.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The last token that is not an empty string.
    pub fn last_named_token(&self) -> Option<&str> {
        self.tokens
            .iter()
            .rev()
            .map(String::as_str)
            .find(|token| !token.is_empty())
    }

    /// Appends an unescaped token.
    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    /// Removes the last token.
    pub fn pop(&mut self) -> Option<String> {
        self.tokens.pop()
    }

    /// Returns a new pointer with `token` appended.
    pub fn join(&self, token: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(token);
        next
    }

    /// Walks `document` along this pointer.
    pub fn evaluate<'a>(&self, document: &'a Value) -> Result<&'a Value, PointerError> {
        self.tokens
            .iter()
            .try_fold(document, |target, token| step(target, token))
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape_token(token))?;
        }
        Ok(())
    }
}

/// Escapes a single token (`~` → `~0`, then `/` → `~1`).
pub fn escape_token(token: &str) -> Cow<'_, str> {
    if token.contains(['~', '/']) {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Decodes a single token.
///
/// A single left-to-right pass is equivalent to replacing `~1` before `~0`,
/// so `~01` decodes to `~1`, never to `/`.
pub fn unescape_token(token: &str) -> Result<String, PointerError> {
    if !token.contains('~') {
        return Ok(token.to_string());
    }
    let mut decoded = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => decoded.push('~'),
            Some('1') => decoded.push('/'),
            _ => return Err(PointerError::InvalidEscape(token.to_string())),
        }
    }
    Ok(decoded)
}

fn step<'a>(target: &'a Value, token: &str) -> Result<&'a Value, PointerError> {
    match target {
        Value::Object(map) => map
            .get(token)
            .ok_or_else(|| PointerError::MissingKey(token.to_string())),
        Value::Array(items) => {
            let index = parse_index(token)?;
            items.get(index).ok_or(PointerError::IndexOutOfRange {
                index,
                len: items.len(),
            })
        }
        other => Err(PointerError::NotAContainer {
            token: token.to_string(),
            found: json_type_name(other),
        }),
    }
}

fn parse_index(token: &str) -> Result<usize, PointerError> {
    let canonical = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    if !canonical {
        return Err(PointerError::InvalidIndex(token.to_string()));
    }
    token
        .parse()
        .map_err(|_| PointerError::InvalidIndex(token.to_string()))
}
