// Licensed under the Apache-2.0 license

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use crate::error::{HalError, HalResult, ParseError, ParseErrorKind};
use crate::types::Forest;
use crate::util::{hex_const, natural_cmp, strip_comment};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Pattern {
    Exact(String),
    /// Written `PREFIX*`.
    Prefix(String),
}

impl Pattern {
    fn matches(&self, symbol: &str) -> bool {
        match self {
            Pattern::Exact(name) => name == symbol,
            Pattern::Prefix(prefix) => symbol.starts_with(prefix.as_str()),
        }
    }
}

/// Symbols exported to the scripting bindings.
///
/// One symbol or `PREFIX*` pattern per line, in strictly increasing
/// natural order, with `#` comments and blank lines allowed.
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    patterns: Vec<Pattern>,
}

impl AllowList {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut patterns = Vec::new();
        let mut previous: Option<String> = None;
        for (i, raw) in text.lines().enumerate() {
            let fail = |kind| ParseError::new(i + 1, raw, kind);
            let line = strip_comment(raw);
            let mut tokens = line.split_whitespace();
            let Some(token) = tokens.next() else {
                continue;
            };
            if let Some(extra) = tokens.next() {
                return Err(fail(ParseErrorKind::MalformedArgument {
                    directive: "allow-list".to_string(),
                    arg: extra.to_string(),
                }));
            }
            if let Some(prev) = previous.as_deref() {
                match natural_cmp(token, prev) {
                    Ordering::Equal => {
                        return Err(fail(ParseErrorKind::DuplicateName(token.to_string())))
                    }
                    Ordering::Less => {
                        return Err(fail(ParseErrorKind::OutOfOrder {
                            previous: prev.to_string(),
                            name: token.to_string(),
                        }))
                    }
                    Ordering::Greater => {}
                }
            }
            patterns.push(match token.strip_suffix('*') {
                Some(prefix) => Pattern::Prefix(prefix.to_string()),
                None => Pattern::Exact(token.to_string()),
            });
            previous = Some(token.to_string());
        }
        Ok(Self { patterns })
    }

    pub fn from_file(path: &Path) -> HalResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| HalError::io(path, e))?;
        Self::parse(&text).map_err(|error| HalError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    pub fn allows(&self, symbol: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(symbol))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns that select nothing in `forest`, as written.
    pub fn unmatched(&self, forest: &Forest) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|p| !forest.entries().iter().any(|e| p.matches(&e.symbol)))
            .map(|p| match p {
                Pattern::Exact(name) => name.clone(),
                Pattern::Prefix(prefix) => format!("{prefix}*"),
            })
            .collect()
    }
}

/// Python module mapping short symbol names to packed ids.
pub struct Bindings<'a> {
    forest: &'a Forest,
    allow: &'a AllowList,
    symbol_prefix: &'a str,
}

impl<'a> Bindings<'a> {
    pub const FILE_NAME: &'static str = "lwhal_bindings.py";

    pub fn new(forest: &'a Forest, allow: &'a AllowList, symbol_prefix: &'a str) -> Self {
        Self {
            forest,
            allow,
            symbol_prefix,
        }
    }
}

impl fmt::Display for Bindings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Generated by hal-gen. Do not edit.")?;
        writeln!(f)?;
        writeln!(f, "LWHAL_IDS = {{")?;
        for entry in self.forest.entries() {
            if !self.allow.allows(&entry.symbol) {
                continue;
            }
            let short = entry
                .symbol
                .strip_prefix(self.symbol_prefix)
                .unwrap_or(&entry.symbol);
            writeln!(f, "    \"{short}\": {},", hex_const(entry.packed_id.into()))?;
        }
        writeln!(f, "}}")
    }
}
