// Licensed under the Apache-2.0 license

use std::path::PathBuf;
use thiserror::Error;

/// What went wrong on a DSL or allow-list line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("tab characters are not allowed")]
    TabCharacter,
    #[error("indentation does not match any enclosing level")]
    BadIndent,
    #[error("nesting deeper than address/field/value")]
    TooDeep,
    #[error("duplicate name `{0}`")]
    DuplicateName(String),
    #[error("`{name}` must sort after `{previous}`")]
    OutOfOrder { previous: String, name: String },
    #[error("address name must start with `{0}`")]
    MissingSourcePrefix(String),
    #[error("invalid directive `{0}` at this level")]
    InvalidDirective(String),
    #[error("directive `{0}` expects an argument")]
    MissingArgument(String),
    #[error("malformed argument `{arg}` to `{directive}`")]
    MalformedArgument { directive: String, arg: String },
    #[error("`{0}` is already set")]
    AlreadySet(&'static str),
    #[error("entry already denotes a virtual register")]
    AlreadyVirtual,
    #[error("virtual mirror `{name}` must start with `{prefix}`")]
    BadVirtualPrefix { name: String, prefix: String },
    #[error("capability `{name}` must start with `{prefix}`")]
    BadCapPrefix { name: String, prefix: String },
    #[error("array limit must be a positive integer, got `{0}`")]
    BadArrayLimit(String),
    #[error("`{0}` does not occur in any candidate name")]
    UnresolvedSubstitution(String),
    #[error("public symbol `{0}` is defined twice")]
    DuplicateSymbol(String),
    #[error("more than {max} {kind} entries under one parent")]
    SequenceOverflow { kind: &'static str, max: u32 },
}

/// A fatal input error, located on a 1-based source line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}\n    {text}")]
pub struct ParseError {
    pub line: usize,
    pub text: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, text: &str, kind: ParseErrorKind) -> Self {
        Self {
            line,
            text: text.to_string(),
            kind,
        }
    }
}

/// Errors that can occur while compiling register definitions.
#[derive(Error, Debug)]
pub enum HalError {
    #[error("{}: {error}", .path.display())]
    Parse { path: PathBuf, error: ParseError },
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("macro indirection cycle: {}", .0.join(" -> "))]
    MacroCycle(Vec<String>),
    #[error("drivers root {} does not exist", .0.display())]
    MissingDriversRoot(PathBuf),
    #[error("unrecognized output artifact `{0}`")]
    UnknownArtifact(String),
    #[error("device `{0}` is not listed in the devices manifest")]
    UnknownDevice(String),
    #[error("id layout needs {0} bits, more than 32")]
    IdLayoutTooWide(u32),
}

impl HalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HalError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for compiler operations
pub type HalResult<T> = std::result::Result<T, HalError>;
