//! Where pattern text comes from.
//!
//! A [`PatternSource`] resolves a name to pattern text. A failed fetch is
//! a [`LoadError`]; callers surface it and leave their state untouched.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use indexmap::IndexMap;

/// Errors fetching pattern text.
#[derive(Debug)]
pub enum LoadError {
    /// The source has no pattern by that name.
    NotFound {
        /// Requested name.
        name: String,
    },
    /// Reading the backing file failed.
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "pattern {name:?} not found"),
            Self::Io { path, source } => write!(f, "reading {}: {source}", path.display()),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::NotFound { .. } => None,
        }
    }
}

/// Resolves pattern names to text.
pub trait PatternSource {
    /// Fetch the pattern called `name`.
    fn fetch(&self, name: &str) -> Result<String, LoadError>;
}

/// Patterns read from files under a root directory.
#[derive(Clone, Debug)]
pub struct FsPatternSource {
    root: PathBuf,
}

impl FsPatternSource {
    /// A source resolving names relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PatternSource for FsPatternSource {
    fn fetch(&self, name: &str) -> Result<String, LoadError> {
        let path = self.root.join(name);
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LoadError::NotFound {
                    name: name.to_string(),
                }
            } else {
                LoadError::Io { path, source }
            }
        })
    }
}

/// An in-memory catalog of named patterns.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    patterns: IndexMap<String, String>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a pattern.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.patterns.insert(name.into(), text.into());
    }
}

impl PatternSource for Catalog {
    fn fetch(&self, name: &str) -> Result<String, LoadError> {
        self.patterns
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                name: name.to_string(),
            })
    }
}
