//! Pipeline inputs: standard input, files and glob patterns.

use crate::io::compression::auto_detect_reader;
use crate::io::glob::expand_glob_required;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Argument that selects standard input.
pub const STDIN_SENTINEL: &str = "-";

/// Something the pipeline can open and parse.
pub trait Input {
    /// Name used in log events and error context.
    fn name(&self) -> Cow<'_, str>;

    /// Open a fresh reader positioned at the start of the input.
    ///
    /// # Errors
    /// Returns an error if the input cannot be opened.
    fn open(&self) -> Result<Box<dyn Read + '_>>;
}

/// An input named on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Stdin,
    Path(PathBuf),
}

impl Source {
    /// Interpret one argument: [`STDIN_SENTINEL`] or a path.
    #[must_use]
    pub fn parse(arg: &str) -> Self {
        if arg == STDIN_SENTINEL {
            Self::Stdin
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }

    /// Turn command-line arguments into sources.
    ///
    /// No arguments means standard input. Arguments with glob metacharacters
    /// that do not name an existing file are expanded, sorted, and must match
    /// at least one file.
    ///
    /// # Errors
    /// Returns an error for an invalid pattern or a pattern with no matches.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Vec<Self>> {
        if args.is_empty() {
            return Ok(vec![Self::Stdin]);
        }
        let mut sources = Vec::with_capacity(args.len());
        for arg in args {
            let arg = arg.as_ref();
            if is_pattern(arg) && !Path::new(arg).exists() {
                sources.extend(expand_glob_required(arg)?.into_iter().map(Self::Path));
            } else {
                sources.push(Self::parse(arg));
            }
        }
        Ok(sources)
    }
}

fn is_pattern(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

impl Input for Source {
    fn name(&self) -> Cow<'_, str> {
        match self {
            Self::Stdin => Cow::Borrowed("<stdin>"),
            Self::Path(p) => p.to_string_lossy(),
        }
    }

    fn open(&self) -> Result<Box<dyn Read + '_>> {
        match self {
            Self::Stdin => auto_detect_reader(io::stdin(), STDIN_SENTINEL)
                .context("setup decompression for stdin"),
            Self::Path(path) => {
                let f = File::open(path)?;
                auto_detect_reader(f, path)
                    .with_context(|| format!("setup decompression for {}", path.display()))
            }
        }
    }
}
