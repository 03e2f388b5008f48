use std::{fmt::Display, io, path::PathBuf, rc::Rc};

use thiserror::Error;

/// A diagnostic anchored at a position in a journal file.
#[derive(Error, Debug, Eq, PartialEq, Clone)]
#[error("{file}:{row}:{col}: {msg}")]
pub struct SyntaxError {
    pub file: Rc<str>,
    pub row: usize,
    pub col: usize,
    pub msg: String,
}

impl SyntaxError {
    pub fn new(file: Rc<str>, row: usize, col: usize, msg: impl Into<String>) -> SyntaxError {
        SyntaxError {
            file,
            row,
            col,
            msg: msg.into(),
        }
    }
}

/// Everything that went wrong while loading a journal, in encounter order.
#[derive(Debug, Default, Eq, PartialEq, Clone)]
pub struct ParseErrors(pub Vec<SyntaxError>);

impl ParseErrors {
    pub fn push(&mut self, e: SyntaxError) {
        self.0.push(e)
    }

    pub fn extend(&mut self, other: ParseErrors) {
        self.0.extend(other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyntaxError> {
        self.0.iter()
    }
}

impl Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for e in &self.0 {
            write!(f, "{e}\r\n")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("error reading file {}: {1}", .0.to_string_lossy())]
    Io(PathBuf, #[source] io::Error),
    #[error("include cycle detected: {}", .0.to_string_lossy())]
    Cycle(PathBuf),
}
