use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use isagen_core::SpecError;

#[derive(Debug)]
pub enum ErrorKind {
    SourceFile(io::Error),
    Parse { line: usize, error: SpecError },
    Group(SpecError),
}

/// Specification failure with the source it happened in.
///
/// The path of a grouping failure is the name of the decode tree.
#[derive(Debug)]
pub struct Error {
    path: PathBuf,
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new<S: Into<PathBuf>>(path: S, kind: ErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the specification error, if any.
    pub fn spec_error(&self) -> Option<&SpecError> {
        match &self.kind {
            ErrorKind::SourceFile(_) => None,
            ErrorKind::Parse { error, .. } | ErrorKind::Group(error) => Some(error),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        use ErrorKind as E;

        let path = self.path.display();
        match &self.kind {
            E::SourceFile(error) => {
                write!(fmt, "failed to read source file \"{path}\", {error}")
            }
            E::Parse { line, error } => {
                write!(fmt, "parsing failed at {path}:{line}: {error}")
            }
            E::Group(error) => {
                write!(fmt, "failed to build {path} decode tree, {error}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::SourceFile(error) => Some(error),
            ErrorKind::Parse { error, .. } | ErrorKind::Group(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = Error::new(
            "table_base.dat",
            ErrorKind::Parse {
                line: 12,
                error: SpecError::EmptyMnemonic,
            },
        );
        assert_eq!(
            err.to_string(),
            "parsing failed at table_base.dat:12: mnemonic cannot be empty"
        );
        assert_eq!(err.spec_error(), Some(&SpecError::EmptyMnemonic));

        let err = Error::new("vex", ErrorKind::Group(SpecError::Conflict(vec![])));
        assert!(err.to_string().starts_with("failed to build vex decode tree"));
    }
}
