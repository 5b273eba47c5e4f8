//! Error enum
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    /// No archive matching the dataset format in the source folder.
    NoArchives(PathBuf),
    /// An entity file is missing: `found` (or the end of the dump) came where
    /// `expected` should follow `entry`.
    MissingEntry {
        archive: PathBuf,
        entry: String,
        expected: &'static str,
        found: Option<String>,
    },
    UnknownFormat(String),
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Serde(e) => write!(f, "serialization error: {}", e),
            Error::Glob(e) => write!(f, "glob error: {}", e),
            Error::GlobPattern(e) => write!(f, "glob pattern error: {}", e),
            Error::NoArchives(dir) => write!(f, "No archive files in the folder: {:?}", dir),
            Error::MissingEntry {
                archive,
                entry,
                expected,
                found,
            } => write!(
                f,
                "entry file missing: expected {} in {:?} after entry {}, found {}",
                expected,
                archive,
                entry,
                found.as_deref().unwrap_or("end of dump")
            ),
            Error::UnknownFormat(s) => write!(f, "No such dataset format: {}", s),
            Error::Custom(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}
