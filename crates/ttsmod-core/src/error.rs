use std::io;
use std::path::PathBuf;

/// Everything that can abort a decode or encode pass.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("walking {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} does not hold a JSON object")]
    NotAnObject { path: PathBuf },

    /// `origin` is a file path on decode, a parent GUID (or `<root>`) on import.
    #[error("object at {origin} doesn't have a GUID field")]
    MissingGuid { origin: String },

    #[error("object at {origin} doesn't have a string GUID")]
    GuidNotString { origin: String },

    #[error("ContainedObjects of {guid} is not an array")]
    ContainedObjectsNotArray { guid: String },

    #[error("ContainedObjects[{index}] of {guid} is not an object")]
    ContainedObjectNotObject { guid: String, index: usize },

    #[error("folder {folder} matches no known GUID (looking from {path})")]
    UnknownParent { folder: String, path: PathBuf },

    #[error("could not identify parent folder of {path}")]
    MissingParentFolder { path: PathBuf },

    #[error("duplicate GUID {guid}: {first} and {second}")]
    DuplicateGuid {
        guid: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Same GUID twice in a save being imported; `first`/`second` are
    /// positions like `ObjectStates/0` or `<parent GUID>/<index>`.
    #[error("duplicate GUID {guid} at {first} and {second}")]
    DuplicateImportedGuid {
        guid: String,
        first: String,
        second: String,
    },

    /// GUIDs name folders, so they must be a single plain path component.
    #[error("object at {origin} has GUID {guid:?} that can't be used as a folder name")]
    InvalidGuid { guid: String, origin: String },

    #[error("script {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("unbundle: {0}")]
    Bundle(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}
