use crate::object::ObjectId;
use thiserror::Error;

/// All errors that the crate can generate
#[derive(Error, Debug)]
pub enum PDFError {
    #[error(transparent)]
    /// An I/O error occurred on the output sink
    Io(#[from] std::io::Error),

    #[error(transparent)]
    /// An option, filter combination or feature request was rejected
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    /// A font, image or colour profile could not be used
    Resource(#[from] ResourceError),

    #[error(transparent)]
    /// The object writer was driven into an inconsistent state
    Serialization(#[from] SerializationError),
}

/// Invalid configuration, always reported before any output is produced for the
/// affected operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },

    #[error("unsupported filter '{0}'")]
    UnsupportedFilter(String),

    #[error("encryption must be applied after compression")]
    EncryptionBeforeCompression,

    #[error("encryption requested without a document key")]
    MissingEncryptionKey,

    #[error("{feature} requires PDF version 1.{required}, document is 1.{configured}")]
    VersionTooLow {
        feature: &'static str,
        required: u8,
        configured: u8,
    },

    #[error("the default text encoding has already been resolved to '{0}'")]
    TextEncodingResolved(String),

    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    #[error("page #{0} is not part of the document")]
    UnknownPage(usize),

    #[error("malformed font spec '{spec}': {reason}")]
    FontSpec { spec: String, reason: &'static str },
}

/// A shared resource could not be loaded or used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("font not found: {0}")]
    NotFound(String),

    #[error("malformed font '{name}': {reason}")]
    MalformedFont { name: String, reason: String },

    #[error("font '{0}' requires a synthesized style, which is disabled")]
    SynthesisDisabled(String),

    #[error("font '{0}' is required by page content but could not be resolved")]
    Required(String),

    #[error("cannot load image: {0}")]
    Image(String),

    #[error("cannot load colour profile: {0}")]
    Profile(String),
}

/// The object writer was used out of order; always fatal to the current document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("object {0} committed twice")]
    DoubleCommit(ObjectId),

    #[error("object {0} was never allocated")]
    Unallocated(ObjectId),

    #[error("object {0} was allocated but never committed")]
    Uncommitted(ObjectId),

    #[error("object {0} has been freed")]
    Freed(ObjectId),

    #[error("the document has already been finalized")]
    Finalized,

    #[error(transparent)]
    Filter(#[from] crate::filter::FilterError),
}
