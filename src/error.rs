use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdfError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Truncated input: {field} needs {needed} bytes, {available} available")]
    TruncatedInput {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Invalid identification code: {0:?}")]
    InvalidIdentification(String),

    #[error("Cannot parse {field} from {value:?}")]
    NumericParseFailure {
        field: &'static str,
        value: String,
    },

    #[error("{field} has {actual} elements, expected {expected}")]
    ArrayLengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field} value {value:?} does not fit into {width} bytes")]
    FieldOverflow {
        field: &'static str,
        width: usize,
        value: String,
    },

    #[error("{0} trailing bytes after the last data record")]
    TrailingData(usize),

    #[error("Malformed annotation: {0}")]
    MalformedAnnotation(String),

    #[error("Digital min equals digital max in channel {channel}")]
    DigitalMinEqualsMax { channel: usize },

    #[error("Header declares {declared} bytes but {required} are required")]
    HeaderCapacity { declared: usize, required: usize },

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, EdfError>;
