use std::path::PathBuf;

use thiserror::Error;

/// Error returned by a reader accessor.
///
/// Decode errors are scoped to the accessor that raised them: a bad field does
/// not poison the rest of the record, so callers can keep reading the fields
/// that still resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("read of {len} bytes at {position} exceeds buffer of {buffer_len} bytes")]
    OutOfBounds {
        position: usize,
        len: usize,
        buffer_len: usize,
    },
    #[error("unknown {enumeration} value {value}")]
    UnknownVariant {
        enumeration: &'static str,
        value: u8,
    },
    #[error("corrupt {what} at {position}")]
    Corrupt { what: &'static str, position: usize },
    #[error("string at {position} is not valid UTF-8")]
    InvalidUtf8 { position: usize },
    #[error("index {index} out of range for vector of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{record} violates its layout contract: {detail}")]
    ConstraintViolation {
        record: &'static str,
        detail: String,
    },
}

/// Builder misuse. Every variant is raised before any byte of a corrupt
/// object reaches the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("cannot build {requested} while a {open} is open")]
    NestedConstruction {
        requested: &'static str,
        open: &'static str,
    },
    #[error("no table is open")]
    NoOpenTable,
    #[error("field {field} written twice in the same table")]
    DuplicateField { field: u16 },
    #[error("field {field} exceeds declared field count {declared}")]
    FieldOutOfRange { field: u16, declared: u16 },
    #[error("offset {offset} does not refer to a finished object (buffer holds {used} bytes)")]
    DanglingOffset { offset: u32, used: usize },
    #[error("table inline size {size} exceeds the vtable limit")]
    TableTooLarge { size: usize },
    #[error("buffer would grow to {requested} bytes, limit is {limit}")]
    BufferTooLarge { requested: usize, limit: usize },
    #[error("builder already finished; call reset before building again")]
    AlreadyFinished,
    #[error("builder has no finished buffer")]
    NotFinished,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read builder options from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse builder options: {0}")]
    Parse(#[from] serde_json::Error),
}
