//! Error types for grid token encoding/decoding and catalog access.

use thiserror::Error;

/// Error categories of the grid token format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Malformed token (percent-encoding, field count, run lengths)
    Format,
    /// E002: A stream does not cover exactly `width * height` cells
    LengthMismatch,
    /// E003: The technology catalog could not be fetched
    CatalogFetch,
    /// E004: A module referenced by the token is missing from the catalog
    Lookup,
    /// E005: A grid key cannot be written into a symbol table
    Encode,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::Format => "E001",
            ErrorCode::LengthMismatch => "E002",
            ErrorCode::CatalogFetch => "E003",
            ErrorCode::Lookup => "E004",
            ErrorCode::Encode => "E005",
        }
    }
}

/// Error while parsing a token into its structural state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === E001: Format ===
    #[error("[E001] token length {len} exceeds maximum {max}")]
    TokenTooLong { len: usize, max: usize },

    #[error("[E001] malformed percent escape at byte {position}")]
    InvalidPercentEncoding { position: usize },

    #[error("[E001] percent-decoded token is not valid UTF-8")]
    InvalidUtf8,

    #[error("[E001] expected 6 fields, found {found}")]
    FieldCount { found: usize },

    #[error("[E001] run length without a symbol in {field} at char {position}")]
    DanglingRunLength { field: &'static str, position: usize },

    #[error("[E001] run length overflow in {field}")]
    RunLengthOverflow { field: &'static str },

    // === E002: Length mismatch ===
    #[error("[E002] {field} covers {actual} cells, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::LengthMismatch { .. } => ErrorCode::LengthMismatch,
            _ => ErrorCode::Format,
        }
    }
}

/// Error while encoding a grid into a token.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("[E005] {space} key {key:?} is empty or contains a wire delimiter")]
    InvalidKey { space: &'static str, key: String },

    #[error("[E005] {space} symbol codes exhausted")]
    CodesExhausted { space: &'static str },
}

impl EncodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::Encode
    }
}

/// Error while retrieving a technology catalog.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("[E003] request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("[E003] {url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("[E003] tech tree is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("[E003] no tech tree available for ship type {ship_type:?}")]
    Unavailable { ship_type: String },
}

impl CatalogError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::CatalogFetch
    }
}

/// Error from a full decode: structural parse plus catalog hydration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl GridError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            GridError::Decode(e) => e.code(),
            GridError::Catalog(e) => e.code(),
        }
    }
}

/// Error while loading configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid config: {0}")]
    Parse(String),
}
