// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for IGES reading

use crate::DeNumber;
use thiserror::Error;

/// Result type alias for reader operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while reading an IGES file
///
/// Structural errors (record layout, Global section delimiters, Directory
/// section shape) make the whole file unusable. Everything else is scoped to
/// a single entity and is recovered from by skipping that entity.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Record lengths could not be determined or are inconsistent
    #[error("Inconsistent record length: {0}")]
    RecordLength(String),

    /// A physical record is malformed (too short, unknown section code)
    #[error("Invalid record {record}: {message}")]
    InvalidRecord { record: usize, message: String },

    /// The Global section delimiter prefix is not understood
    #[error("Invalid Global section: {0}")]
    InvalidGlobal(String),

    /// The Directory section cannot be split into entries
    #[error("Invalid Directory section: {0}")]
    InvalidDirectory(String),

    /// Parameter pointer does not address the Parameter section
    #[error("Illegal parameter pointer {pointer} for {de}")]
    InvalidParameterPointer { de: DeNumber, pointer: u32 },

    /// Parameter data starts with a different type number than the DE
    #[error("Type mismatch for {de}: directory says {expected}, parameter data says {found}")]
    TypeMismatch { de: DeNumber, expected: u16, found: i64 },

    /// A required parameter is absent or has the wrong kind
    #[error("Missing or invalid parameter {index} on {de}")]
    MissingParameter { de: DeNumber, index: usize },

    /// Form number not handled for this entity type
    #[error("Unsupported form {form} for entity type {entity_type} at {de}")]
    UnsupportedForm { de: DeNumber, entity_type: u16, form: i32 },

    /// Failed to decode parameter data
    #[error("Failed to parse {0}: {1}")]
    EntityParse(DeNumber, String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ParseError {
    /// Create a new entity parse error
    pub fn entity_parse(de: DeNumber, msg: impl Into<String>) -> Self {
        ParseError::EntityParse(de, msg.into())
    }

    /// Create a new record error
    pub fn record(record: usize, msg: impl Into<String>) -> Self {
        ParseError::InvalidRecord {
            record,
            message: msg.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        ParseError::Other(msg.into())
    }

    /// Whether this error invalidates the whole file rather than one entity
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ParseError::RecordLength(_)
                | ParseError::InvalidRecord { .. }
                | ParseError::InvalidGlobal(_)
                | ParseError::InvalidDirectory(_)
                | ParseError::Io(_)
        )
    }
}
