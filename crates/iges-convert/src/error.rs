// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for conversion

use iges_model::{DbError, DeNumber, EntityType, ParseError};
use thiserror::Error;

/// Conversion result type
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Per-entity conversion errors
///
/// None of these abort a conversion; the failing entity is skipped and the
/// error is recorded in the report.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Parameter data could not be read
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The output database rejected an object
    #[error(transparent)]
    Database(#[from] DbError),

    /// Parameters read but geometrically invalid
    #[error("Invalid parameters for {de}: {message}")]
    InvalidParameters { de: DeNumber, message: String },

    /// A pointer that does not resolve
    #[error("Bad reference from {de}: {message}")]
    Reference { de: DeNumber, message: String },

    /// Curve evaluation failed
    #[error("Cannot evaluate curve {de}: {message}")]
    Curve { de: DeNumber, message: String },

    /// An entity of the wrong type where a curve is required
    #[error("{de} is a {}, not a curve", entity_type.name())]
    NotACurve { de: DeNumber, entity_type: EntityType },

    /// No converter for the entity type
    #[error("No converter for {de} ({})", entity_type.name())]
    Unsupported { de: DeNumber, entity_type: EntityType },

    /// Geometry construction error
    #[error("Geometry error: {0}")]
    Geometry(String),
}

impl ConvertError {
    /// Create an invalid parameters error
    pub fn invalid(de: DeNumber, msg: impl Into<String>) -> Self {
        ConvertError::InvalidParameters {
            de,
            message: msg.into(),
        }
    }

    /// Create a reference error
    pub fn reference(de: DeNumber, msg: impl Into<String>) -> Self {
        ConvertError::Reference {
            de,
            message: msg.into(),
        }
    }

    /// Create a curve error
    pub fn curve(de: DeNumber, msg: impl Into<String>) -> Self {
        ConvertError::Curve {
            de,
            message: msg.into(),
        }
    }

    /// Create a geometry error
    pub fn geometry(msg: impl Into<String>) -> Self {
        ConvertError::Geometry(msg.into())
    }
}
