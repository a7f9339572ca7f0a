// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IGES Model - Shared types for reading IGES files and writing solid-modeling databases
//!
//! This crate holds the data shared by the reader (`iges-parser`) and the
//! converter (`iges-convert`):
//!
//! - [`DeNumber`], [`EntityType`], [`Parameter`] and [`ParameterRecord`] - raw file data
//! - [`DirectoryEntry`] / [`DirectoryTable`] - the Directory section plus conversion annotations
//! - [`Transform`] - shared identity or owned placement matrix
//! - [`entities`] - typed parameter layouts for the supported entity types
//! - [`ParameterSource`] - lazy parameter lookup implemented by the reader
//! - [`database`] - the output object model and the [`GeometryWriter`] sink
//!
//! # Example
//!
//! ```ignore
//! use iges_model::{DeNumber, EntityType, ParameterSource};
//!
//! let entry = table.get(DeNumber(1)).unwrap();
//! if entry.entity_type == EntityType::Torus {
//!     let decoded = source.decode(DeNumber(1), entry)?;
//!     println!("{:?}", decoded.entity);
//! }
//! ```

pub mod database;
pub mod directory;
pub mod entities;
pub mod error;
pub mod resolver;
pub mod transform;
pub mod types;

// Re-export all public types
pub use database::*;
pub use directory::*;
pub use entities::*;
pub use error::*;
pub use resolver::*;
pub use transform::*;
pub use types::*;
