// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IGES Parser - Fixed-column IGES reader
//!
//! This crate reads IGES 5.x files into the shared types of `iges-model`.
//!
//! # Features
//!
//! - **Record splitting** for newline-terminated and bare 80-column files,
//!   scanned with `memchr`
//! - **Free-format tokenization** of Global and Parameter data using `nom`
//!   combinators, including Hollerith strings that span records
//! - **Lazy entity decoding** - parameters are tokenized on first request
//! - **Arc-based caching** of decoded parameter records
//! - **Placement evaluation** of nested transformation matrices
//!
//! # Example
//!
//! ```ignore
//! use iges_parser::IgesFile;
//!
//! let file = IgesFile::parse(&content)?;
//! println!("{} entities, {} mm per unit", file.entity_count(), file.unit_factor());
//! for (index, entry) in file.directory().iter() {
//!     println!("{} {}", entry.display_name(), entry.entity_type);
//! }
//! ```

mod builder;
mod decoder;
mod directory;
mod global;
mod matrix;
mod model;
mod names;
mod records;
mod tokenizer;
mod units;

pub use builder::{EntitySpec, IgesBuilder};
pub use decoder::ParameterDecoder;
pub use directory::load_directory;
pub use global::parse_global;
pub use matrix::{evaluate_transforms, MAX_MATRIX_DEPTH};
pub use model::IgesFile;
pub use names::{assign_names, sanitize, type_prefix};
pub use records::{record_size, split_sections, Record, Section, Sections, CARD_LEN, NRECS};
pub use tokenizer::{parse_parameters, Delimiters};
pub use units::{extract_unit_scale, unit_flag_to_mm, unit_name_to_mm};

use iges_model::Result;
use std::path::Path;

/// Quick parse function for simple use cases
pub fn parse(content: &str) -> Result<IgesFile> {
    IgesFile::parse(content)
}

/// Read and parse an IGES file from disk
pub fn read_file(path: impl AsRef<Path>) -> Result<IgesFile> {
    IgesFile::read(path)
}
