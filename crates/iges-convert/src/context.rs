// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion context and options
//!
//! Everything a conversion pass reads or mutates lives in one
//! [`ConversionContext`] that passes borrow mutably in turn.

use crate::{ConvertError, Result};
use iges_model::{
    DeNumber, DecodedEntity, DirectoryEntry, DirectoryTable, GlobalSection, ParameterRecord,
    ParameterSource, Transform,
};
use iges_parser::IgesFile;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Default name of the combined NURBS object
pub const DEFAULT_NURBS_NAME: &str = "nurb.s";

/// Conversion options
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Convert rational B-spline surfaces into one NURBS object
    pub nurbs: bool,
    /// Database title; defaults to the file name from the Global section
    pub title: Option<String>,
    /// Name of the combined NURBS object
    pub nurbs_name: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            nurbs: false,
            title: None,
            nurbs_name: DEFAULT_NURBS_NAME.to_string(),
        }
    }
}

impl ConvertOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether surfaces are converted
    pub fn with_nurbs(mut self, enabled: bool) -> Self {
        self.nurbs = enabled;
        self
    }

    /// Set the database title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the name of the combined NURBS object
    pub fn with_nurbs_name(mut self, name: impl Into<String>) -> Self {
        self.nurbs_name = name.into();
        self
    }
}

/// Vertex and edge lookup tables of the B-rep being assembled
///
/// Keys are `(list DE, 1-based index)`.
#[derive(Debug, Default)]
pub(crate) struct Topology {
    /// Vertex list entries to polyhedron vertex indices
    pub vertices: FxHashMap<(DeNumber, usize), usize>,
    /// Edge list entries to the interior vertices of their tessellation,
    /// in start to end order
    pub edges: FxHashMap<(DeNumber, usize), Vec<usize>>,
}

impl Topology {
    fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
    }
}

/// State shared by all conversion passes
pub struct ConversionContext {
    global: GlobalSection,
    table: DirectoryTable,
    source: Box<dyn ParameterSource>,
    unit_factor: f64,
    options: ConvertOptions,
    /// DE of the BRL-CAD attribute definition, once located
    attribute_def: Option<DeNumber>,
    /// Name of the NURBS object, once written
    nurbs_object: Option<String>,
    pub(crate) topology: Topology,
}

impl ConversionContext {
    /// Create a context owning the file's directory and parameter decoder
    pub fn from_file(file: IgesFile, options: ConvertOptions) -> Self {
        let (global, table, decoder, unit_factor) = file.into_parts();
        Self {
            global,
            table,
            source: Box::new(decoder),
            unit_factor,
            options,
            attribute_def: None,
            nurbs_object: None,
            topology: Topology::default(),
        }
    }

    /// Global section of the input file
    pub fn global(&self) -> &GlobalSection {
        &self.global
    }

    /// Conversion options
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Millimetres per model unit
    pub fn unit_factor(&self) -> f64 {
        self.unit_factor
    }

    /// Directory table
    pub fn table(&self) -> &DirectoryTable {
        &self.table
    }

    /// Number of directory entries
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if the directory is empty
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Directory entry by index
    pub fn entry(&self, index: usize) -> Result<&DirectoryEntry> {
        self.table.entry(index).ok_or_else(|| {
            ConvertError::reference(DeNumber::from_index(index), "not in the directory")
        })
    }

    /// Mutable directory entry by index
    pub fn entry_mut(&mut self, index: usize) -> Result<&mut DirectoryEntry> {
        self.table.entry_mut(index).ok_or_else(|| {
            ConvertError::reference(DeNumber::from_index(index), "not in the directory")
        })
    }

    /// Index of a DE pointer
    pub fn lookup(&self, de: DeNumber) -> Result<usize> {
        self.table
            .lookup(de)
            .ok_or_else(|| ConvertError::reference(de, "pointer outside the directory"))
    }

    /// Decode the entity at an index
    pub fn decode(&self, index: usize) -> Result<DecodedEntity> {
        let entry = self.entry(index)?;
        Ok(self.source.decode(DeNumber::from_index(index), entry)?)
    }

    /// Raw parameter record of the entity at an index
    pub fn parameters(&self, index: usize) -> Result<Arc<ParameterRecord>> {
        let entry = self.entry(index)?;
        Ok(self.source.parameters(DeNumber::from_index(index), entry)?)
    }

    /// Object name of the entity at an index
    pub fn name(&self, index: usize) -> String {
        self.table
            .entry(index)
            .map(|e| e.display_name().to_string())
            .unwrap_or_default()
    }

    /// Placement of the entity at an index
    pub fn rot(&self, index: usize) -> Transform {
        self.table
            .entry(index)
            .map(|e| e.rot.clone())
            .unwrap_or_default()
    }

    /// Record one more reference to the entity at an index
    pub fn add_reference(&mut self, index: usize) {
        self.table.add_reference(index);
    }

    /// DE of the BRL-CAD attribute definition, if the file has one
    pub fn attribute_definition(&self) -> Option<DeNumber> {
        self.attribute_def
    }

    pub(crate) fn set_attribute_definition(&mut self, de: Option<DeNumber>) {
        self.attribute_def = de;
    }

    /// Name of the combined NURBS object, if one was written
    pub fn nurbs_object(&self) -> Option<&str> {
        self.nurbs_object.as_deref()
    }

    pub(crate) fn set_nurbs_object(&mut self, name: String) {
        self.nurbs_object = Some(name);
    }

    /// Forget the vertex and edge tables of the previous B-rep
    pub(crate) fn reset_topology(&mut self) {
        self.topology.clear();
    }
}

impl std::fmt::Debug for ConversionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionContext")
            .field("entities", &self.table.len())
            .field("unit_factor", &self.unit_factor)
            .field("attribute_def", &self.attribute_def)
            .field("nurbs_object", &self.nurbs_object)
            .finish()
    }
}
