// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IGES to BRL-CAD conversion
//!
//! Turns the entities of a parsed IGES file into named solids and
//! combinations written through the [`GeometryWriter`] trait from
//! `iges-model`, so the conversion does not depend on any particular
//! database backend.
//!
//! ## Overview
//!
//! - **Solids**: CSG primitives, solids of revolution and extrusion, and
//!   manifold B-reps, routed by entity type through [`SolidRouter`]
//! - **Curves**: lines, arcs, conics, splines and composites sampled into
//!   polylines for swept solids and curved B-rep edges
//! - **Structure**: boolean trees, assemblies and instances become
//!   combinations carrying BRL-CAD region attributes and colors
//! - **Surfaces**: rational B-spline surfaces collected into one NURBS
//!   object
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use iges_convert::{convert_file, ConvertOptions, MemoryDatabase};
//!
//! let file = iges_parser::read_file("part.igs")?;
//! let (db, report) = convert_file(file, ConvertOptions::default(), MemoryDatabase::new())?;
//!
//! for pass in &report.passes {
//!     println!("{}", pass);
//! }
//! println!("{}", db.to_json()?);
//! ```

pub mod assembly;
pub mod attributes;
pub mod color;
pub mod conic;
pub mod context;
pub mod curve;
pub mod database;
pub mod error;
pub mod extrude;
pub mod group;
pub mod instance;
pub mod pipeline;
pub mod report;
pub mod revolve;
pub mod shell;
pub mod solids;
pub mod spline;
pub mod surface;
pub mod tree;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};

// Re-export main types
pub use context::{ConversionContext, ConvertOptions, DEFAULT_NURBS_NAME};
pub use database::{DbObject, MemoryDatabase};
pub use error::{ConvertError, Result};
pub use iges_model::GeometryWriter;
pub use pipeline::{convert_file, AttributesResolved, Converted, Loaded, Pipeline};
pub use report::{ConversionReport, EntityFailure, PassSummary};
pub use solids::{PrimitiveConverter, SolidConverter, SolidRouter};

// Re-export converters
pub use assembly::convert_assembly;
pub use attributes::{find_attributes, get_att, read_att};
pub use color::docolor;
pub use curve::get_curve;
pub use extrude::ExtrusionConverter;
pub use group::make_group;
pub use instance::{convert_instance, InstanceOutcome};
pub use revolve::RevolutionConverter;
pub use shell::{glue_faces, BrepConverter};
pub use surface::{convert_surface, is_planar, write_surfaces};
pub use tree::{convert_tree, make_members, BoolTree};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{ConversionContext, ConvertOptions};
    use iges_model::DeNumber;
    use iges_parser::{EntitySpec, IgesBuilder, IgesFile};

    /// Context over the file a builder renders
    pub fn context(builder: &IgesBuilder) -> ConversionContext {
        let file = IgesFile::parse(&builder.build()).unwrap();
        ConversionContext::from_file(file, ConvertOptions::default())
    }

    /// Add a BRL-CAD attribute definition and one instance of it with the
    /// given parameters; returns their DEs
    pub fn attribute_entities(builder: &mut IgesBuilder, values: &str) -> (DeNumber, DeNumber) {
        let text = "BRLCAD attribute definition:material name,region flag";
        let def = builder.entity(322, 0, &format!("{}H{},5001,0", text.len(), text));
        let inst = builder.add(EntitySpec::new(422, 0, values).with_structure(-(def.0 as i32)));
        (def, inst)
    }
}
