// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion driver
//!
//! The passes must run in a fixed order: colors and the attribute
//! definition first, then the entity passes, then grouping. The pipeline
//! encodes that order in its type so it cannot be violated:
//!
//! ```rust,ignore
//! let (db, report) = Pipeline::new(file, ConvertOptions::default(), MemoryDatabase::new())?
//!     .resolve_attributes()
//!     .convert()
//!     .finish();
//! ```

use crate::assembly::convert_assembly;
use crate::attributes::get_att;
use crate::color::docolor;
use crate::group::make_group;
use crate::instance::convert_instance;
use crate::report::{ConversionReport, EntityFailure, PassSummary};
use crate::surface::{convert_surface, write_surfaces};
use crate::tree::convert_tree;
use crate::{ConversionContext, ConvertOptions, Result, SolidRouter};
use iges_model::{DeNumber, DirectoryEntry, EntityType, GeometryWriter};
use iges_parser::IgesFile;
use log::{error, info};
use std::marker::PhantomData;

/// Title used when neither the options nor the file name one
pub const DEFAULT_TITLE: &str = "Conversion from IGES";

/// Units of every written database
pub const DATABASE_UNITS: &str = "mm";

/// File loaded, header written
pub struct Loaded;
/// Colors resolved and attribute definition located
pub struct AttributesResolved;
/// Entity passes done
pub struct Converted;

/// Conversion of one file into one database
pub struct Pipeline<S, W: GeometryWriter> {
    ctx: ConversionContext,
    db: W,
    router: SolidRouter,
    report: ConversionReport,
    _state: PhantomData<S>,
}

impl<S, W: GeometryWriter> Pipeline<S, W> {
    /// Conversion context
    pub fn context(&self) -> &ConversionContext {
        &self.ctx
    }

    /// Report of the passes run so far
    pub fn report(&self) -> &ConversionReport {
        &self.report
    }

    fn into_state<T>(self) -> Pipeline<T, W> {
        Pipeline {
            ctx: self.ctx,
            db: self.db,
            router: self.router,
            report: self.report,
            _state: PhantomData,
        }
    }
}

impl<W: GeometryWriter> Pipeline<Loaded, W> {
    /// Take ownership of the file and write the database header
    pub fn new(file: IgesFile, options: ConvertOptions, mut db: W) -> Result<Self> {
        let title = options
            .title
            .clone()
            .or_else(|| file.global().file_name.clone().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        db.write_header(&title, DATABASE_UNITS)?;
        info!("Converting {} entities into \"{}\"", file.entity_count(), title);

        Ok(Self {
            ctx: ConversionContext::from_file(file, options),
            db,
            router: SolidRouter::with_default_converters(),
            report: ConversionReport::new(),
            _state: PhantomData,
        })
    }

    /// Replace the solid router
    pub fn with_router(mut self, router: SolidRouter) -> Self {
        self.router = router;
        self
    }

    /// Resolve colors and locate the BRL-CAD attribute definition
    pub fn resolve_attributes(mut self) -> Pipeline<AttributesResolved, W> {
        let colored = docolor(&mut self.ctx);
        info!("Resolved colors of {} entities", colored);
        get_att(&mut self.ctx);
        self.into_state()
    }
}

/// Indices of unaliased entries matching `keep`
fn select(ctx: &ConversionContext, keep: impl Fn(&DirectoryEntry) -> bool) -> Vec<usize> {
    ctx.table()
        .iter()
        .filter(|(_, e)| e.alias_of.is_none() && keep(e))
        .map(|(i, _)| i)
        .collect()
}

/// Run `convert` on each index, recording a summary and any failures
fn run_pass<W: GeometryWriter>(
    ctx: &mut ConversionContext,
    db: &mut W,
    report: &mut ConversionReport,
    label: &str,
    indices: Vec<usize>,
    mut convert: impl FnMut(&mut ConversionContext, usize, &mut W) -> Result<()>,
) {
    let mut summary = PassSummary::new(label);
    for index in indices {
        summary.attempted += 1;
        match convert(ctx, index, db) {
            Ok(()) => summary.converted += 1,
            Err(e) => {
                let name = ctx.name(index);
                error!("Failed to convert {}: {}", name, e);
                report.failures.push(EntityFailure {
                    de: DeNumber::from_index(index),
                    entity_type: ctx
                        .entry(index)
                        .map(|entry| entry.entity_type)
                        .unwrap_or_default(),
                    name,
                    message: e.to_string(),
                });
            }
        }
    }
    info!("{}", summary);
    report.passes.push(summary);
}

impl<W: GeometryWriter> Pipeline<AttributesResolved, W> {
    /// Run the surface, instance, solid, B-rep, boolean tree and assembly
    /// passes in that order
    pub fn convert(mut self) -> Pipeline<Converted, W> {
        if self.ctx.options().nurbs {
            self.convert_surfaces();
        }

        let indices = select(&self.ctx, |e| e.entity_type == EntityType::SolidInstance);
        run_pass(
            &mut self.ctx,
            &mut self.db,
            &mut self.report,
            "solid instances",
            indices,
            |ctx, i, db| convert_instance(ctx, i, db).map(|_| ()),
        );

        let indices = select(&self.ctx, |e| e.entity_type.is_solid_primitive());
        run_pass(
            &mut self.ctx,
            &mut self.db,
            &mut self.report,
            "solids",
            indices,
            |ctx, i, db| self.router.convert(ctx, i, db),
        );

        let indices = select(&self.ctx, |e| e.entity_type == EntityType::ManifoldSolidBrep);
        run_pass(
            &mut self.ctx,
            &mut self.db,
            &mut self.report,
            "B-rep solids",
            indices,
            |ctx, i, db| self.router.convert(ctx, i, db),
        );

        let indices = select(&self.ctx, |e| e.entity_type == EntityType::BooleanTree);
        run_pass(
            &mut self.ctx,
            &mut self.db,
            &mut self.report,
            "boolean trees",
            indices,
            |ctx, i, db| convert_tree(ctx, i, db),
        );

        let indices = select(&self.ctx, |e| e.entity_type == EntityType::SolidAssembly);
        run_pass(
            &mut self.ctx,
            &mut self.db,
            &mut self.report,
            "solid assemblies",
            indices,
            |ctx, i, db| convert_assembly(ctx, i, db),
        );

        self.into_state()
    }

    fn convert_surfaces(&mut self) {
        let indices = select(&self.ctx, |e| {
            e.entity_type == EntityType::RationalBSplineSurface
        });
        let mut surfaces = Vec::with_capacity(indices.len());
        run_pass(
            &mut self.ctx,
            &mut self.db,
            &mut self.report,
            "surfaces",
            indices,
            |ctx, i, _| {
                surfaces.push(convert_surface(ctx, i)?);
                Ok(())
            },
        );
        if let Err(e) = write_surfaces(&mut self.ctx, &mut self.db, surfaces) {
            error!("Failed to write surfaces: {}", e);
        }
    }
}

impl<W: GeometryWriter> Pipeline<Converted, W> {
    /// Write the top-level group and hand back the database
    pub fn finish(mut self) -> (W, ConversionReport) {
        if let Err(e) = make_group(&self.ctx, &mut self.db) {
            error!("Failed to write the top-level group: {}", e);
        }
        (self.db, self.report)
    }
}

/// Run every pass over `file`, writing into `db`
pub fn convert_file<W: GeometryWriter>(
    file: IgesFile,
    options: ConvertOptions,
    db: W,
) -> Result<(W, ConversionReport)> {
    Ok(Pipeline::new(file, options, db)?
        .resolve_attributes()
        .convert()
        .finish())
}
