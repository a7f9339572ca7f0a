// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Manifold solid B-rep (186) to polyhedron
//!
//! Shells (514) are walked face by face. Face loops (508) reference edges
//! of edge lists (504), which end on vertices of vertex lists (502). Every
//! list entry maps to one polyhedron vertex, so faces sharing an edge share
//! its vertices; curved edges are tessellated once and their interior
//! vertices reused by the adjacent face.

use crate::curve::get_curve;
use crate::solids::{to_vec3, SolidConverter};
use crate::surface::surface_is_planar;
use crate::{ConversionContext, ConvertError, Result};
use iges_model::entities::{EdgeList, EdgeRecord, LoopEdgeKind, VertexList};
use iges_model::{
    DeNumber, Entity, EntityType, GeometryWriter, PolyFace, PolyShell, PolyShellSet, Solid, Vec3,
};
use log::{debug, warn};
use nalgebra::Point3;
use rustc_hash::FxHashMap;

/// Count directed edges that have no opposite partner in the shell
///
/// A closed, consistently oriented shell uses every edge once in each
/// direction, so the result is zero.
pub fn glue_faces(shell: &PolyShell) -> usize {
    let mut edges: FxHashMap<(usize, usize), i64> = FxHashMap::default();
    for face in &shell.faces {
        for lp in &face.loops {
            for (i, &a) in lp.iter().enumerate() {
                let b = lp[(i + 1) % lp.len()];
                *edges.entry((a, b)).or_default() += 1;
            }
        }
    }
    edges
        .iter()
        .map(|(&(a, b), &n)| {
            let back = edges.get(&(b, a)).copied().unwrap_or(0);
            (n - back).max(0) as usize
        })
        .sum()
}

// ============================================================================
// Shell builder
// ============================================================================

/// Polyhedron under construction for one B-rep
struct ShellBuilder<'a> {
    ctx: &'a mut ConversionContext,
    vertices: Vec<Vec3>,
    vertex_lists: FxHashMap<DeNumber, VertexList>,
    edge_lists: FxHashMap<DeNumber, EdgeList>,
    skipped_faces: usize,
}

impl<'a> ShellBuilder<'a> {
    fn new(ctx: &'a mut ConversionContext) -> Self {
        ctx.reset_topology();
        Self {
            ctx,
            vertices: Vec::new(),
            vertex_lists: FxHashMap::default(),
            edge_lists: FxHashMap::default(),
            skipped_faces: 0,
        }
    }

    fn push(&mut self, p: Point3<f64>) -> usize {
        self.vertices.push(to_vec3(&p));
        self.vertices.len() - 1
    }

    fn decode(&self, de: DeNumber) -> Result<Entity> {
        let index = self.ctx.lookup(de)?;
        Ok(self.ctx.decode(index)?.entity)
    }

    fn vertex_list(&mut self, list: DeNumber) -> Option<&VertexList> {
        if !self.vertex_lists.contains_key(&list) {
            match self.decode(list) {
                Ok(Entity::VertexList(v)) => {
                    self.vertex_lists.insert(list, v);
                }
                Ok(_) => {
                    warn!("{} is not a vertex list", list);
                    return None;
                }
                Err(e) => {
                    warn!("{}", e);
                    return None;
                }
            }
        }
        self.vertex_lists.get(&list)
    }

    fn edge_list(&mut self, list: DeNumber) -> Option<&EdgeList> {
        if !self.edge_lists.contains_key(&list) {
            match self.decode(list) {
                Ok(Entity::EdgeList(e)) => {
                    self.edge_lists.insert(list, e);
                }
                Ok(_) => {
                    warn!("{} is not an edge list", list);
                    return None;
                }
                Err(e) => {
                    warn!("{}", e);
                    return None;
                }
            }
        }
        self.edge_lists.get(&list)
    }

    /// Polyhedron vertex for a vertex list entry
    fn vertex(&mut self, list: DeNumber, index: usize) -> Option<usize> {
        if let Some(&id) = self.ctx.topology.vertices.get(&(list, index)) {
            return Some(id);
        }
        let Some(point) = self.vertex_list(list)?.vertex(index) else {
            warn!("{} has no vertex {}", list, index);
            return None;
        };
        let rot = self
            .ctx
            .lookup(list)
            .map(|i| self.ctx.rot(i))
            .unwrap_or_default();
        let id = self.push(rot.apply_point(&(point * self.ctx.unit_factor())));
        self.ctx.topology.vertices.insert((list, index), id);
        Some(id)
    }

    fn required_vertex(&mut self, list: DeNumber, index: usize) -> Result<usize> {
        self.vertex(list, index)
            .ok_or_else(|| ConvertError::reference(list, format!("no vertex {}", index)))
    }

    /// Interior vertices of an edge, from its start to its end vertex
    fn edge_interior(
        &mut self,
        key: (DeNumber, usize),
        record: &EdgeRecord,
        start: usize,
        end: usize,
    ) -> Result<Vec<usize>> {
        if let Some(ids) = self.ctx.topology.edges.get(&key) {
            return Ok(ids.clone());
        }
        let curve_index = self.ctx.lookup(record.curve)?;
        let ids = if self.ctx.entry(curve_index)?.entity_type == EntityType::Line {
            Vec::new()
        } else {
            let mut points = get_curve(self.ctx, curve_index)?;
            let s = Point3::from(self.vertices[start]);
            let e = Point3::from(self.vertices[end]);
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                let forward = (first - s).norm() + (last - e).norm();
                let backward = (first - e).norm() + (last - s).norm();
                if backward < forward {
                    points.reverse();
                }
            }
            let n = points.len();
            if n > 2 {
                points[1..n - 1].iter().map(|p| self.push(*p)).collect()
            } else {
                Vec::new()
            }
        };
        debug!(
            "Edge {} of {}: {} interior vertices",
            key.1,
            key.0,
            ids.len()
        );
        self.ctx.topology.edges.insert(key, ids.clone());
        Ok(ids)
    }

    /// Vertices along an edge list entry, start to end
    fn edge(&mut self, list: DeNumber, index: usize) -> Result<Vec<usize>> {
        let record = self
            .edge_list(list)
            .and_then(|l| l.edge(index))
            .cloned()
            .ok_or_else(|| ConvertError::reference(list, format!("no edge {}", index)))?;
        let start = self.required_vertex(record.start_list, record.start_index)?;
        let end = self.required_vertex(record.end_list, record.end_index)?;
        let interior = self.edge_interior((list, index), &record, start, end)?;

        let mut ids = Vec::with_capacity(interior.len() + 2);
        ids.push(start);
        ids.extend(interior);
        ids.push(end);
        Ok(ids)
    }

    /// Vertex cycle of a loop (508)
    fn polygon(&mut self, loop_de: DeNumber) -> Result<Vec<usize>> {
        let lp = match self.decode(loop_de)? {
            Entity::Loop(lp) => lp,
            _ => return Err(ConvertError::invalid(loop_de, "not a loop")),
        };
        let mut ids: Vec<usize> = Vec::new();
        for entry in &lp.edges {
            let mut part = match entry.kind {
                LoopEdgeKind::Vertex => vec![self.required_vertex(entry.list, entry.index)?],
                LoopEdgeKind::Edge => self.edge(entry.list, entry.index)?,
            };
            if !entry.agrees {
                part.reverse();
            }
            if !part.is_empty() && ids.last() == part.first() {
                part.remove(0);
            }
            ids.extend(part);
        }
        if ids.len() > 1 && ids.first() == ids.last() {
            ids.pop();
        }
        if ids.len() < 3 {
            return Err(ConvertError::invalid(
                loop_de,
                format!("loop has {} distinct vertices", ids.len()),
            ));
        }
        Ok(ids)
    }

    /// Face (510); `None` when the face is skipped
    fn face(&mut self, face_de: DeNumber, agrees: bool) -> Result<Option<PolyFace>> {
        let face = match self.decode(face_de)? {
            Entity::Face(face) => face,
            _ => return Err(ConvertError::invalid(face_de, "not a face")),
        };
        let surface = self.ctx.lookup(face.surface)?;
        match surface_is_planar(self.ctx, surface) {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    "Face {} lies on non-planar surface {}, skipped",
                    face_de, face.surface
                );
                return Ok(None);
            }
            Err(e) => {
                warn!("Face {} skipped: {}", face_de, e);
                return Ok(None);
            }
        }
        if !face.outer_loop {
            debug!("Face {} has no designated outer loop", face_de);
        }

        let mut loops = Vec::with_capacity(face.loops.len());
        for lp in &face.loops {
            let mut ids = self.polygon(*lp)?;
            if !agrees {
                ids.reverse();
            }
            loops.push(ids);
        }
        Ok(Some(PolyFace { loops }))
    }

    /// Shell (514)
    fn shell(&mut self, shell_de: DeNumber, agrees: bool, void: bool) -> Result<PolyShell> {
        let shell = match self.decode(shell_de)? {
            Entity::Shell(shell) => shell,
            _ => return Err(ConvertError::invalid(shell_de, "not a shell")),
        };
        let mut faces = Vec::with_capacity(shell.faces.len());
        for &(face_de, face_agrees) in &shell.faces {
            match self.face(face_de, face_agrees == agrees) {
                Ok(Some(face)) => faces.push(face),
                Ok(None) => self.skipped_faces += 1,
                Err(e) => {
                    warn!("Face {} of shell {} skipped: {}", face_de, shell_de, e);
                    self.skipped_faces += 1;
                }
            }
        }
        Ok(PolyShell { faces, void })
    }
}

// ============================================================================
// Converter
// ============================================================================

/// Converter for manifold solid B-reps
pub struct BrepConverter;

impl BrepConverter {
    /// Create new converter
    pub fn new() -> Self {
        Self
    }
}

impl Default for BrepConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl SolidConverter for BrepConverter {
    fn convert(
        &self,
        ctx: &mut ConversionContext,
        index: usize,
        db: &mut dyn GeometryWriter,
    ) -> Result<()> {
        let de = DeNumber::from_index(index);
        let brep = match ctx.decode(index)?.entity {
            Entity::ManifoldSolid(brep) => brep,
            _ => return Err(ConvertError::invalid(de, "not a manifold solid B-rep")),
        };

        let mut builder = ShellBuilder::new(ctx);
        let mut shells = vec![builder.shell(brep.shell, brep.shell_agrees, false)?];
        for &(void, agrees) in &brep.voids {
            shells.push(builder.shell(void, agrees, true)?);
        }
        let ShellBuilder {
            vertices,
            skipped_faces,
            ..
        } = builder;

        if shells[0].faces.is_empty() {
            return Err(ConvertError::geometry(format!(
                "{}: outer shell has no convertible faces",
                de
            )));
        }
        if skipped_faces > 0 {
            warn!("{}: {} faces skipped", de, skipped_faces);
        }
        for (i, shell) in shells.iter().enumerate() {
            let open = glue_faces(shell);
            if open > 0 {
                warn!("{}: shell {} has {} unmatched edges", de, i + 1, open);
            }
        }

        let set = PolyShellSet { vertices, shells };
        debug!(
            "{}: {} vertices, {} faces",
            de,
            set.vertices.len(),
            set.face_count()
        );
        db.write_solid(&ctx.name(index), Solid::Polyhedron(set))?;
        Ok(())
    }

    fn supported_types(&self) -> Vec<EntityType> {
        vec![EntityType::ManifoldSolidBrep]
    }
}
