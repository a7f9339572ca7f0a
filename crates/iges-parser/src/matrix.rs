// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transformation matrix evaluation
//!
//! A directory entry's transformation field points at a type 124 entity,
//! which may itself point at a parent 124. The evaluated placement is
//! `parent * child`; translations are converted to millimetres.

use iges_model::{
    DeNumber, DirectoryTable, Entity, EntityType, ParameterSource, Transform,
};
use log::warn;
use nalgebra::Matrix4;
use rustc_hash::{FxHashMap, FxHashSet};

/// Longest chain of nested transformation matrices followed
pub const MAX_MATRIX_DEPTH: usize = 64;

/// Evaluate a chain of 124 entities starting at `start`
fn evaluate_chain(
    table: &DirectoryTable,
    source: &dyn ParameterSource,
    start: DeNumber,
    unit_scale: f64,
    memo: &mut FxHashMap<usize, Matrix4<f64>>,
) -> Option<Matrix4<f64>> {
    let mut chain = Vec::new();
    let mut seen = FxHashSet::default();
    let mut current = Some(start);
    let mut cached_root = None;

    while let Some(de) = current {
        let Some(index) = table.lookup(de) else {
            warn!("Transformation matrix pointer {} is out of range", de);
            return None;
        };
        if let Some(m) = memo.get(&index) {
            cached_root = Some(*m);
            break;
        }
        if !seen.insert(index) || chain.len() >= MAX_MATRIX_DEPTH {
            warn!("Transformation matrix chain at {} is cyclic or too deep", start);
            return None;
        }
        let entry = table.entry(index)?;
        if entry.entity_type != EntityType::TransformationMatrix {
            warn!(
                "{} points at {} as its transformation matrix",
                start, entry.entity_type
            );
            return None;
        }
        let matrix = match source.decode(de, entry) {
            Ok(decoded) => match decoded.entity {
                Entity::TransformationMatrix(m) => m.to_matrix(unit_scale),
                _ => return None,
            },
            Err(e) => {
                warn!("Cannot read transformation matrix {}: {}", de, e);
                return None;
            }
        };
        chain.push((index, matrix));
        current = DeNumber::from_pointer(entry.trans as i64);
    }

    // fold from the outermost parent inwards, remembering each partial product
    let mut product = cached_root.unwrap_or_else(Matrix4::identity);
    for (index, matrix) in chain.into_iter().rev() {
        product *= matrix;
        memo.insert(index, product);
    }
    Some(product)
}

/// Fill in `rot` for every directory entry with a transformation pointer
///
/// Broken chains are reported and leave the entry at identity.
pub fn evaluate_transforms(table: &mut DirectoryTable, source: &dyn ParameterSource, unit_scale: f64) {
    let mut memo = FxHashMap::default();
    let mut results = Vec::new();
    for (index, entry) in table.iter() {
        if let Some(de) = DeNumber::from_pointer(entry.trans as i64) {
            if let Some(m) = evaluate_chain(table, source, de, unit_scale, &mut memo) {
                results.push((index, Transform::from_matrix(m)));
            }
        } else if entry.trans != 0 {
            warn!(
                "{} has an invalid transformation pointer {}",
                DeNumber::from_index(index),
                entry.trans
            );
        }
    }
    for (index, rot) in results {
        if let Some(entry) = table.entry_mut(index) {
            entry.rot = rot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use iges_model::{DirectoryEntry, Parameter, ParameterRecord, Result};
    use nalgebra::Point3;
    use std::sync::Arc;

    /// Parameter source backed by a fixed list of records
    struct Fixed(Vec<Vec<f64>>);

    impl ParameterSource for Fixed {
        fn parameters(&self, de: DeNumber, _entry: &DirectoryEntry) -> Result<Arc<ParameterRecord>> {
            let params = self.0[de.index()].iter().map(|v| Parameter::Real(*v)).collect();
            Ok(Arc::new(ParameterRecord::new(de, params)))
        }
    }

    fn translation(x: f64, y: f64, z: f64) -> Vec<f64> {
        vec![124.0, 1.0, 0.0, 0.0, x, 0.0, 1.0, 0.0, y, 0.0, 0.0, 1.0, z]
    }

    fn matrix_entry(trans: i32) -> DirectoryEntry {
        DirectoryEntry {
            entity_type: EntityType::TransformationMatrix,
            trans,
            ..Default::default()
        }
    }

    fn sphere_entry(trans: i32) -> DirectoryEntry {
        DirectoryEntry {
            entity_type: EntityType::Sphere,
            trans,
            ..Default::default()
        }
    }

    #[test]
    fn test_nested_chain_with_units() {
        // DE 1: child, points at parent DE 3; DE 5: sphere using DE 1
        let mut table = DirectoryTable::new(vec![matrix_entry(3), matrix_entry(0), sphere_entry(1)]);
        let source = Fixed(vec![
            translation(1.0, 0.0, 0.0),
            translation(0.0, 2.0, 0.0),
            vec![158.0, 1.0],
        ]);
        evaluate_transforms(&mut table, &source, 25.4);
        let rot = &table.entry(2).unwrap().rot;
        let p = rot.apply_point(&Point3::origin());
        assert_relative_eq!(p.x, 25.4);
        assert_relative_eq!(p.y, 50.8);
        assert!(table.entry(1).unwrap().rot.apply_point(&Point3::origin()).x.abs() < 1e-12);
    }

    #[test]
    fn test_cycle_falls_back_to_identity() {
        let mut table = DirectoryTable::new(vec![matrix_entry(3), matrix_entry(1), sphere_entry(1)]);
        let source = Fixed(vec![
            translation(1.0, 0.0, 0.0),
            translation(0.0, 2.0, 0.0),
            vec![158.0, 1.0],
        ]);
        evaluate_transforms(&mut table, &source, 1.0);
        assert!(table.entry(2).unwrap().rot.is_identity());
    }

    #[test]
    fn test_pointer_to_non_matrix() {
        let mut table = DirectoryTable::new(vec![sphere_entry(0), sphere_entry(1)]);
        let source = Fixed(vec![vec![158.0, 1.0], vec![158.0, 1.0]]);
        evaluate_transforms(&mut table, &source, 1.0);
        assert!(table.entry(1).unwrap().rot.is_identity());
    }
}
