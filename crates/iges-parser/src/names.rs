// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity naming
//!
//! Every entity gets a name that is unique across the file: a name property
//! (406 form 15) when one is attached, else its label and subscript, else a
//! type prefix and its DE number.

use iges_model::{DeNumber, DirectoryEntry, DirectoryTable, Entity, EntityType, ParameterSource};
use log::debug;
use rustc_hash::FxHashSet;

/// Name prefix for generated names
pub fn type_prefix(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Block | EntityType::RightAngularWedge => "arb",
        EntityType::RightCircularCylinder => "rcc",
        EntityType::RightCircularConeFrustum => "trc",
        EntityType::Sphere => "sph",
        EntityType::Torus => "tor",
        EntityType::SolidOfRevolution => "rev",
        EntityType::SolidOfLinearExtrusion => "ext",
        EntityType::Ellipsoid => "ell",
        EntityType::BooleanTree => "comb",
        EntityType::SolidAssembly => "assem",
        EntityType::ManifoldSolidBrep => "brep",
        EntityType::SolidInstance => "inst",
        EntityType::RationalBSplineSurface => "nurb",
        t if t.is_curve() => "curve",
        _ => "ent",
    }
}

/// Replace characters that cannot appear in object names
pub fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Name from an attached 406 form 15 property
fn name_property(
    table: &DirectoryTable,
    source: &dyn ParameterSource,
    de: DeNumber,
    entry: &DirectoryEntry,
) -> Option<String> {
    let decoded = source.decode(de, entry).ok()?;
    decoded.properties.iter().find_map(|prop| {
        let prop_entry = table.get(*prop)?;
        if prop_entry.entity_type != EntityType::Property || prop_entry.form != 15 {
            return None;
        }
        match source.decode(*prop, prop_entry).ok()?.entity {
            Entity::NameProperty(p) if !p.name.trim().is_empty() => Some(p.name),
            _ => None,
        }
    })
}

/// Preferred name before uniqueness is enforced
fn base_name(
    table: &DirectoryTable,
    source: &dyn ParameterSource,
    index: usize,
    entry: &DirectoryEntry,
) -> String {
    let de = DeNumber::from_index(index);
    if let Some(name) = name_property(table, source, de, entry) {
        return sanitize(&name);
    }
    let label = entry.label.trim();
    if !label.is_empty() {
        return if entry.subscript != 0 {
            sanitize(&format!("{}.{}", label, entry.subscript))
        } else {
            sanitize(label)
        };
    }
    format!("{}.{}", type_prefix(entry.entity_type), de.0)
}

/// Assign a unique name to every directory entry
pub fn assign_names(table: &mut DirectoryTable, source: &dyn ParameterSource) {
    let mut used = FxHashSet::default();
    let mut names = Vec::with_capacity(table.len());
    for (index, entry) in table.iter() {
        let base = base_name(table, source, index, entry);
        let mut name = base.clone();
        let mut n = 1;
        while used.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        if name != base {
            debug!("Renamed {} to {} to keep names unique", base, name);
        }
        used.insert(name.clone());
        names.push(name);
    }
    for (entry, name) in table.iter_mut().zip(names) {
        entry.name = Some(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iges_model::{Parameter, ParameterRecord, Result};
    use std::sync::Arc;

    /// Every entity decodes to its bare type number
    struct Empty;

    impl ParameterSource for Empty {
        fn parameters(&self, de: DeNumber, entry: &DirectoryEntry) -> Result<Arc<ParameterRecord>> {
            Ok(Arc::new(ParameterRecord::new(
                de,
                vec![Parameter::Integer(entry.type_number() as i64)],
            )))
        }
    }

    fn entry(entity_type: EntityType, label: &str, subscript: i32) -> DirectoryEntry {
        DirectoryEntry {
            entity_type,
            label: label.to_string(),
            subscript,
            ..Default::default()
        }
    }

    #[test]
    fn test_generated_names() {
        let mut table = DirectoryTable::new(vec![
            entry(EntityType::Torus, "", 0),
            entry(EntityType::BooleanTree, "", 0),
            entry(EntityType::Line, "", 0),
        ]);
        assign_names(&mut table, &Empty);
        assert_eq!(table.entry(0).unwrap().name.as_deref(), Some("tor.1"));
        assert_eq!(table.entry(1).unwrap().name.as_deref(), Some("comb.3"));
        assert_eq!(table.entry(2).unwrap().name.as_deref(), Some("curve.5"));
    }

    #[test]
    fn test_labels_and_collisions() {
        let mut table = DirectoryTable::new(vec![
            entry(EntityType::Sphere, "SPHERE", 1),
            entry(EntityType::Sphere, "my part", 0),
            entry(EntityType::Sphere, "my part", 0),
        ]);
        assign_names(&mut table, &Empty);
        assert_eq!(table.entry(0).unwrap().name.as_deref(), Some("SPHERE.1"));
        assert_eq!(table.entry(1).unwrap().name.as_deref(), Some("my_part"));
        assert_eq!(table.entry(2).unwrap().name.as_deref(), Some("my_part_1"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(" a/b c "), "a_b_c");
    }
}
