// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BRL-CAD region attributes
//!
//! Files written by BRL-CAD carry one attribute table definition (322)
//! whose name starts with [`ATTRIBUTE_DEFINITION_PREFIX`]. Regions attach
//! attribute table instances (422) pointing back at it through their
//! structure field.

use crate::{ConversionContext, ConvertError, Result};
use iges_model::{BrlcadAttributes, DeNumber, Entity, EntityType};
use log::{info, warn};

/// Name prefix of the BRL-CAD attribute definition
pub const ATTRIBUTE_DEFINITION_PREFIX: &str = "BRLCAD attribute definition";

/// Locate the BRL-CAD attribute definition and remember it in the context
pub fn get_att(ctx: &mut ConversionContext) -> Option<DeNumber> {
    let candidates: Vec<usize> = ctx
        .table()
        .iter()
        .filter(|(_, e)| e.entity_type == EntityType::AttributeTableDefinition && e.form == 0)
        .map(|(i, _)| i)
        .collect();

    let found = candidates.into_iter().find_map(|index| match ctx.decode(index) {
        Ok(decoded) => match decoded.entity {
            Entity::AttributeDefinition(def)
                if def.name.starts_with(ATTRIBUTE_DEFINITION_PREFIX) =>
            {
                Some(DeNumber::from_index(index))
            }
            _ => None,
        },
        Err(e) => {
            warn!("{}", e);
            None
        }
    });

    if let Some(de) = found {
        info!("BRL-CAD attribute definition at {}", de);
    }
    ctx.set_attribute_definition(found);
    found
}

/// Read the attribute instance (422) at `de`
pub fn read_att(ctx: &ConversionContext, de: DeNumber) -> Result<BrlcadAttributes> {
    let index = ctx.lookup(de)?;
    let entry = ctx.entry(index)?;
    if entry.entity_type != EntityType::AttributeTableInstance {
        return Err(ConvertError::invalid(
            de,
            format!("expected an attribute instance, found {}", entry.entity_type),
        ));
    }
    let record = ctx.parameters(index)?;
    Ok(BrlcadAttributes::read(&mut record.cursor())?)
}

/// Attributes from the first property that instantiates the BRL-CAD
/// attribute definition
///
/// Returns `None` when the file has no definition or no property matches.
pub fn find_attributes(
    ctx: &ConversionContext,
    properties: &[DeNumber],
) -> Option<BrlcadAttributes> {
    let definition = ctx.attribute_definition()?;
    properties.iter().find_map(|&prop| {
        let entry = ctx.table().get(prop)?;
        if entry.entity_type != EntityType::AttributeTableInstance
            || entry.structure_pointer() != Some(definition)
        {
            return None;
        }
        read_att(ctx, prop)
            .map_err(|e| warn!("Ignoring attributes: {}", e))
            .ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{attribute_entities, context};
    use iges_parser::IgesBuilder;

    #[test]
    fn test_get_att() {
        let mut builder = IgesBuilder::new();
        builder.entity(322, 0, "5HOTHER,5001,0");
        let (def, _) = attribute_entities(&mut builder, "5Hsteel,,1,1000,0,7,100,0,1");
        let mut ctx = context(&builder);
        assert_eq!(get_att(&mut ctx), Some(def));
        assert_eq!(ctx.attribute_definition(), Some(def));
    }

    #[test]
    fn test_get_att_missing() {
        let mut builder = IgesBuilder::new();
        builder.entity(158, 0, "1.");
        let mut ctx = context(&builder);
        assert_eq!(get_att(&mut ctx), None);
    }

    #[test]
    fn test_read_att() {
        let mut builder = IgesBuilder::new();
        let (_, inst) = attribute_entities(&mut builder, "5Hsteel,,1,1000,0,7,80,0,1");
        let sph = builder.entity(158, 0, "1.");
        let ctx = context(&builder);

        let att = read_att(&ctx, inst).unwrap();
        assert_eq!(att.material_name, "steel");
        assert_eq!(att.material_params, "");
        assert!(att.region_flag);
        assert_eq!(att.ident, 1000);
        assert_eq!(att.material_code, 7);
        assert_eq!(att.los_density, 80);
        assert!(att.color_defined);

        assert!(matches!(
            read_att(&ctx, sph),
            Err(ConvertError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_find_attributes_requires_definition() {
        let mut builder = IgesBuilder::new();
        let (_, inst) = attribute_entities(&mut builder, ",,0,5");
        let mut ctx = context(&builder);
        assert_eq!(find_attributes(&ctx, &[inst]), None);

        get_att(&mut ctx);
        let att = find_attributes(&ctx, &[inst]).unwrap();
        assert!(!att.region_flag);
        assert_eq!(att.ident, 5);
        assert_eq!(att.los_density, 100);
    }
}
