// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid instances (430)
//!
//! An instance carrying BRL-CAD attributes becomes a one-member region or
//! group. Any other instance collapses onto its target: the entry takes
//! over the target's type, parameters and name so that later passes treat
//! it as a placed copy.

use crate::attributes::find_attributes;
use crate::{ConversionContext, ConvertError, Result};
use iges_model::{BoolOp, Combination, DeNumber, Entity, GeometryWriter, Member, Transform};
use log::debug;

/// What an instance turned into
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstanceOutcome {
    /// A combination was written under the instance's name
    Combination(String),
    /// The entry now aliases the target at this index
    Alias(usize),
}

/// Convert the solid instance at `index`
pub fn convert_instance(
    ctx: &mut ConversionContext,
    index: usize,
    db: &mut dyn GeometryWriter,
) -> Result<InstanceOutcome> {
    let de = DeNumber::from_index(index);
    let decoded = ctx.decode(index)?;
    let target_de = match decoded.entity {
        Entity::SolidInstance(inst) => inst.target,
        _ => return Err(ConvertError::invalid(de, "not a solid instance")),
    };
    let target = ctx.lookup(target_de)?;

    if let Some(attributes) = find_attributes(ctx, &decoded.properties) {
        let member = Member::new(ctx.name(target), BoolOp::Union)
            .with_matrix(ctx.rot(index).to_row_major());
        let rgb = if attributes.color_defined {
            ctx.entry(index)?.rgb
        } else {
            None
        };
        let name = ctx.name(index);
        let comb = Combination {
            region: attributes.region_flag,
            members: vec![member],
            attributes: Some(attributes),
            rgb,
        };
        db.write_combination(&name, comb)?;
        ctx.add_reference(target);
        return Ok(InstanceOutcome::Combination(name));
    }

    let source = ctx.entry(target)?.clone();
    let entry = ctx.entry_mut(index)?;
    entry.entity_type = source.entity_type;
    entry.form = source.form;
    entry.param = source.param;
    entry.param_lines = source.param_lines;
    entry.name = source.name;
    entry.alias_of = Some(target);
    entry.rot = Transform::compose(&entry.rot, &source.rot);
    debug!("{} aliases {}", de, target_de);
    ctx.add_reference(target);
    Ok(InstanceOutcome::Alias(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::get_att;
    use crate::test_support::{attribute_entities, context};
    use crate::MemoryDatabase;
    use iges_model::EntityType;
    use iges_parser::{EntitySpec, IgesBuilder};

    #[test]
    fn test_alias_copies_target() {
        let mut builder = IgesBuilder::new();
        let sph = builder.entity(158, 0, "2.");
        let inst = builder.entity(430, 0, &format!("{}", sph.0));
        let mut ctx = context(&builder);
        let mut db = MemoryDatabase::new();
        let index = ctx.lookup(inst).unwrap();
        let target = ctx.lookup(sph).unwrap();

        let outcome = convert_instance(&mut ctx, index, &mut db).unwrap();
        assert_eq!(outcome, InstanceOutcome::Alias(target));
        assert!(db.is_empty());

        let alias = ctx.entry(index).unwrap().clone();
        let original = ctx.entry(target).unwrap();
        assert_eq!(alias.entity_type, EntityType::Sphere);
        assert_eq!(alias.form, original.form);
        assert_eq!(alias.param, original.param);
        assert_eq!(alias.name, original.name);
        assert_eq!(alias.alias_of, Some(target));
        assert!(alias.rot.is_identity());
        assert_eq!(original.referenced, 1);
    }

    #[test]
    fn test_alias_composes_transforms() {
        let mut builder = IgesBuilder::new();
        let shift = builder.entity(124, 0, "1.,0.,0.,1.,0.,1.,0.,0.,0.,0.,1.,0.");
        let lift = builder.entity(124, 0, "1.,0.,0.,0.,0.,1.,0.,0.,0.,0.,1.,2.");
        let sph = builder.add(EntitySpec::new(158, 0, "2.").with_trans(lift));
        let inst = builder.add(EntitySpec::new(430, 0, format!("{}", sph.0)).with_trans(shift));
        let mut ctx = context(&builder);
        let mut db = MemoryDatabase::new();
        let index = ctx.lookup(inst).unwrap();
        convert_instance(&mut ctx, index, &mut db).unwrap();

        let m = ctx.rot(index).to_row_major().unwrap();
        assert_eq!(m[3], 1.0);
        assert_eq!(m[11], 2.0);
    }

    #[test]
    fn test_instance_with_attributes() {
        let mut builder = IgesBuilder::new();
        let sph = builder.entity(158, 0, "2.");
        let (_, att) = attribute_entities(&mut builder, "5Hsteel,,1,1000,0,7,100,0,1");
        let inst = builder.add(
            EntitySpec::new(430, 0, format!("{},0,1,{}", sph.0, att.0)).with_color(2),
        );
        let mut ctx = context(&builder);
        get_att(&mut ctx);
        crate::color::docolor(&mut ctx);
        let mut db = MemoryDatabase::new();
        let index = ctx.lookup(inst).unwrap();

        let outcome = convert_instance(&mut ctx, index, &mut db).unwrap();
        let name = ctx.name(index);
        assert_eq!(outcome, InstanceOutcome::Combination(name.clone()));

        let comb = db.combination(&name).unwrap();
        assert!(comb.region);
        assert_eq!(comb.rgb, Some([255, 0, 0]));
        assert_eq!(comb.members.len(), 1);
        assert_eq!(comb.members[0].name, "sph.1");
        assert_eq!(comb.attributes.as_ref().unwrap().material_name, "steel");

        let target = ctx.entry(ctx.lookup(sph).unwrap()).unwrap();
        assert_eq!(target.referenced, 1);
        assert_eq!(ctx.entry(index).unwrap().alias_of, None);
    }

    #[test]
    fn test_target_outside_directory() {
        let mut builder = IgesBuilder::new();
        let inst = builder.entity(430, 0, "99");
        let mut ctx = context(&builder);
        let mut db = MemoryDatabase::new();
        let index = ctx.lookup(inst).unwrap();
        assert!(matches!(
            convert_instance(&mut ctx, index, &mut db),
            Err(ConvertError::Reference { .. })
        ));
    }
}
