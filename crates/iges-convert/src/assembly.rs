// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid assemblies (184)

use crate::{ConversionContext, ConvertError, Result};
use iges_model::{BoolOp, Combination, DeNumber, Entity, GeometryWriter, Member, Transform};

/// Placement given by a transformation matrix entity, including the
/// matrix's own parent transform
fn placement(ctx: &ConversionContext, de: DeNumber) -> Result<Transform> {
    let index = ctx.lookup(de)?;
    match ctx.decode(index)?.entity {
        Entity::TransformationMatrix(m) => Ok(Transform::compose(
            &ctx.rot(index),
            &Transform::from_matrix(m.to_matrix(ctx.unit_factor())),
        )),
        _ => Err(ConvertError::invalid(
            de,
            "assembly matrix pointer is not a transformation matrix",
        )),
    }
}

/// Convert the assembly at `index` into a group of its items
pub fn convert_assembly(
    ctx: &mut ConversionContext,
    index: usize,
    db: &mut dyn GeometryWriter,
) -> Result<()> {
    let de = DeNumber::from_index(index);
    let assembly = match ctx.decode(index)?.entity {
        Entity::SolidAssembly(a) => a,
        _ => return Err(ConvertError::invalid(de, "not a solid assembly")),
    };
    if assembly.items.is_empty() {
        return Err(ConvertError::invalid(de, "assembly has no items"));
    }

    let mut placed = Vec::with_capacity(assembly.items.len());
    for (item, matrix) in assembly.items.iter().zip(&assembly.matrices) {
        let item_index = ctx.lookup(*item)?;
        let outer = match matrix {
            Some(m) => placement(ctx, *m)?,
            None => Transform::Identity,
        };
        placed.push((item_index, Transform::compose(&outer, &ctx.rot(item_index))));
    }

    let members = placed
        .into_iter()
        .map(|(item_index, rot)| {
            ctx.add_reference(item_index);
            Member::new(ctx.name(item_index), BoolOp::Union).with_matrix(rot.to_row_major())
        })
        .collect();
    let mut comb = Combination::group(members);
    comb.rgb = ctx.entry(index)?.rgb;
    db.write_combination(&ctx.name(index), comb)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;
    use crate::MemoryDatabase;
    use iges_parser::IgesBuilder;

    #[test]
    fn test_assembly_members() {
        let mut builder = IgesBuilder::new();
        let sph = builder.entity(158, 0, "2.");
        let blk = builder.entity(150, 0, "1.,1.,1.");
        let m = builder.entity(124, 0, "0.,-1.,0.,3.,1.,0.,0.,0.,0.,0.,1.,0.");
        let assem = builder.entity(184, 0, &format!("2,{},{},0,{}", sph.0, blk.0, m.0));
        let mut ctx = context(&builder);
        let mut db = MemoryDatabase::new();
        let index = ctx.lookup(assem).unwrap();
        convert_assembly(&mut ctx, index, &mut db).unwrap();

        let comb = db.combination(&ctx.name(index)).unwrap();
        assert!(!comb.region);
        assert_eq!(comb.members.len(), 2);
        assert_eq!(comb.members[0].name, "sph.1");
        assert_eq!(comb.members[0].matrix, None);
        assert_eq!(comb.members[1].name, "arb.3");
        let matrix = comb.members[1].matrix.unwrap();
        assert_eq!(matrix[1], -1.0);
        assert_eq!(matrix[3], 3.0);
        assert!(comb.members.iter().all(|m| m.op == BoolOp::Union));

        for de in [sph, blk] {
            assert_eq!(ctx.entry(ctx.lookup(de).unwrap()).unwrap().referenced, 1);
        }
    }

    #[test]
    fn test_bad_matrix_pointer() {
        let mut builder = IgesBuilder::new();
        let sph = builder.entity(158, 0, "2.");
        let assem = builder.entity(184, 0, &format!("1,{},{}", sph.0, sph.0));
        let mut ctx = context(&builder);
        let mut db = MemoryDatabase::new();
        let index = ctx.lookup(assem).unwrap();
        assert!(convert_assembly(&mut ctx, index, &mut db).is_err());
        assert_eq!(ctx.entry(0).unwrap().referenced, 0);
        assert!(db.is_empty());
    }
}
