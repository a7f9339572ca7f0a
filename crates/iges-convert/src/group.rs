// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Top-level grouping

use crate::{ConversionContext, Result};
use iges_model::{BoolOp, Combination, EntityType, GeometryWriter, Member};
use log::info;

/// Name of the top-level group
pub const TOP_GROUP: &str = "all";

fn is_top_level_candidate(entity_type: EntityType) -> bool {
    entity_type.is_csg()
        || matches!(
            entity_type,
            EntityType::SolidInstance | EntityType::ManifoldSolidBrep
        )
}

/// Write the `all` group of unreferenced top-level objects
///
/// Only objects present in the database count. The group is written when
/// there is more than one of them, or when a NURBS object exists; returns
/// whether it was.
pub fn make_group(ctx: &ConversionContext, db: &mut dyn GeometryWriter) -> Result<bool> {
    let mut members: Vec<Member> = ctx
        .table()
        .iter()
        .filter(|(_, e)| e.referenced == 0 && is_top_level_candidate(e.entity_type))
        .map(|(index, _)| (index, ctx.name(index)))
        .filter(|(_, name)| db.contains(name))
        .map(|(index, name)| {
            Member::new(name, BoolOp::Union).with_matrix(ctx.rot(index).to_row_major())
        })
        .collect();

    let nurbs = ctx.nurbs_object();
    if members.len() <= 1 && nurbs.is_none() {
        return Ok(false);
    }
    if let Some(name) = nurbs {
        members.push(Member::new(name, BoolOp::Union));
    }
    info!("Grouping {} objects under {}", members.len(), TOP_GROUP);
    db.write_combination(TOP_GROUP, Combination::group(members))?;
    Ok(true)
}
