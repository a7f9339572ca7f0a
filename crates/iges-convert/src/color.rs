// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color resolution for trees, assemblies and instances

use crate::{ConversionContext, ConvertError, Result};
use iges_model::{DeNumber, Entity, EntityType};
use log::{debug, error};

/// Colors for palette numbers 0 through 8
pub const PALETTE: [[u8; 3]; 9] = [
    [217, 217, 217], // no color
    [0, 0, 0],       // black
    [255, 0, 0],     // red
    [0, 255, 0],     // green
    [0, 0, 255],     // blue
    [255, 255, 0],   // yellow
    [255, 0, 255],   // magenta
    [0, 255, 255],   // cyan
    [255, 255, 255], // white
];

/// Palette color, `None` outside 0..=8
pub fn palette_rgb(index: i32) -> Option<[u8; 3]> {
    usize::try_from(index).ok().and_then(|i| PALETTE.get(i)).copied()
}

/// Scale a 0-100 percentage to 0-255, rounding by truncating `2.55 c + 0.5`
pub fn percent_to_rgb(percent: [f64; 3]) -> [u8; 3] {
    percent.map(|c| (2.55 * c + 0.5) as u8)
}

fn takes_color(entity_type: EntityType) -> bool {
    matches!(
        entity_type,
        EntityType::BooleanTree | EntityType::SolidAssembly | EntityType::SolidInstance
    )
}

/// Color of a color definition entity (314)
fn color_definition(ctx: &ConversionContext, de: DeNumber) -> Result<[u8; 3]> {
    let index = ctx.lookup(de)?;
    let entry = ctx.entry(index)?;
    if entry.entity_type != EntityType::ColorDefinition {
        return Err(ConvertError::invalid(
            de,
            format!("color pointer leads to {}", entry.entity_type),
        ));
    }
    match ctx.decode(index)?.entity {
        Entity::ColorDefinition(color) => Ok(percent_to_rgb(color.percent)),
        _ => Err(ConvertError::invalid(de, "unreadable color definition")),
    }
}

/// Resolve `rgb` for every boolean tree, assembly and instance
///
/// Returns the number of entities that received a color. Entries whose
/// color cannot be resolved keep their previous value.
pub fn docolor(ctx: &mut ConversionContext) -> usize {
    let mut colored = 0;
    for index in 0..ctx.len() {
        let Ok(entry) = ctx.entry(index) else {
            continue;
        };
        if !takes_color(entry.entity_type) || entry.colorp == 0 {
            continue;
        }
        let colorp = entry.colorp;
        let rgb = if colorp > 0 {
            match palette_rgb(colorp) {
                Some(rgb) => rgb,
                None => {
                    error!(
                        "{}: color number {} outside the palette",
                        DeNumber::from_index(index),
                        colorp
                    );
                    continue;
                }
            }
        } else {
            let target = DeNumber::from_pointer(-(colorp as i64));
            match target.ok_or_else(|| {
                ConvertError::reference(DeNumber::from_index(index), "bad color pointer")
            })
            .and_then(|de| color_definition(ctx, de))
            {
                Ok(rgb) => rgb,
                Err(e) => {
                    error!("{}: {}", DeNumber::from_index(index), e);
                    continue;
                }
            }
        };
        if let Ok(entry) = ctx.entry_mut(index) {
            debug!("{} colored {:?}", DeNumber::from_index(index), rgb);
            entry.rgb = Some(rgb);
            colored += 1;
        }
    }
    colored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;
    use iges_parser::{EntitySpec, IgesBuilder};

    #[test]
    fn test_palette() {
        assert_eq!(palette_rgb(0), Some([217, 217, 217]));
        assert_eq!(palette_rgb(2), Some([255, 0, 0]));
        assert_eq!(palette_rgb(9), None);
        assert_eq!(palette_rgb(-1), None);
    }

    #[test]
    fn test_percent_truncation() {
        assert_eq!(percent_to_rgb([0.0, 0.0, 100.0]), [0, 0, 255]);
        assert_eq!(percent_to_rgb([40.0, 0.2, 99.9]), [102, 1, 255]);
    }

    #[test]
    fn test_docolor() {
        let mut builder = IgesBuilder::new();
        let blue = builder.entity(314, 0, "0.,0.,100.");
        let sph = builder.entity(158, 0, "1.");
        let red_tree = builder.add(
            EntitySpec::new(180, 0, format!("1,-{}", sph.0)).with_color(2),
        );
        let blue_tree = builder.add(
            EntitySpec::new(180, 0, format!("1,-{}", sph.0)).with_color(-(blue.0 as i32)),
        );
        let bad_tree = builder.add(
            EntitySpec::new(180, 0, format!("1,-{}", sph.0)).with_color(-(sph.0 as i32)),
        );
        let plain_sphere = builder.add(EntitySpec::new(158, 0, "2.").with_color(3));
        let mut ctx = context(&builder);

        assert_eq!(docolor(&mut ctx), 2);
        let rgb = |de| ctx.entry(ctx.lookup(de).unwrap()).unwrap().rgb;
        assert_eq!(rgb(red_tree), Some([255, 0, 0]));
        assert_eq!(rgb(blue_tree), Some([0, 0, 255]));
        assert_eq!(rgb(bad_tree), None);
        assert_eq!(rgb(plain_sphere), None);
    }
}
