// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit scale extraction from the Global section

use iges_model::GlobalSection;
use log::warn;

/// Millimetres per unit for a units flag, `None` when unknown
pub fn unit_flag_to_mm(flag: i64) -> Option<f64> {
    match flag {
        1 => Some(25.4),
        2 => Some(1.0),
        4 => Some(304.8),
        5 => Some(1_609_344.0),
        6 => Some(1000.0),
        7 => Some(1_000_000.0),
        8 => Some(0.0254),
        9 => Some(0.001),
        10 => Some(10.0),
        11 => Some(0.000_025_4),
        _ => None,
    }
}

/// Millimetres per unit for a units name (flag 3)
pub fn unit_name_to_mm(name: &str) -> Option<f64> {
    let name = name.trim().to_ascii_uppercase();
    match name.as_str() {
        "IN" | "INCH" | "INCHES" => Some(25.4),
        "MM" | "MILLIMETER" | "MILLIMETRE" => Some(1.0),
        "FT" | "FOOT" | "FEET" => Some(304.8),
        "MI" | "MILE" | "MILES" => Some(1_609_344.0),
        "M" | "METER" | "METRE" => Some(1000.0),
        "KM" | "KILOMETER" | "KILOMETRE" => Some(1_000_000.0),
        "MIL" | "MILS" => Some(0.0254),
        "UM" | "MICRON" | "MICRONS" => Some(0.001),
        "CM" | "CENTIMETER" | "CENTIMETRE" => Some(10.0),
        "UIN" | "MICROINCH" => Some(0.000_025_4),
        _ => None,
    }
}

/// Factor converting model-space values to millimetres
///
/// Combines the units flag (or name) with the model space scale. Unknown
/// units fall back to millimetres; a non-positive scale is treated as 1.
pub fn extract_unit_scale(global: &GlobalSection) -> f64 {
    let unit = if global.units_flag == 3 {
        global.units_name.as_deref().and_then(unit_name_to_mm)
    } else {
        unit_flag_to_mm(global.units_flag)
    };
    let unit = unit.unwrap_or_else(|| {
        warn!(
            "Unrecognized units (flag {}, name {:?}), assuming millimetres",
            global.units_flag, global.units_name
        );
        1.0
    });

    let scale = if global.model_scale > 0.0 {
        global.model_scale
    } else {
        warn!("Model space scale {} ignored", global.model_scale);
        1.0
    };

    unit / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn global(flag: i64, name: Option<&str>, scale: f64) -> GlobalSection {
        GlobalSection {
            units_flag: flag,
            units_name: name.map(str::to_string),
            model_scale: scale,
            ..Default::default()
        }
    }

    #[test]
    fn test_inches() {
        assert_relative_eq!(extract_unit_scale(&global(1, None, 1.0)), 25.4);
    }

    #[test]
    fn test_named_units() {
        assert_relative_eq!(extract_unit_scale(&global(3, Some("CM"), 1.0)), 10.0);
        assert_relative_eq!(extract_unit_scale(&global(3, Some("bogus"), 1.0)), 1.0);
    }

    #[test]
    fn test_model_scale_divides() {
        assert_relative_eq!(extract_unit_scale(&global(6, None, 2.0)), 500.0);
        assert_relative_eq!(extract_unit_scale(&global(2, None, 0.0)), 1.0);
    }

    #[test]
    fn test_unknown_flag() {
        assert_relative_eq!(extract_unit_scale(&global(42, None, 1.0)), 1.0);
    }
}
