// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for IGES data representation
//!
//! Directory-entry numbers, entity type numbers, parameter values and the
//! sequential cursor used by every entity decoder.

use crate::error::{ParseError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directory-entry sequence number
///
/// The odd sequence number of the first Directory section record of an
/// entity. Pointers inside parameter data use this number; the table index
/// is `(de - 1) / 2`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default, PartialOrd, Ord)]
pub struct DeNumber(pub u32);

impl DeNumber {
    /// Position of this entry in the directory table
    #[inline]
    pub fn index(self) -> usize {
        (self.0.saturating_sub(1) / 2) as usize
    }

    /// DE number of the entry stored at `index`
    #[inline]
    pub fn from_index(index: usize) -> Self {
        DeNumber((2 * index + 1) as u32)
    }

    /// Interpret a raw pointer value read from parameter data
    ///
    /// Only positive odd values address a directory entry.
    pub fn from_pointer(raw: i64) -> Option<Self> {
        if raw > 0 && raw % 2 == 1 && raw <= u32::MAX as i64 {
            Some(DeNumber(raw as u32))
        } else {
            None
        }
    }
}

impl fmt::Display for DeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DE {}", self.0)
    }
}

impl From<u32> for DeNumber {
    fn from(de: u32) -> Self {
        DeNumber(de)
    }
}

macro_rules! entity_types {
    ($($variant:ident = $number:literal, $label:literal;)*) => {
        /// IGES entity type number
        ///
        /// Types the converter understands get their own variant; everything
        /// else is kept as `Other` with its raw number.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub enum EntityType {
            $($variant,)*
            Other(u16),
        }

        impl EntityType {
            /// Map a raw type number to the enum
            pub fn from_number(number: u16) -> Self {
                match number {
                    $($number => EntityType::$variant,)*
                    n => EntityType::Other(n),
                }
            }

            /// Raw IGES type number
            pub fn number(self) -> u16 {
                match self {
                    $(EntityType::$variant => $number,)*
                    EntityType::Other(n) => n,
                }
            }

            /// Human readable name used in logs and summaries
            pub fn name(self) -> &'static str {
                match self {
                    $(EntityType::$variant => $label,)*
                    EntityType::Other(_) => "Unsupported entity",
                }
            }
        }
    };
}

entity_types! {
    CircularArc = 100, "Circular Arc";
    CompositeCurve = 102, "Composite Curve";
    ConicArc = 104, "Conic Arc";
    CopiousData = 106, "Copious Data";
    Plane = 108, "Plane";
    Line = 110, "Line";
    ParametricSpline = 112, "Parametric Spline Curve";
    TransformationMatrix = 124, "Transformation Matrix";
    RationalBSplineCurve = 126, "Rational B-Spline Curve";
    RationalBSplineSurface = 128, "Rational B-Spline Surface";
    Block = 150, "Block";
    RightAngularWedge = 152, "Right Angular Wedge";
    RightCircularCylinder = 154, "Right Circular Cylinder";
    RightCircularConeFrustum = 156, "Right Circular Cone Frustum";
    Sphere = 158, "Sphere";
    Torus = 160, "Torus";
    SolidOfRevolution = 162, "Solid of Revolution";
    SolidOfLinearExtrusion = 164, "Solid of Linear Extrusion";
    Ellipsoid = 168, "Ellipsoid";
    BooleanTree = 180, "Boolean Tree";
    SolidAssembly = 184, "Solid Assembly";
    ManifoldSolidBrep = 186, "Manifold Solid B-Rep Object";
    PlaneSurface = 190, "Plane Surface";
    ColorDefinition = 314, "Color Definition";
    AttributeTableDefinition = 322, "Attribute Table Definition";
    Property = 406, "Property";
    AttributeTableInstance = 422, "Attribute Table Instance";
    SolidInstance = 430, "Solid Instance";
    VertexList = 502, "Vertex List";
    EdgeList = 504, "Edge List";
    Loop = 508, "Loop";
    Face = 510, "Face";
    Shell = 514, "Shell";
}

impl EntityType {
    /// CSG-family entities: primitives, swept solids, trees and assemblies
    pub fn is_csg(self) -> bool {
        (150..=184).contains(&self.number())
    }

    /// Entities the curve extractor can evaluate
    pub fn is_curve(self) -> bool {
        matches!(
            self,
            EntityType::CircularArc
                | EntityType::CompositeCurve
                | EntityType::ConicArc
                | EntityType::CopiousData
                | EntityType::Line
                | EntityType::ParametricSpline
                | EntityType::RationalBSplineCurve
        )
    }

    /// Primitive solids converted by the solid pass
    pub fn is_solid_primitive(self) -> bool {
        matches!(
            self,
            EntityType::Block
                | EntityType::RightAngularWedge
                | EntityType::RightCircularCylinder
                | EntityType::RightCircularConeFrustum
                | EntityType::Sphere
                | EntityType::Torus
                | EntityType::SolidOfRevolution
                | EntityType::SolidOfLinearExtrusion
                | EntityType::Ellipsoid
        )
    }
}

impl Default for EntityType {
    fn default() -> Self {
        EntityType::Other(0)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.number())
    }
}

/// One field of free-format parameter data
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Parameter {
    /// Empty field; the entity's default applies
    #[default]
    Default,
    /// Integer field (also used for pointers)
    Integer(i64),
    /// Real field, `D` exponents already normalized
    Real(f64),
    /// Hollerith string (`nH...`)
    String(String),
}

impl Parameter {
    /// Numeric value, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Parameter::Real(v) => Some(*v),
            Parameter::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer value, truncating reals
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Parameter::Integer(i) => Some(*i),
            Parameter::Real(v) => Some(v.trunc() as i64),
            _ => None,
        }
    }

    /// String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Parameter::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if the field was left empty
    pub fn is_default(&self) -> bool {
        matches!(self, Parameter::Default)
    }
}

/// Tokenized parameter data of one entity
///
/// Index 0 holds the entity type number, the entity's own fields follow.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterRecord {
    /// Owning directory entry
    pub de: DeNumber,
    /// All fields including the leading type number
    pub params: Vec<Parameter>,
}

impl ParameterRecord {
    /// Create a record
    pub fn new(de: DeNumber, params: Vec<Parameter>) -> Self {
        Self { de, params }
    }

    /// Type number found at the head of the data
    pub fn type_tag(&self) -> Option<i64> {
        self.params.first().and_then(Parameter::as_i64)
    }

    /// Get field at index
    pub fn get(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index)
    }

    /// Get float at index
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(Parameter::as_f64)
    }

    /// Get integer at index
    pub fn get_integer(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(Parameter::as_i64)
    }

    /// Get string at index
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Parameter::as_str)
    }

    /// Number of fields including the type number
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the record holds no fields
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Sequential reader positioned after the type number
    pub fn cursor(&self) -> ParamCursor<'_> {
        ParamCursor {
            record: self,
            pos: 1,
        }
    }
}

/// Sequential reader over a [`ParameterRecord`]
///
/// Every read advances by one field. Missing fields and fields of the wrong
/// kind produce [`ParseError::MissingParameter`] naming the field index.
#[derive(Clone, Debug)]
pub struct ParamCursor<'a> {
    record: &'a ParameterRecord,
    pos: usize,
}

impl<'a> ParamCursor<'a> {
    /// Entity being read
    pub fn de(&self) -> DeNumber {
        self.record.de
    }

    /// Index of the next field to be read
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Fields left to read
    pub fn remaining(&self) -> usize {
        self.record.params.len().saturating_sub(self.pos)
    }

    fn missing(&self, index: usize) -> ParseError {
        ParseError::MissingParameter {
            de: self.record.de,
            index,
        }
    }

    fn advance(&mut self) -> (usize, Option<&'a Parameter>) {
        let index = self.pos;
        self.pos = self.pos.saturating_add(1);
        (index, self.record.params.get(index))
    }

    /// Skip `n` fields
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    /// Required real value
    pub fn real(&mut self) -> Result<f64> {
        let (index, param) = self.advance();
        param
            .and_then(Parameter::as_f64)
            .ok_or_else(|| self.missing(index))
    }

    /// Real value with a default for empty or absent fields
    pub fn real_or(&mut self, default: f64) -> Result<f64> {
        let (index, param) = self.advance();
        match param {
            None | Some(Parameter::Default) => Ok(default),
            Some(p) => p.as_f64().ok_or_else(|| self.missing(index)),
        }
    }

    /// Required integer value
    pub fn int(&mut self) -> Result<i64> {
        let (index, param) = self.advance();
        param
            .and_then(Parameter::as_i64)
            .ok_or_else(|| self.missing(index))
    }

    /// Integer value with a default for empty or absent fields
    pub fn int_or(&mut self, default: i64) -> Result<i64> {
        let (index, param) = self.advance();
        match param {
            None | Some(Parameter::Default) => Ok(default),
            Some(p) => p.as_i64().ok_or_else(|| self.missing(index)),
        }
    }

    /// Non-negative count
    pub fn count(&mut self) -> Result<usize> {
        let index = self.pos;
        let n = self.int()?;
        usize::try_from(n).map_err(|_| self.missing(index))
    }

    /// Element count whose elements take at least `stride` fields each
    ///
    /// Counts that cannot fit in the remaining fields are rejected before
    /// anything is allocated for them.
    pub fn count_of(&mut self, stride: usize) -> Result<usize> {
        let n = self.count()?;
        let available = self.remaining();
        match n.checked_mul(stride) {
            Some(needed) if needed <= available => Ok(n),
            _ => Err(ParseError::entity_parse(
                self.record.de,
                format!(
                    "count {} exceeds the {} remaining parameters",
                    n, available
                ),
            )),
        }
    }

    /// Required directory pointer
    pub fn pointer(&mut self) -> Result<DeNumber> {
        let index = self.pos;
        let raw = self.int()?;
        DeNumber::from_pointer(raw).ok_or_else(|| self.missing(index))
    }

    /// Optional directory pointer, zero or empty meaning none
    pub fn pointer_opt(&mut self) -> Result<Option<DeNumber>> {
        let index = self.pos;
        match self.int_or(0)? {
            0 => Ok(None),
            raw => DeNumber::from_pointer(raw)
                .map(Some)
                .ok_or_else(|| self.missing(index)),
        }
    }

    /// Hollerith string; empty fields read as an empty string
    pub fn string(&mut self) -> Result<String> {
        let (index, param) = self.advance();
        match param {
            None | Some(Parameter::Default) => Ok(String::new()),
            Some(Parameter::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.missing(index)),
        }
    }

    /// Three required reals
    pub fn triple(&mut self) -> Result<[f64; 3]> {
        Ok([self.real()?, self.real()?, self.real()?])
    }

    /// Three reals with per-component defaults
    pub fn triple_or(&mut self, default: [f64; 3]) -> Result<[f64; 3]> {
        Ok([
            self.real_or(default[0])?,
            self.real_or(default[1])?,
            self.real_or(default[2])?,
        ])
    }

    /// `n` required reals
    pub fn reals(&mut self, n: usize) -> Result<Vec<f64>> {
        (0..n).map(|_| self.real()).collect()
    }

    /// Associativity and property pointer lists following the fixed fields
    ///
    /// Both lists are optional in the file; absent counts read as zero.
    pub fn trailing_pointers(&mut self) -> Result<(Vec<DeNumber>, Vec<DeNumber>)> {
        let mut lists = [Vec::new(), Vec::new()];
        for list in lists.iter_mut() {
            if self.remaining() == 0 {
                break;
            }
            let n = self.int_or(0)?.max(0) as usize;
            for _ in 0..n.min(self.remaining()) {
                if let Some(de) = self.pointer_opt()? {
                    list.push(de);
                }
            }
        }
        let [associativities, properties] = lists;
        Ok((associativities, properties))
    }
}

/// Global section contents kept after loading
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalSection {
    /// Parameter (field) delimiter
    pub field_delimiter: char,
    /// Record delimiter
    pub record_delimiter: char,
    /// Product identification from the sender
    pub sending_system: Option<String>,
    /// File name
    pub file_name: Option<String>,
    /// Native system identification
    pub native_system: Option<String>,
    /// Preprocessor version
    pub preprocessor_version: Option<String>,
    /// Model space scale (model units per real-world unit)
    pub model_scale: f64,
    /// Units flag (1..=11)
    pub units_flag: i64,
    /// Units name, used when the flag is 3
    pub units_name: Option<String>,
    /// Date and time of file generation
    pub date: Option<String>,
    /// Minimum user-intended resolution
    pub min_resolution: Option<f64>,
    /// Author
    pub author: Option<String>,
    /// Organization
    pub organization: Option<String>,
    /// IGES version flag
    pub iges_version: Option<i64>,
}

impl Default for GlobalSection {
    fn default() -> Self {
        Self {
            field_delimiter: ',',
            record_delimiter: ';',
            sending_system: None,
            file_name: None,
            native_system: None,
            preprocessor_version: None,
            model_scale: 1.0,
            units_flag: 1,
            units_name: None,
            date: None,
            min_resolution: None,
            author: None,
            organization: None,
            iges_version: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(params: Vec<Parameter>) -> ParameterRecord {
        ParameterRecord::new(DeNumber(7), params)
    }

    #[test]
    fn test_de_number_index() {
        assert_eq!(DeNumber(1).index(), 0);
        assert_eq!(DeNumber(7).index(), 3);
        assert_eq!(DeNumber::from_index(3), DeNumber(7));
        assert_eq!(DeNumber(13).to_string(), "DE 13");
    }

    #[test]
    fn test_de_number_from_pointer() {
        assert_eq!(DeNumber::from_pointer(5), Some(DeNumber(5)));
        assert_eq!(DeNumber::from_pointer(0), None);
        assert_eq!(DeNumber::from_pointer(-5), None);
        assert_eq!(DeNumber::from_pointer(4), None);
    }

    #[test]
    fn test_entity_type_round_trip() {
        assert_eq!(EntityType::from_number(160), EntityType::Torus);
        assert_eq!(EntityType::Torus.number(), 160);
        assert_eq!(EntityType::from_number(999), EntityType::Other(999));
        assert_eq!(EntityType::Other(999).number(), 999);
    }

    #[test]
    fn test_entity_type_families() {
        assert!(EntityType::Block.is_csg());
        assert!(EntityType::SolidAssembly.is_csg());
        assert!(!EntityType::ManifoldSolidBrep.is_csg());
        assert!(EntityType::ConicArc.is_curve());
        assert!(!EntityType::Sphere.is_curve());
        assert!(!EntityType::BooleanTree.is_solid_primitive());
    }

    #[test]
    fn test_cursor_defaults() {
        let rec = record(vec![
            Parameter::Integer(154),
            Parameter::Real(2.0),
            Parameter::Default,
        ]);
        let mut cursor = rec.cursor();
        assert_eq!(cursor.real().unwrap(), 2.0);
        assert_eq!(cursor.real_or(3.0).unwrap(), 3.0);
        assert_eq!(cursor.real_or(4.0).unwrap(), 4.0);
        assert!(cursor.real().is_err());
    }

    #[test]
    fn test_cursor_missing_names_index() {
        let rec = record(vec![Parameter::Integer(158), Parameter::String("x".into())]);
        let mut cursor = rec.cursor();
        match cursor.real() {
            Err(ParseError::MissingParameter { de, index }) => {
                assert_eq!(de, DeNumber(7));
                assert_eq!(index, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cursor_integer_truncation() {
        let rec = record(vec![Parameter::Integer(180), Parameter::Real(3.9)]);
        let mut cursor = rec.cursor();
        assert_eq!(cursor.int().unwrap(), 3);
    }

    #[test]
    fn test_trailing_pointers() {
        let rec = record(vec![
            Parameter::Integer(430),
            Parameter::Integer(1),
            Parameter::Integer(0),
            Parameter::Integer(2),
            Parameter::Integer(9),
            Parameter::Integer(11),
        ]);
        let mut cursor = rec.cursor();
        assert_eq!(cursor.pointer().unwrap(), DeNumber(1));
        let (assoc, props) = cursor.trailing_pointers().unwrap();
        assert!(assoc.is_empty());
        assert_eq!(props, vec![DeNumber(9), DeNumber(11)]);
    }

    #[test]
    fn test_trailing_pointers_absent() {
        let rec = record(vec![Parameter::Integer(158), Parameter::Real(1.0)]);
        let mut cursor = rec.cursor();
        cursor.real().unwrap();
        let (assoc, props) = cursor.trailing_pointers().unwrap();
        assert!(assoc.is_empty() && props.is_empty());
    }

    #[test]
    fn test_count_of_rejects_oversized_counts() {
        let rec = record(vec![
            Parameter::Integer(106),
            Parameter::Integer(1_000_000_000_000),
            Parameter::Real(1.0),
            Parameter::Real(2.0),
        ]);
        let mut cursor = rec.cursor();
        match cursor.count_of(3) {
            Err(ParseError::EntityParse(de, msg)) => {
                assert_eq!(de, DeNumber(7));
                assert!(msg.contains("1000000000000"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let rec = record(vec![
            Parameter::Integer(102),
            Parameter::Integer(2),
            Parameter::Integer(1),
            Parameter::Integer(3),
        ]);
        assert_eq!(rec.cursor().count_of(1).unwrap(), 2);
        assert!(rec.cursor().count_of(2).is_err());
    }

    #[test]
    fn test_skip_saturates() {
        let rec = record(vec![Parameter::Integer(508), Parameter::Real(1.0)]);
        let mut cursor = rec.cursor();
        cursor.skip(usize::MAX);
        cursor.skip(2);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.real().is_err());
    }

    #[test]
    fn test_trailing_pointers_oversized_count() {
        let rec = record(vec![
            Parameter::Integer(158),
            Parameter::Real(1.0),
            Parameter::Integer(i64::MAX),
            Parameter::Integer(9),
        ]);
        let mut cursor = rec.cursor();
        cursor.real().unwrap();
        let (assoc, props) = cursor.trailing_pointers().unwrap();
        assert_eq!(assoc, vec![DeNumber(9)]);
        assert!(props.is_empty());
    }
}
