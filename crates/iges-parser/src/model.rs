// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IgesFile - a loaded IGES file ready for conversion

use crate::decoder::ParameterDecoder;
use crate::directory::load_directory;
use crate::global::parse_global;
use crate::matrix::evaluate_transforms;
use crate::names::assign_names;
use crate::records::split_sections;
use crate::units::extract_unit_scale;

use iges_model::{
    DeNumber, DecodedEntity, DirectoryEntry, DirectoryTable, GlobalSection, ParameterRecord,
    ParameterSource, ParseError, Result,
};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

/// A parsed IGES file
///
/// Holds the Global section, the directory table annotated with evaluated
/// placements and unique names, and a lazy decoder over the Parameter
/// section.
pub struct IgesFile {
    global: GlobalSection,
    start: String,
    directory: DirectoryTable,
    decoder: ParameterDecoder,
    unit_factor: f64,
}

impl IgesFile {
    /// Parse IGES content
    ///
    /// Fails only on structural problems (record layout, Global or
    /// Directory section). Problems with individual entities surface later,
    /// when their parameters are decoded.
    pub fn parse(content: &str) -> Result<Self> {
        let sections = split_sections(content)?;
        if sections.global.is_empty() {
            return Err(ParseError::InvalidGlobal("file has no Global section".into()));
        }
        if sections.terminate.is_empty() {
            debug!("File has no Terminate section");
        }

        let start = sections
            .start
            .iter()
            .map(|r| r.text.trim_end())
            .collect::<Vec<_>>()
            .join("\n");

        let global_text: String = sections.global.iter().map(|r| r.text).collect();
        let (global, delimiters) = parse_global(&global_text)?;
        let unit_factor = extract_unit_scale(&global);

        let mut directory = load_directory(&sections.directory)?;
        let decoder = ParameterDecoder::new(&sections.parameter, delimiters);

        evaluate_transforms(&mut directory, &decoder, unit_factor);
        assign_names(&mut directory, &decoder);

        info!(
            "Loaded {} directory entries, {} parameter records, {} mm per model unit",
            directory.len(),
            decoder.line_count(),
            unit_factor
        );

        Ok(Self {
            global,
            start,
            directory,
            decoder,
            unit_factor,
        })
    }

    /// Read and parse a file from disk
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected;
    /// they can only appear inside strings.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let content = String::from_utf8_lossy(&bytes);
        Self::parse(&content)
    }

    /// Global section
    pub fn global(&self) -> &GlobalSection {
        &self.global
    }

    /// Start section text, one line per record
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Directory table
    pub fn directory(&self) -> &DirectoryTable {
        &self.directory
    }

    /// Parameter source
    pub fn source(&self) -> &dyn ParameterSource {
        &self.decoder
    }

    /// Millimetres per model-space unit
    pub fn unit_factor(&self) -> f64 {
        self.unit_factor
    }

    /// Number of directory entries
    pub fn entity_count(&self) -> usize {
        self.directory.len()
    }

    /// Decode the entity at a DE number
    pub fn decode(&self, de: DeNumber) -> Result<DecodedEntity> {
        let entry = self.entry(de)?;
        self.decoder.decode(de, entry)
    }

    /// Raw parameter record of the entity at a DE number
    pub fn parameters(&self, de: DeNumber) -> Result<Arc<ParameterRecord>> {
        let entry = self.entry(de)?;
        self.decoder.parameters(de, entry)
    }

    /// Take the file apart for a conversion session
    pub fn into_parts(self) -> (GlobalSection, DirectoryTable, ParameterDecoder, f64) {
        (self.global, self.directory, self.decoder, self.unit_factor)
    }

    fn entry(&self, de: DeNumber) -> Result<&DirectoryEntry> {
        self.directory
            .get(de)
            .ok_or_else(|| ParseError::other(format!("{} is not in the directory", de)))
    }
}

impl std::fmt::Debug for IgesFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgesFile")
            .field("entities", &self.directory.len())
            .field("unit_factor", &self.unit_factor)
            .field("cached_records", &self.decoder.cache_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{EntitySpec, IgesBuilder};
    use approx::assert_relative_eq;
    use iges_model::{Entity, EntityType};
    use nalgebra::Point3;

    #[test]
    fn test_parse_built_file() {
        let mut builder = IgesBuilder::new();
        let tor = builder.entity(160, 0, "10.,2.,0.,0.,0.,0.,0.,1.");
        let file = IgesFile::parse(&builder.build()).unwrap();
        assert_eq!(file.entity_count(), 1);
        assert_eq!(file.global().units_name.as_deref(), Some("MM"));
        assert_eq!(file.unit_factor(), 1.0);
        assert!(file.start().starts_with("IGES file"));
        match file.decode(tor).unwrap().entity {
            Entity::Torus(t) => {
                assert_eq!(t.r1, 10.0);
                assert_eq!(t.r2, 2.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            file.directory().get(tor).unwrap().name.as_deref(),
            Some("tor.1")
        );
    }

    #[test]
    fn test_inch_file_scales_matrices() {
        let mut builder = IgesBuilder::new().with_units(1, "IN");
        let m = builder.entity(124, 0, "1.,0.,0.,1.,0.,1.,0.,0.,0.,0.,1.,0.");
        builder.add(EntitySpec::new(158, 0, "1.,0.,0.,0.").with_trans(m));
        let file = IgesFile::parse(&builder.build()).unwrap();
        assert_relative_eq!(file.unit_factor(), 25.4);
        let entry = file.directory().get(DeNumber(3)).unwrap();
        let p = entry.rot.apply_point(&Point3::origin());
        assert_relative_eq!(p.x, 25.4);
    }

    #[test]
    fn test_name_property_wins() {
        let mut builder = IgesBuilder::new();
        let prop = builder.next_de();
        builder.entity(406, 15, "1,8HMY_TORUS");
        builder.add(
            EntitySpec::new(160, 0, format!("10.,2.,0.,0.,0.,0.,0.,1.,0,1,{}", prop.0))
                .with_label("IGNORED", 0),
        );
        let file = IgesFile::parse(&builder.build()).unwrap();
        let tor = file.directory().get(DeNumber(3)).unwrap();
        assert_eq!(tor.entity_type, EntityType::Torus);
        assert_eq!(tor.name.as_deref(), Some("MY_TORUS"));
    }

    #[test]
    fn test_global_section_json() {
        let mut builder = IgesBuilder::new().with_units(1, "IN");
        builder.entity(158, 0, "1.");
        let file = IgesFile::parse(&builder.build()).unwrap();
        let json = serde_json::to_value(file.global()).unwrap();
        assert_eq!(json["file_name"], "test.igs");
        assert_eq!(json["units_flag"], 1);
        assert_eq!(json["units_name"], "IN");
    }

    #[test]
    fn test_missing_global_is_structural() {
        let content = format!("{:<72}S{:07}\n", "start only", 1);
        let err = IgesFile::parse(&content).unwrap_err();
        assert!(err.is_structural());
    }
}
