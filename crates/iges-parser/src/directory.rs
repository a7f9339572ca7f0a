// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Directory section loader
//!
//! Each entity occupies two records of nine 8-column fields.

use crate::records::Record;
use iges_model::{DirectoryEntry, DirectoryTable, EntityType, ParseError, Result};

const FIELD_WIDTH: usize = 8;

/// The nine 8-column fields of one record
fn fields<'a>(record: &Record<'a>) -> [&'a str; 9] {
    let mut out = [""; 9];
    for (i, slot) in out.iter_mut().enumerate() {
        let start = i * FIELD_WIDTH;
        *slot = record
            .text
            .get(start..start + FIELD_WIDTH)
            .or_else(|| record.text.get(start..))
            .unwrap_or("");
    }
    out
}

/// Numeric field; blank means zero
fn numeric(field: &str, record: &Record<'_>, column: usize) -> Result<i32> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(|_| {
        ParseError::InvalidDirectory(format!(
            "record {} field {}: '{}' is not a number",
            record.number, column, trimmed
        ))
    })
}

/// Build the directory table from the `D` records
pub fn load_directory(records: &[Record<'_>]) -> Result<DirectoryTable> {
    if records.len() % 2 != 0 {
        return Err(ParseError::InvalidDirectory(format!(
            "odd number of records ({})",
            records.len()
        )));
    }

    let mut entries = Vec::with_capacity(records.len() / 2);
    for pair in records.chunks_exact(2) {
        let (first, second) = (&pair[0], &pair[1]);
        let a = fields(first);
        let b = fields(second);

        let type_number = numeric(a[0], first, 1)?;
        let repeated = numeric(b[0], second, 11)?;
        if type_number != repeated {
            return Err(ParseError::InvalidDirectory(format!(
                "record {} repeats type {} as {}",
                second.number, type_number, repeated
            )));
        }
        let type_number = u16::try_from(type_number).map_err(|_| {
            ParseError::InvalidDirectory(format!(
                "record {}: entity type {} out of range",
                first.number, type_number
            ))
        })?;

        entries.push(DirectoryEntry {
            entity_type: EntityType::from_number(type_number),
            param: numeric(a[1], first, 2)?.max(0) as u32,
            structure: numeric(a[2], first, 3)?,
            line_font: numeric(a[3], first, 4)?,
            level: numeric(a[4], first, 5)?,
            view: numeric(a[5], first, 6)?,
            trans: numeric(a[6], first, 7)?,
            label_assoc: numeric(a[7], first, 8)?,
            status: a[8].trim().to_string(),
            colorp: numeric(b[2], second, 13)?,
            param_lines: numeric(b[3], second, 14)?.max(0) as u32,
            form: numeric(b[4], second, 15)?,
            label: b[7].trim().to_string(),
            subscript: numeric(b[8], second, 19)?,
            ..Default::default()
        });
    }

    Ok(DirectoryTable::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::split_sections;

    fn de_pair(fields1: [&str; 9], fields2: [&str; 9], seq: usize) -> String {
        let line1: String = fields1.iter().map(|f| format!("{:>8}", f)).collect();
        let line2: String = fields2.iter().map(|f| format!("{:>8}", f)).collect();
        format!("{}D{:07}\n{}D{:07}\n", line1, seq, line2, seq + 1)
    }

    #[test]
    fn test_load_entry() {
        let content = de_pair(
            ["160", "1", "", "", "", "", "3", "", "00000000"],
            ["160", "", "-5", "2", "0", "", "", "TORUS", "1"],
            1,
        );
        let sections = split_sections(&content).unwrap();
        let table = load_directory(&sections.directory).unwrap();
        assert_eq!(table.len(), 1);
        let e = table.entry(0).unwrap();
        assert_eq!(e.entity_type, EntityType::Torus);
        assert_eq!(e.param, 1);
        assert_eq!(e.trans, 3);
        assert_eq!(e.colorp, -5);
        assert_eq!(e.param_lines, 2);
        assert_eq!(e.label, "TORUS");
        assert_eq!(e.subscript, 1);
        assert_eq!(e.status, "00000000");
    }

    #[test]
    fn test_odd_record_count() {
        let mut content = de_pair(
            ["158", "1", "", "", "", "", "", "", ""],
            ["158", "", "", "1", "", "", "", "", ""],
            1,
        );
        content.push_str(&format!("{:<72}D{:07}\n", "     158", 3));
        let sections = split_sections(&content).unwrap();
        let err = load_directory(&sections.directory).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_non_numeric_field() {
        let content = de_pair(
            ["abc", "1", "", "", "", "", "", "", ""],
            ["158", "", "", "1", "", "", "", "", ""],
            1,
        );
        let sections = split_sections(&content).unwrap();
        assert!(matches!(
            load_directory(&sections.directory),
            Err(ParseError::InvalidDirectory(_))
        ));
    }
}
