// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-width record splitting
//!
//! IGES files are sequences of 80-column records. Column 73 holds the
//! section code (`S`, `G`, `D`, `P`, `T`) and columns 74-80 the sequence
//! number. Files may or may not terminate records with a newline.

use iges_model::{ParseError, Result};
use memchr::memchr_iter;

/// Record length of a file without line terminators
pub const CARD_LEN: usize = 80;

/// Number of records inspected when measuring the record length
pub const NRECS: usize = 20;

/// Bytes searched for a first newline before assuming bare 80-column cards
const PROBE_LEN: usize = 256;

/// Column (0-based) of the section code
const SECTION_COL: usize = 72;

/// IGES file section
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Start,
    Global,
    Directory,
    Parameter,
    Terminate,
}

impl Section {
    fn from_code(code: u8) -> Option<Self> {
        match code {
            b'S' => Some(Section::Start),
            b'G' => Some(Section::Global),
            b'D' => Some(Section::Directory),
            b'P' => Some(Section::Parameter),
            b'T' => Some(Section::Terminate),
            _ => None,
        }
    }
}

/// One physical record, terminator stripped
#[derive(Clone, Debug, PartialEq)]
pub struct Record<'a> {
    pub section: Section,
    /// Columns 1-72
    pub text: &'a str,
    /// Position of the record in the file, 1-based
    pub number: usize,
}

impl<'a> Record<'a> {
    /// Parameter data field, columns 1-64
    pub fn parameter_data(&self) -> &'a str {
        self.text.get(..64).unwrap_or(self.text)
    }

    /// Back-pointer to the owning directory entry, columns 66-72
    pub fn parameter_owner(&self) -> u32 {
        self.text
            .get(64..72)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Records grouped by section, in file order
#[derive(Clone, Debug, Default)]
pub struct Sections<'a> {
    pub start: Vec<Record<'a>>,
    pub global: Vec<Record<'a>>,
    pub directory: Vec<Record<'a>>,
    pub parameter: Vec<Record<'a>>,
    pub terminate: Vec<Record<'a>>,
}

/// Determine the record length of the file, terminator included
///
/// Without a newline in the first 256 bytes the file is taken to be bare
/// 80-column cards. Otherwise up to [`NRECS`] non-blank records are
/// measured; the first record may differ but all later ones must agree.
pub fn record_size(bytes: &[u8]) -> Result<usize> {
    let probe = &bytes[..bytes.len().min(PROBE_LEN)];
    if !probe.contains(&b'\n') {
        return Ok(CARD_LEN);
    }

    let mut lengths = Vec::with_capacity(NRECS);
    let mut prev = 0usize;
    for pos in memchr_iter(b'\n', bytes) {
        let line = &bytes[prev..pos];
        prev = pos + 1;
        // blank lines carry no record and are skipped when splitting too
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        lengths.push(line.len() + 1);
        if lengths.len() == NRECS {
            break;
        }
    }

    match lengths.as_slice() {
        [] => Ok(CARD_LEN),
        [only] => Ok(*only),
        [_, first, rest @ ..] => {
            if let Some(bad) = rest.iter().find(|len| *len != first) {
                return Err(ParseError::RecordLength(format!(
                    "records of {} and {} bytes in the same file",
                    first, bad
                )));
            }
            Ok(*first)
        }
    }
}

/// Split file content into section records
pub fn split_sections(content: &str) -> Result<Sections<'_>> {
    let size = record_size(content.as_bytes())?;
    let lines: Vec<&str> = if content.contains('\n') {
        content.lines().collect()
    } else {
        let mut chunks = Vec::with_capacity(content.len() / size + 1);
        let mut rest = content;
        while !rest.is_empty() {
            let cut = rest.len().min(size);
            if !rest.is_char_boundary(cut) {
                return Err(ParseError::record(chunks.len() + 1, "non-ASCII data"));
            }
            let (chunk, tail) = rest.split_at(cut);
            chunks.push(chunk);
            rest = tail;
        }
        chunks
    };

    let mut sections = Sections::default();
    for (i, line) in lines.iter().enumerate() {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let number = i + 1;
        let code = line
            .as_bytes()
            .get(SECTION_COL)
            .copied()
            .ok_or_else(|| ParseError::record(number, "record ends before column 73"))?;
        let section = Section::from_code(code).ok_or_else(|| {
            ParseError::record(number, format!("unknown section code '{}'", code as char))
        })?;
        let text = line
            .get(..SECTION_COL)
            .ok_or_else(|| ParseError::record(number, "non-ASCII data"))?;
        let record = Record {
            section,
            text,
            number,
        };
        match section {
            Section::Start => sections.start.push(record),
            Section::Global => sections.global.push(record),
            Section::Directory => sections.directory.push(record),
            Section::Parameter => sections.parameter.push(record),
            Section::Terminate => sections.terminate.push(record),
        }
    }
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(text: &str, code: char, seq: usize) -> String {
        format!("{:<72}{}{:07}", text, code, seq)
    }

    #[test]
    fn test_record_size_without_newlines() {
        let content = card("start", 'S', 1) + &card("global", 'G', 1);
        assert_eq!(record_size(content.as_bytes()).unwrap(), 80);
    }

    #[test]
    fn test_record_size_with_newlines() {
        let content = format!(
            "{}\n{}\n{}\n",
            card("a", 'S', 1),
            card("b", 'G', 1),
            card("c", 'D', 1)
        );
        assert_eq!(record_size(content.as_bytes()).unwrap(), 81);
    }

    #[test]
    fn test_record_size_crlf() {
        let content = format!("{}\r\n{}\r\n", card("a", 'S', 1), card("b", 'G', 1));
        assert_eq!(record_size(content.as_bytes()).unwrap(), 82);
    }

    #[test]
    fn test_record_size_first_record_may_differ() {
        let content = format!(
            "short\n{}\n{}\n",
            card("b", 'G', 1),
            card("c", 'D', 1)
        );
        assert_eq!(record_size(content.as_bytes()).unwrap(), 81);
    }

    #[test]
    fn test_record_size_ignores_blank_lines() {
        let content = format!(
            "{}\n{}\n{}\n\n",
            card("a", 'S', 1),
            card("b", 'G', 1),
            card("c", 'D', 1)
        );
        assert_eq!(record_size(content.as_bytes()).unwrap(), 81);

        let crlf = format!(
            "{}\r\n{}\r\n{}\r\n\r\n",
            card("a", 'S', 1),
            card("b", 'G', 1),
            card("c", 'D', 1)
        );
        assert_eq!(record_size(crlf.as_bytes()).unwrap(), 82);
        assert_eq!(split_sections(&crlf).unwrap().directory.len(), 1);
    }

    #[test]
    fn test_record_size_mismatch_is_fatal() {
        let content = format!(
            "{}\n{}\n{}x\n",
            card("a", 'S', 1),
            card("b", 'G', 1),
            card("c", 'D', 1)
        );
        let err = record_size(content.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::RecordLength(_)));
        assert!(err.is_structural());
    }

    #[test]
    fn test_split_sections() {
        let content = format!(
            "{}\n{}\n{}\n",
            card("hello", 'S', 1),
            card(",,;", 'G', 1),
            card("", 'T', 1)
        );
        let sections = split_sections(&content).unwrap();
        assert_eq!(sections.start.len(), 1);
        assert_eq!(sections.global[0].text.trim_end(), ",,;");
        assert_eq!(sections.terminate.len(), 1);
    }

    #[test]
    fn test_split_fixed_cards() {
        let content = card("hello", 'S', 1) + &card(",,;", 'G', 1);
        let sections = split_sections(&content).unwrap();
        assert_eq!(sections.start.len(), 1);
        assert_eq!(sections.global.len(), 1);
    }

    #[test]
    fn test_unknown_section_code() {
        let content = format!("{}\n", card("x", 'Q', 1));
        assert!(split_sections(&content).unwrap_err().is_structural());
    }

    #[test]
    fn test_short_record() {
        let content = format!("{}\nshort\n", card("x", 'S', 1));
        match split_sections(&content) {
            Err(ParseError::InvalidRecord { record, .. }) => assert_eq!(record, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parameter_owner() {
        let text = format!("{:<64}{:>8}", "110,0.,0.,0.,1.,0.,0.;", 7);
        let content = format!("{}\n", format!("{}P{:07}", text, 1));
        let sections = split_sections(&content).unwrap();
        let rec = &sections.parameter[0];
        assert_eq!(rec.parameter_owner(), 7);
        assert!(rec.parameter_data().starts_with("110,"));
    }
}
