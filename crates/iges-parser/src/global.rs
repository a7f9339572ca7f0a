// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Global section parsing
//!
//! The first two Global fields define the delimiters used everywhere else
//! in the file, so they are read before the general tokenizer can run.

use crate::tokenizer::{parse_parameters, Delimiters};
use iges_model::{GlobalSection, Parameter, ParseError, Result};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{char, space0},
    IResult, Parser,
};

/// `1H<c>` delimiter definition
fn delimiter_definition(input: &str) -> IResult<&str, char> {
    let (input, _) = space0(input)?;
    let (input, _) = tag("1H").parse(input)?;
    let (input, c) = take(1usize).parse(input)?;
    Ok((input, c.chars().next().unwrap_or(',')))
}

/// Read the delimiter prefix, returning the delimiters and the remaining text
///
/// Accepted forms: `,,` (defaults), `1H<c>` for the field delimiter and a
/// second `1H<c>` for the record delimiter, each followed by the field
/// delimiter.
fn read_delimiters(text: &str) -> Result<(Delimiters, &str)> {
    let defaults = Delimiters::default();
    let invalid = |what: &str| {
        ParseError::InvalidGlobal(format!(
            "unrecognized {} delimiter definition near '{}'",
            what,
            text.chars().take(12).collect::<String>()
        ))
    };

    let (rest, field) = match char::<&str, nom::error::Error<&str>>(defaults.field).parse(text) {
        Ok((rest, _)) => (rest, defaults.field),
        Err(_) => {
            let (rest, c) = delimiter_definition(text).map_err(|_| invalid("field"))?;
            let (rest, _) = char::<&str, nom::error::Error<&str>>(c)
                .parse(rest)
                .map_err(|_| invalid("field"))?;
            (rest, c)
        }
    };

    let (rest, record) = match char::<&str, nom::error::Error<&str>>(field).parse(rest) {
        Ok((rest, _)) => (rest, defaults.record),
        Err(_) => {
            let (rest, r) = delimiter_definition(rest).map_err(|_| invalid("record"))?;
            let rest = match rest.strip_prefix(field) {
                Some(after) => after,
                None if rest.starts_with(r) => "",
                None => return Err(invalid("record")),
            };
            (rest, r)
        }
    };

    Ok((Delimiters { field, record }, rest))
}

fn string_at(fields: &[Parameter], i: usize) -> Option<String> {
    fields
        .get(i)
        .and_then(Parameter::as_str)
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
}

/// Parse the concatenated columns 1-72 of the Global section
pub fn parse_global(text: &str) -> Result<(GlobalSection, Delimiters)> {
    let (delims, rest) = read_delimiters(text)?;
    // fields[0] is Global field 3
    let fields = parse_parameters(rest, delims).map_err(ParseError::InvalidGlobal)?;
    let field = |n: usize| fields.get(n - 3);

    let model_scale = field(13).and_then(Parameter::as_f64).unwrap_or(1.0);
    let global = GlobalSection {
        field_delimiter: delims.field,
        record_delimiter: delims.record,
        sending_system: string_at(&fields, 0),
        file_name: string_at(&fields, 1),
        native_system: string_at(&fields, 2),
        preprocessor_version: string_at(&fields, 3),
        model_scale,
        units_flag: field(14).and_then(Parameter::as_i64).unwrap_or(1),
        units_name: string_at(&fields, 12),
        date: string_at(&fields, 15),
        min_resolution: field(19).and_then(Parameter::as_f64),
        author: string_at(&fields, 18),
        organization: string_at(&fields, 19),
        iges_version: field(23).and_then(Parameter::as_i64),
    };
    Ok((global, delims))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOBAL: &str = ",,4Htest,8Htest.igs,7Higes-rs,3H1.0,32,38,6,308,15,4Htest,1.0,2,\
                          2HMM,1,1.0,15H20240101.000000,0.001,1000.0,6Hauthor,3Horg,11,0,\
                          15H20240101.000000;";

    #[test]
    fn test_default_delimiters() {
        let (global, delims) = parse_global(GLOBAL).unwrap();
        assert_eq!(delims, Delimiters::default());
        assert_eq!(global.sending_system.as_deref(), Some("test"));
        assert_eq!(global.file_name.as_deref(), Some("test.igs"));
        assert_eq!(global.units_flag, 2);
        assert_eq!(global.units_name.as_deref(), Some("MM"));
        assert_eq!(global.model_scale, 1.0);
        assert_eq!(global.min_resolution, Some(0.001));
        assert_eq!(global.author.as_deref(), Some("author"));
        assert_eq!(global.iges_version, Some(11));
    }

    #[test]
    fn test_explicit_delimiters() {
        let text = "1H//1H#/4Htest/8Htest.igs#";
        let (global, delims) = parse_global(text).unwrap();
        assert_eq!(delims.field, '/');
        assert_eq!(delims.record, '#');
        assert_eq!(global.file_name.as_deref(), Some("test.igs"));
    }

    #[test]
    fn test_explicit_field_default_record() {
        let text = "1H///4Htest;";
        let (_, delims) = parse_global(text).unwrap();
        assert_eq!(delims.field, '/');
        assert_eq!(delims.record, ';');
    }

    #[test]
    fn test_bad_prefix_is_fatal() {
        let err = parse_global("xx,4Htest;").unwrap_err();
        assert!(matches!(err, ParseError::InvalidGlobal(_)));
        assert!(err.is_structural());
    }
}
