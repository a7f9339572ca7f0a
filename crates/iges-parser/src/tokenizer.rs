// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Free-format parameter tokenizer using nom combinators
//!
//! Turns Global or Parameter section text into [`Parameter`] fields. The
//! field and record delimiters come from the Global section, so every
//! parser here is parameterized by [`Delimiters`].

use iges_model::Parameter;
use nom::{
    branch::alt,
    bytes::complete::{take, take_till},
    character::complete::{digit1, one_of, space0},
    combinator::map_res,
    error::{Error, ErrorKind},
    IResult, Parser,
};

/// Field and record delimiters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delimiters {
    pub field: char,
    pub record: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: ',',
            record: ';',
        }
    }
}

// ============================================================================
// Parsing Primitives
// ============================================================================

/// Parse a Hollerith string (`5Hhello`)
fn hollerith(input: &str) -> IResult<&str, Parameter> {
    let (input, _) = space0(input)?;
    let (input, count) = map_res(digit1, |s: &str| s.parse::<usize>()).parse(input)?;
    let (input, _) = one_of("Hh").parse(input)?;
    let (input, text) = take(count).parse(input)?;
    let (input, _) = space0(input)?;
    Ok((input, Parameter::String(text.to_string())))
}

/// Interpret the raw text of a non-string field
///
/// Blanks anywhere in the field are ignored and `D` exponents are accepted.
fn classify(raw: &str) -> Option<Parameter> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Some(Parameter::Default);
    }

    let bytes = compact.as_bytes();
    let integral = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| b.is_ascii_digit() || (i == 0 && (*b == b'+' || *b == b'-')));
    if integral {
        if let Ok(v) = lexical_core::parse::<i64>(bytes) {
            return Some(Parameter::Integer(v));
        }
    }

    let normalized = compact.replace(['D', 'd'], "E");
    lexical_core::parse::<f64>(normalized.as_bytes())
        .ok()
        .or_else(|| normalized.parse::<f64>().ok())
        .map(Parameter::Real)
}

/// Parse a number or an empty field up to the next delimiter
fn plain_field(input: &str, delims: Delimiters) -> IResult<&str, Parameter> {
    let (rest, raw) =
        take_till(|c: char| c == delims.field || c == delims.record).parse(input)?;
    match classify(raw) {
        Some(value) => Ok((rest, value)),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::Float))),
    }
}

/// Parse any field
fn field<'a>(input: &'a str, delims: Delimiters) -> IResult<&'a str, Parameter> {
    alt((hollerith, |i: &'a str| plain_field(i, delims))).parse(input)
}

fn snippet(input: &str) -> &str {
    let end = input
        .char_indices()
        .nth(20)
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    &input[..end]
}

// ============================================================================
// Field Lists
// ============================================================================

/// Tokenize fields up to the record delimiter
///
/// Text after the record delimiter is ignored. Running out of input ends
/// the list as if the record delimiter had been seen.
pub fn parse_parameters(input: &str, delims: Delimiters) -> Result<Vec<Parameter>, String> {
    let mut fields = Vec::new();
    let mut rest = input;
    loop {
        let (after, value) = field(rest, delims)
            .map_err(|_| format!("unreadable field near '{}'", snippet(rest)))?;
        fields.push(value);

        let mut chars = after.chars();
        match chars.next() {
            Some(c) if c == delims.field => rest = chars.as_str(),
            Some(c) if c == delims.record => break,
            None => break,
            Some(c) => {
                return Err(format!(
                    "expected delimiter after field {}, found '{}'",
                    fields.len(),
                    c
                ))
            }
        }
    }
    Ok(fields)
}
