// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-column IGES writer for building test inputs
//!
//! Produces complete files (Start, Global, Directory, Parameter and
//! Terminate sections) from entity parameter strings. Parameter data is
//! wrapped at 64 columns; numbers are never split across records while
//! Hollerith strings may be.

use iges_model::DeNumber;

/// Directory fields of one entity
#[derive(Clone, Debug, Default)]
pub struct EntitySpec {
    pub type_number: u16,
    pub form: i32,
    /// Parameter fields after the type number, without the record delimiter
    pub params: String,
    pub structure: i32,
    pub trans: i32,
    pub colorp: i32,
    pub label: String,
    pub subscript: i32,
}

impl EntitySpec {
    /// Entity with type, form and parameters; other fields zero
    pub fn new(type_number: u16, form: i32, params: impl Into<String>) -> Self {
        Self {
            type_number,
            form,
            params: params.into(),
            ..Default::default()
        }
    }

    /// Set the transformation matrix pointer
    pub fn with_trans(mut self, de: DeNumber) -> Self {
        self.trans = de.0 as i32;
        self
    }

    /// Set the color field
    pub fn with_color(mut self, colorp: i32) -> Self {
        self.colorp = colorp;
        self
    }

    /// Set the structure field
    pub fn with_structure(mut self, structure: i32) -> Self {
        self.structure = structure;
        self
    }

    /// Set label and subscript
    pub fn with_label(mut self, label: &str, subscript: i32) -> Self {
        self.label = label.to_string();
        self.subscript = subscript;
        self
    }
}

/// Builder for well-formed IGES text
#[derive(Clone, Debug)]
pub struct IgesBuilder {
    start: String,
    units_flag: i64,
    units_name: String,
    model_scale: f64,
    entities: Vec<EntitySpec>,
}

impl Default for IgesBuilder {
    fn default() -> Self {
        Self {
            start: "IGES file generated for conversion tests".to_string(),
            units_flag: 2,
            units_name: "MM".to_string(),
            model_scale: 1.0,
            entities: Vec::new(),
        }
    }
}

/// Positions at which a record may end: right after a delimiter or inside a
/// Hollerith string
fn break_points(s: &str) -> Vec<bool> {
    let bytes = s.as_bytes();
    let mut breakable = vec![false; bytes.len() + 1];
    breakable[bytes.len()] = true;
    let mut i = 0;
    while i < bytes.len() {
        let digits_end = i + bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
        if digits_end > i && bytes.get(digits_end) == Some(&b'H') {
            let count: usize = s[i..digits_end].parse().unwrap_or(0);
            let body = digits_end + 1;
            let end = (body + count).min(bytes.len());
            for b in breakable.iter_mut().take(end + 1).skip(body + 1) {
                *b = true;
            }
            i = end;
        }
        match bytes[i..].iter().position(|b| *b == b',' || *b == b';') {
            Some(p) => {
                breakable[i + p + 1] = true;
                i += p + 1;
            }
            None => break,
        }
    }
    breakable
}

/// Wrap free-format text into records of at most `width` columns
fn wrap(s: &str, width: usize) -> Vec<String> {
    let breakable = break_points(s);
    let mut lines = Vec::new();
    let mut start = 0;
    while start < s.len() {
        let mut end = (start + width).min(s.len());
        while end > start && !breakable[end] {
            end -= 1;
        }
        if end == start {
            end = (start + width).min(s.len());
        }
        lines.push(s[start..end].to_string());
        start = end;
    }
    lines
}

fn hollerith(s: &str) -> String {
    format!("{}H{}", s.len(), s)
}

impl IgesBuilder {
    /// Create a builder for a millimetre file
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the units flag and name
    pub fn with_units(mut self, flag: i64, name: &str) -> Self {
        self.units_flag = flag;
        self.units_name = name.to_string();
        self
    }

    /// Set the model space scale
    pub fn with_model_scale(mut self, scale: f64) -> Self {
        self.model_scale = scale;
        self
    }

    /// DE number the next added entity will get
    pub fn next_de(&self) -> DeNumber {
        DeNumber::from_index(self.entities.len())
    }

    /// Add an entity with default directory fields
    pub fn entity(&mut self, type_number: u16, form: i32, params: &str) -> DeNumber {
        self.add(EntitySpec::new(type_number, form, params))
    }

    /// Add an entity
    pub fn add(&mut self, spec: EntitySpec) -> DeNumber {
        let de = self.next_de();
        self.entities.push(spec);
        de
    }

    fn global(&self) -> String {
        format!(
            ",,{},{},{},{},32,38,6,308,15,{},{:?},{},{},1,1.0,{},0.001,10000.0,{},{},11,0,{};",
            hollerith("iges-rs test"),
            hollerith("test.igs"),
            hollerith("iges-rs"),
            hollerith("1.0"),
            hollerith("iges-rs test"),
            self.model_scale,
            self.units_flag,
            hollerith(&self.units_name),
            hollerith("20240101.000000"),
            hollerith("tester"),
            hollerith("iges-rs"),
            hollerith("20240101.000000"),
        )
    }

    /// Render the complete file
    pub fn build(&self) -> String {
        let mut out = String::new();

        let start_lines = wrap(&self.start, 72);
        for (i, line) in start_lines.iter().enumerate() {
            out.push_str(&format!("{:<72}S{:07}\n", line, i + 1));
        }

        let global_lines = wrap(&self.global(), 72);
        for (i, line) in global_lines.iter().enumerate() {
            out.push_str(&format!("{:<72}G{:07}\n", line, i + 1));
        }

        let mut directory = String::new();
        let mut parameter = String::new();
        let mut param_seq = 0usize;
        for (index, spec) in self.entities.iter().enumerate() {
            let de = DeNumber::from_index(index).0 as usize;
            let text = if spec.params.is_empty() {
                format!("{};", spec.type_number)
            } else {
                format!("{},{};", spec.type_number, spec.params)
            };
            let lines = wrap(&text, 64);
            let first = param_seq + 1;
            for line in &lines {
                param_seq += 1;
                parameter.push_str(&format!("{:<64}{:>8}P{:07}\n", line, de, param_seq));
            }

            directory.push_str(&format!(
                "{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}D{:07}\n",
                spec.type_number, first, spec.structure, 0, 0, 0, spec.trans, 0, "00000000", de
            ));
            directory.push_str(&format!(
                "{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}D{:07}\n",
                spec.type_number,
                0,
                spec.colorp,
                lines.len(),
                spec.form,
                "",
                "",
                spec.label,
                spec.subscript,
                de + 1
            ));
        }
        out.push_str(&directory);
        out.push_str(&parameter);

        out.push_str(&format!(
            "S{:07}G{:07}D{:07}P{:07}{:40}T{:07}\n",
            start_lines.len(),
            global_lines.len(),
            self.entities.len() * 2,
            param_seq,
            "",
            1
        ));
        out
    }
}
