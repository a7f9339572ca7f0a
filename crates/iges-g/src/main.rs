// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! iges-g
//!
//! Reads an IGES file and writes the converted geometry database as JSON.
//! Structural errors in the file abort before anything is written.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use iges_convert::{convert_file, MemoryDatabase};
use log::info;
use std::fs;

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    let file = iges_parser::read_file(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    info!(
        "{}: {} entities, {} mm per unit",
        args.input.display(),
        file.entity_count(),
        file.unit_factor()
    );

    let (db, report) = convert_file(file, args.options(), MemoryDatabase::new())?;
    for pass in &report.passes {
        eprintln!("{}", pass);
    }

    let json = db.to_json().context("failed to serialize the database")?;
    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}
