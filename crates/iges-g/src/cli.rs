// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use clap::Parser;
use iges_convert::ConvertOptions;
use log::LevelFilter;
use std::path::PathBuf;

/// Convert an IGES file into a BRL-CAD geometry database
#[derive(Parser, Debug)]
#[command(name = "iges-g", version, about)]
pub struct Args {
    /// IGES file to convert
    pub input: PathBuf,

    /// Write the database as JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the conversion report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Convert rational B-spline surfaces into one NURBS object
    #[arg(short, long)]
    pub nurbs: bool,

    /// Database title, defaults to the file name recorded in the IGES file
    #[arg(short, long)]
    pub title: Option<String>,

    /// Name of the NURBS object
    #[arg(long, default_value = iges_convert::DEFAULT_NURBS_NAME)]
    pub nurbs_name: String,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn options(&self) -> ConvertOptions {
        let options = ConvertOptions::new()
            .with_nurbs(self.nurbs)
            .with_nurbs_name(self.nurbs_name.clone());
        match &self.title {
            Some(title) => options.with_title(title.clone()),
            None => options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from(["iges-g", "part.igs", "-o", "part.json", "--nurbs", "-vv"]);
        assert_eq!(args.input, PathBuf::from("part.igs"));
        assert_eq!(args.output, Some(PathBuf::from("part.json")));
        assert_eq!(args.log_level(), LevelFilter::Debug);
        let options = args.options();
        assert!(options.nurbs);
        assert_eq!(options.title, None);
        assert_eq!(options.nurbs_name, "nurb.s");
    }

    #[test]
    fn test_title_option() {
        let args = Args::parse_from(["iges-g", "part.igs", "-t", "bracket"]);
        assert_eq!(args.options().title.as_deref(), Some("bracket"));
        assert_eq!(args.log_level(), LevelFilter::Warn);
    }
}
