// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion report

use iges_model::{DeNumber, EntityType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one conversion pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Plural noun for the entities of the pass, e.g. `solids`
    pub label: String,
    pub converted: usize,
    pub attempted: usize,
}

impl PassSummary {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            converted: 0,
            attempted: 0,
        }
    }

    /// Number of entities that failed
    pub fn failed(&self) -> usize {
        self.attempted - self.converted
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Converted {} {} successfully out of {} total {}",
            self.converted, self.label, self.attempted, self.label
        )
    }
}

/// An entity that could not be converted
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityFailure {
    pub de: DeNumber,
    pub entity_type: EntityType,
    pub name: String,
    pub message: String,
}

impl fmt::Display for EntityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}): {}",
            self.entity_type, self.de, self.name, self.message
        )
    }
}

/// Pass summaries and failures of a whole conversion
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub passes: Vec<PassSummary>,
    pub failures: Vec<EntityFailure>,
}

impl ConversionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of the pass with this label
    pub fn pass(&self, label: &str) -> Option<&PassSummary> {
        self.passes.iter().find(|p| p.label == label)
    }

    /// Total entities converted across all passes
    pub fn converted(&self) -> usize {
        self.passes.iter().map(|p| p.converted).sum()
    }

    /// Check if every attempted entity was converted
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_message() {
        let summary = PassSummary {
            label: "solids".to_string(),
            converted: 3,
            attempted: 4,
        };
        assert_eq!(
            summary.to_string(),
            "Converted 3 solids successfully out of 4 total solids"
        );
        assert_eq!(summary.failed(), 1);
    }

    #[test]
    fn test_report_lookup() {
        let mut report = ConversionReport::new();
        report.passes.push(PassSummary::new("trees"));
        report.failures.push(EntityFailure {
            de: DeNumber(7),
            entity_type: EntityType::Sphere,
            name: "sph.7".to_string(),
            message: "bad radius".to_string(),
        });
        assert!(report.pass("trees").is_some());
        assert!(report.pass("solids").is_none());
        assert!(!report.is_clean());
        assert_eq!(
            report.failures[0].to_string(),
            "Sphere (158) DE 7 (sph.7): bad radius"
        );
    }
}
