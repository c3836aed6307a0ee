//! Patient id → severity class mapping built from the metadata table.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::data::model::SeverityClass;
use crate::error::{LoaderError, Result};

// ---------------------------------------------------------------------------
// Severity bands
// ---------------------------------------------------------------------------

/// Thresholds splitting the clinical score into three ordinal classes.
///
/// `score < moderate_from` is mild, `score < severe_from` is moderate,
/// anything else is severe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityBands {
    pub moderate_from: f64,
    pub severe_from: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            moderate_from: 21.0,
            severe_from: 40.0,
        }
    }
}

impl SeverityBands {
    pub fn classify(&self, score: f64) -> SeverityClass {
        if score < self.moderate_from {
            SeverityClass::Mild
        } else if score < self.severe_from {
            SeverityClass::Moderate
        } else {
            SeverityClass::Severe
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.moderate_from.is_finite()
            || !self.severe_from.is_finite()
            || self.moderate_from >= self.severe_from
        {
            return Err(LoaderError::InvalidConfig(format!(
                "severity bands must be finite and increasing, got {} / {}",
                self.moderate_from, self.severe_from
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Match policy
// ---------------------------------------------------------------------------

/// How a file-derived patient id is matched against metadata ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatch {
    /// Ids must be identical.
    Exact,
    /// An identical id wins; otherwise exactly one metadata id may start
    /// with the patient id.
    #[default]
    UniquePrefix,
}

/// One usable row of the metadata table.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRow {
    pub id: String,
    pub score: f64,
}

/// Strip a trailing non-digit suffix: `P02a` → `P02`.
///
/// Ids without any digit are returned unchanged.
pub fn strip_id_suffix(raw: &str) -> &str {
    let stripped = raw.trim_end_matches(|c: char| !c.is_ascii_digit());
    if stripped.is_empty() {
        raw
    } else {
        stripped
    }
}

// ---------------------------------------------------------------------------
// LabelTable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: BTreeMap<String, SeverityClass>,
    policy: LabelMatch,
}

impl LabelTable {
    /// Bucket every metadata score and force controls to class 0.
    ///
    /// Duplicate metadata ids keep their first row.
    pub fn build(
        rows: &[MetadataRow],
        controls: &BTreeSet<String>,
        bands: &SeverityBands,
        policy: LabelMatch,
    ) -> Self {
        let mut labels = BTreeMap::new();
        for row in rows {
            if labels.contains_key(&row.id) {
                warn!("Duplicate metadata id '{}', keeping the first row", row.id);
                continue;
            }
            labels.insert(row.id.clone(), bands.classify(row.score));
        }
        for id in controls {
            if let Some(previous) = labels.insert(id.clone(), SeverityClass::Control) {
                debug!("Control '{id}' overrides metadata class {previous}");
            }
        }
        LabelTable { labels, policy }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SeverityClass)> {
        self.labels.iter().map(|(id, class)| (id.as_str(), *class))
    }

    /// Resolve a patient id, returning the matched metadata id and its class.
    pub fn resolve(&self, id: &str) -> Result<(&str, SeverityClass)> {
        if let Some((key, class)) = self.labels.get_key_value(id) {
            return Ok((key.as_str(), *class));
        }
        if self.policy == LabelMatch::Exact {
            return Err(LoaderError::LabelNotFound(id.to_string()));
        }

        let candidates: Vec<(&String, &SeverityClass)> = self
            .labels
            .range::<str, _>((Bound::Excluded(id), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(id))
            .collect();

        match candidates.len() {
            0 => Err(LoaderError::LabelNotFound(id.to_string())),
            1 => {
                let (key, class) = candidates[0];
                Ok((key.as_str(), *class))
            }
            _ => Err(LoaderError::AmbiguousLabel {
                id: id.to_string(),
                candidates: candidates.iter().map(|(key, _)| (*key).clone()).collect(),
            }),
        }
    }
}
