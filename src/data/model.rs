use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

// ---------------------------------------------------------------------------
// SeverityClass – the label attached to every recording
// ---------------------------------------------------------------------------

/// Disease-severity class of a patient.
///
/// The discriminants are the integer labels handed to classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum SeverityClass {
    /// Healthy control.
    Control = 0,
    Mild = 1,
    Moderate = 2,
    Severe = 3,
}

impl SeverityClass {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_control(self) -> bool {
        self == SeverityClass::Control
    }
}

impl From<SeverityClass> for u8 {
    fn from(class: SeverityClass) -> u8 {
        class.as_u8()
    }
}

impl fmt::Display for SeverityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

// ---------------------------------------------------------------------------
// Recording – the raw sample matrix of one file
// ---------------------------------------------------------------------------

/// Samples of one recording file: one row per time step, one column per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    /// Header names, or `c0, c1, ...` for header-less files.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl Recording {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Every scalar, row by row.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }

    /// Apply `f` to every scalar in place.
    pub fn map_values(&mut self, mut f: impl FnMut(f64) -> f64) {
        for row in &mut self.rows {
            for v in row.iter_mut() {
                *v = f(*v);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of an assembled task table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Record {
    pub path: PathBuf,
    /// Patient id after suffix stripping, as matched against the metadata.
    pub patient_id: String,
    pub label: SeverityClass,
    pub recording: Recording,
}

/// A file that could not be turned into a [`Record`].
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// TaskDataset – every record of one task
// ---------------------------------------------------------------------------

/// The assembled table for one task, with pre-computed patient and label sets.
#[derive(Debug, Clone)]
pub struct TaskDataset {
    pub task: String,
    pub records: Vec<Record>,
    /// Files excluded during assembly, in discovery order.
    pub skipped: Vec<SkippedFile>,
    /// Distinct patient ids present in `records`.
    pub patient_ids: BTreeSet<String>,
    /// Distinct labels present in `records`.
    pub labels: BTreeSet<SeverityClass>,
}

impl TaskDataset {
    pub fn from_records(task: &str, records: Vec<Record>, skipped: Vec<SkippedFile>) -> Self {
        let mut patient_ids = BTreeSet::new();
        let mut labels = BTreeSet::new();
        for record in &records {
            patient_ids.insert(record.patient_id.clone());
            labels.insert(record.label);
        }
        TaskDataset {
            task: task.to_string(),
            records,
            skipped,
            patient_ids,
            labels,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Patients eligible to be held out: everyone except healthy controls.
    pub fn non_control_patients(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .filter(|r| !r.label.is_control())
            .map(|r| r.patient_id.clone())
            .collect()
    }
}
