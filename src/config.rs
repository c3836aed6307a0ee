use std::path::Path;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::error::{LoaderError, Result};
use crate::labels::{LabelMatch, SeverityBands};

// ---------------------------------------------------------------------------
// Task categories and their recording schemas
// ---------------------------------------------------------------------------

/// The kinds of recordings found in a dataset directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Handwriting,
    Gait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    /// `;`-separated cells.
    Semicolon,
    /// Any run of spaces or tabs.
    Whitespace,
}

/// Declared layout of one recording file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingSchema {
    pub delimiter: Delimiter,
    pub has_header: bool,
    /// Keep only the first `n` columns. `None` keeps every column.
    pub columns: Option<usize>,
}

impl RecordingSchema {
    pub fn handwriting() -> Self {
        Self {
            delimiter: Delimiter::Semicolon,
            has_header: true,
            columns: None,
        }
    }

    /// Gait files carry six sensor axes followed by derived columns.
    pub fn gait() -> Self {
        Self {
            delimiter: Delimiter::Whitespace,
            has_header: false,
            columns: Some(6),
        }
    }
}

/// Assigns every file whose root-relative path matches `pattern` to `category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub pattern: String,
    pub category: TaskCategory,
}

// ---------------------------------------------------------------------------
// LoaderConfig
// ---------------------------------------------------------------------------

/// Everything the loader needs to know about a dataset's conventions.
///
/// Missing fields in a JSON config file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Metadata table, relative to the dataset root.
    pub metadata_file: String,
    pub id_column: String,
    pub score_column: String,
    /// Directory name or file-name token marking healthy controls.
    pub control_marker: String,
    /// Extension of recording files, without the dot.
    pub extension: String,
    pub severity: SeverityBands,
    pub label_match: LabelMatch,
    /// Checked in order; the first match wins.
    pub category_rules: Vec<CategoryRule>,
    pub default_category: TaskCategory,
    pub handwriting: RecordingSchema,
    pub gait: RecordingSchema,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            metadata_file: "metadata.csv".to_string(),
            id_column: "ID".to_string(),
            score_column: "updrs_total".to_string(),
            control_marker: "HC".to_string(),
            extension: "txt".to_string(),
            severity: SeverityBands::default(),
            label_match: LabelMatch::default(),
            category_rules: vec![CategoryRule {
                pattern: "*handwriting*".to_string(),
                category: TaskCategory::Handwriting,
            }],
            default_category: TaskCategory::Gait,
            handwriting: RecordingSchema::handwriting(),
            gait: RecordingSchema::gait(),
        }
    }
}

impl LoaderConfig {
    /// Read a JSON config file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: LoaderConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.control_marker.is_empty() {
            return Err(LoaderError::InvalidConfig(
                "control_marker must not be empty".to_string(),
            ));
        }
        if self.extension.is_empty() {
            return Err(LoaderError::InvalidConfig(
                "extension must not be empty".to_string(),
            ));
        }
        self.severity.validate()?;
        for (name, schema) in [("handwriting", &self.handwriting), ("gait", &self.gait)] {
            if schema.columns == Some(0) {
                return Err(LoaderError::InvalidConfig(format!(
                    "{name} schema declares zero columns"
                )));
            }
        }
        self.category_matcher().map(|_| ())
    }

    pub fn schema_for(&self, category: TaskCategory) -> &RecordingSchema {
        match category {
            TaskCategory::Handwriting => &self.handwriting,
            TaskCategory::Gait => &self.gait,
        }
    }

    /// Compile the category rules once so they can be applied per file.
    pub fn category_matcher(&self) -> Result<CategoryMatcher> {
        let rules = self
            .category_rules
            .iter()
            .map(|rule| {
                Pattern::new(&rule.pattern)
                    .map(|p| (p, rule.category))
                    .map_err(|e| {
                        LoaderError::InvalidConfig(format!(
                            "category pattern '{}': {e}",
                            rule.pattern
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CategoryMatcher {
            rules,
            default: self.default_category,
        })
    }
}

/// Compiled form of [`LoaderConfig::category_rules`].
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    rules: Vec<(Pattern, TaskCategory)>,
    default: TaskCategory,
}

impl CategoryMatcher {
    /// Category of a file given its path relative to the dataset root.
    pub fn category_of(&self, relative: &Path) -> TaskCategory {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches_path_with(relative, options))
            .map(|(_, category)| *category)
            .unwrap_or(self.default)
    }
}
