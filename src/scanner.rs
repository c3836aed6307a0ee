//! Recursive discovery of `<PatientID>_<TaskName>.<ext>` recording files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use log::{debug, warn};

use crate::config::{LoaderConfig, TaskCategory};
use crate::error::{LoaderError, Result};
use crate::labels::strip_id_suffix;

/// One discovered recording file and what its name says about it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingFile {
    pub path: PathBuf,
    /// Path below the dataset root.
    pub relative: PathBuf,
    /// First underscore token of the base name, unstripped.
    pub patient_token: String,
    /// Last underscore token of the base name.
    pub task: String,
    /// Underscore tokens after the patient token, task included.
    tokens: Vec<String>,
    pub control: bool,
    pub category: TaskCategory,
}

impl RecordingFile {
    /// Patient id used for label lookup and grouping.
    pub fn patient_id(&self) -> &str {
        strip_id_suffix(&self.patient_token)
    }

    /// Whether the base name carries `task` as one of its tokens.
    pub fn has_token(&self, task: &str) -> bool {
        self.tokens.iter().any(|t| t == task)
    }
}

/// Index of every recording file below a root, built once at open time.
#[derive(Debug, Clone)]
pub struct DirectoryScan {
    root: PathBuf,
    files: Vec<RecordingFile>,
}

impl DirectoryScan {
    pub fn scan(root: &Path, config: &LoaderConfig) -> Result<Self> {
        if !root.is_dir() {
            return Err(LoaderError::NotADirectory(root.to_path_buf()));
        }
        // `dir/`, `dir/./` and `./` all name the same root as `dir` and `.`.
        let root: PathBuf = root.components().collect();
        let root = root.as_path();
        let matcher = config.category_matcher()?;
        let metadata_path = root.join(&config.metadata_file);

        let pattern = PathBuf::from(Pattern::escape(&root.to_string_lossy()))
            .join("**")
            .join(format!("*.{}", config.extension));
        let pattern = pattern.to_string_lossy();

        let mut files = Vec::new();
        for entry in glob(&pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Unreadable path during scan: {e}");
                    continue;
                }
            };
            if !path.is_file() || path == metadata_path {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(path.as_path()).to_path_buf();

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                debug!("Skipping {}: base name is not UTF-8", path.display());
                continue;
            };
            let parts: Vec<&str> = stem.split('_').collect();
            let (Some(patient), Some(task)) = (parts.first(), parts.last()) else {
                continue;
            };
            if parts.len() < 2 || patient.is_empty() || task.is_empty() {
                debug!(
                    "Skipping {}: name does not follow <PatientID>_<TaskName>",
                    path.display()
                );
                continue;
            }

            let marker = config.control_marker.as_str();
            let in_control_dir = relative
                .parent()
                .map(|dir| dir.components().any(|c| c.as_os_str() == marker))
                .unwrap_or(false);
            let marked_name = parts[1..parts.len() - 1].iter().any(|t| *t == marker);

            debug!("Found {} (patient {patient}, task {task})", relative.display());
            files.push(RecordingFile {
                category: matcher.category_of(&relative),
                path: path.clone(),
                relative,
                patient_token: patient.to_string(),
                task: task.to_string(),
                tokens: parts[1..].iter().map(|t| t.to_string()).collect(),
                control: in_control_dir || marked_name,
            });
        }

        Ok(DirectoryScan {
            root: root.to_path_buf(),
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[RecordingFile] {
        &self.files
    }

    /// Distinct task names.
    pub fn names(&self) -> BTreeSet<String> {
        self.files.iter().map(|f| f.task.clone()).collect()
    }

    /// Files whose base name carries the `task` token, in discovery order.
    pub fn files_for(&self, task: &str) -> Vec<&RecordingFile> {
        self.files.iter().filter(|f| f.has_token(task)).collect()
    }

    /// Stripped ids of every patient with at least one control-marked file.
    pub fn control_patients(&self) -> BTreeSet<String> {
        self.files
            .iter()
            .filter(|f| f.control)
            .map(|f| f.patient_id().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "1 2 3 4 5 6\n").unwrap();
    }

    #[test]
    fn test_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "").unwrap();

        for root in [file, dir.path().join("missing")] {
            assert!(matches!(
                DirectoryScan::scan(&root, &LoaderConfig::default()),
                Err(LoaderError::NotADirectory(_))
            ));
        }
    }

    #[test]
    fn test_names_are_distinct_last_tokens() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "P01_walk.txt");
        touch(dir.path(), "gait/P02_walk.txt");
        touch(dir.path(), "gait/deep/P03_extra_turn.txt");
        touch(dir.path(), "handwriting/P02_spiral.txt");
        touch(dir.path(), "README.txt");
        touch(dir.path(), "P04_walk.csv");

        let scan = DirectoryScan::scan(dir.path(), &LoaderConfig::default()).unwrap();
        assert_eq!(scan.files().len(), 4);
        assert_eq!(
            scan.names().into_iter().collect::<Vec<_>>(),
            vec!["spiral", "turn", "walk"]
        );
    }

    #[test]
    fn test_root_spelling_does_not_change_names() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "P01_walk.txt");
        touch(dir.path(), "sub/P02_turn.txt");

        let plain = dir.path().to_path_buf();
        let expected = DirectoryScan::scan(&plain, &LoaderConfig::default())
            .unwrap()
            .names();
        assert_eq!(expected.len(), 2);

        let base = plain.to_string_lossy().into_owned();
        for spelling in [format!("{base}/"), format!("{base}/./"), format!("{base}//")] {
            let scan = DirectoryScan::scan(Path::new(&spelling), &LoaderConfig::default()).unwrap();
            assert_eq!(scan.names(), expected, "root spelled {spelling}");
            assert_eq!(scan.files().len(), 2);
        }
    }

    #[test]
    fn test_files_for_matches_tokens_not_substrings() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "P01_walk.txt");
        touch(dir.path(), "P02_walk2.txt");
        touch(dir.path(), "P03_walk_turn.txt");

        let scan = DirectoryScan::scan(dir.path(), &LoaderConfig::default()).unwrap();
        let walk: Vec<&str> = scan
            .files_for("walk")
            .iter()
            .map(|f| f.patient_token.as_str())
            .collect();
        assert_eq!(walk, vec!["P01", "P03"]);
        assert_eq!(scan.files_for("walk2").len(), 1);
        assert!(scan.files_for("missing").is_empty());
    }

    #[test]
    fn test_control_markers() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "HC/P01_task1.txt");
        touch(dir.path(), "P05_HC_task1.txt");
        touch(dir.path(), "PD/P02a_task1.txt");
        touch(dir.path(), "PD/P03_HCtask.txt");

        let scan = DirectoryScan::scan(dir.path(), &LoaderConfig::default()).unwrap();
        assert_eq!(
            scan.control_patients().into_iter().collect::<Vec<_>>(),
            vec!["P01", "P05"]
        );
        let p02 = scan
            .files()
            .iter()
            .find(|f| f.patient_token == "P02a")
            .unwrap();
        assert_eq!(p02.patient_id(), "P02");
        assert!(!p02.control);
    }

    #[test]
    fn test_categories_follow_rules() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "handwriting/P01_spiral.txt");
        touch(dir.path(), "gaitRaw/P01_walk.txt");

        let scan = DirectoryScan::scan(dir.path(), &LoaderConfig::default()).unwrap();
        assert_eq!(scan.files_for("spiral")[0].category, TaskCategory::Handwriting);
        assert_eq!(scan.files_for("walk")[0].category, TaskCategory::Gait);
    }
}
