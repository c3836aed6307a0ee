use std::path::{Path, PathBuf};

use log::{error, info};

use crate::config::LoaderConfig;
use crate::data::loader::{load_metadata, load_recording};
use crate::data::model::{Record, SkippedFile, TaskDataset};
use crate::error::Result;
use crate::labels::LabelTable;
use crate::scanner::{DirectoryScan, RecordingFile};

// ---------------------------------------------------------------------------
// ParkLoader
// ---------------------------------------------------------------------------

/// A Parkinson's recording directory, indexed and labeled.
///
/// The file index and label table are built once in [`ParkLoader::open`];
/// each [`ParkLoader::load`] call re-reads the task's files from disk.
#[derive(Debug, Clone)]
pub struct ParkLoader {
    config: LoaderConfig,
    scan: DirectoryScan,
    labels: LabelTable,
}

impl ParkLoader {
    /// Open `root` with the default conventions.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(root, LoaderConfig::default())
    }

    pub fn with_config(root: impl AsRef<Path>, config: LoaderConfig) -> Result<Self> {
        let root = root.as_ref();
        config.validate()?;

        let scan = DirectoryScan::scan(root, &config)?;
        let rows = load_metadata(
            &root.join(&config.metadata_file),
            &config.id_column,
            &config.score_column,
        )?;
        let controls = scan.control_patients();
        let labels = LabelTable::build(&rows, &controls, &config.severity, config.label_match);

        info!(
            "Indexed {} recordings in {} ({} tasks, {} labeled patients, {} controls)",
            scan.files().len(),
            root.display(),
            scan.names().len(),
            labels.len(),
            controls.len()
        );
        Ok(ParkLoader {
            config,
            scan,
            labels,
        })
    }

    pub fn root(&self) -> &Path {
        self.scan.root()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Task names in ascending order.
    pub fn names(&self) -> Vec<String> {
        self.scan.names().into_iter().collect()
    }

    /// Paths of the files belonging to `task`, or `None` for an unknown task.
    pub fn files(&self, task: &str) -> Option<Vec<PathBuf>> {
        self.known(task)
            .then(|| self.scan.files_for(task).iter().map(|f| f.path.clone()).collect())
    }

    /// Assemble the table for `task`.
    ///
    /// An unknown task is logged and yields `None`.
    pub fn load(&self, task: &str) -> Option<TaskDataset> {
        if !self.known(task) {
            error!("Dataset {task} not available in {}", self.root().display());
            return None;
        }
        info!("Loading {task}");
        Some(assemble(task, &self.scan.files_for(task), &self.labels, &self.config))
    }

    fn known(&self, task: &str) -> bool {
        self.scan.files().iter().any(|f| f.task == task)
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Read and label every file of a task. Failing files are logged and skipped.
pub fn assemble(
    task: &str,
    files: &[&RecordingFile],
    labels: &LabelTable,
    config: &LoaderConfig,
) -> TaskDataset {
    let mut records = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();

    for file in files {
        match read_record(file, labels, config) {
            Ok(record) => records.push(record),
            Err(e) => {
                error!("Skipping {}: {e}", file.path.display());
                skipped.push(SkippedFile {
                    path: file.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "{task}: {} records, {} skipped",
        records.len(),
        skipped.len()
    );
    TaskDataset::from_records(task, records, skipped)
}

fn read_record(file: &RecordingFile, labels: &LabelTable, config: &LoaderConfig) -> Result<Record> {
    let patient_id = file.patient_id();
    let (_, label) = labels.resolve(patient_id)?;
    let recording = load_recording(&file.path, config.schema_for(file.category))?;
    Ok(Record {
        path: file.path.clone(),
        patient_id: patient_id.to_string(),
        label,
        recording,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use tempfile::TempDir;

    use super::*;
    use crate::data::model::SeverityClass;
    use crate::error::LoaderError;

    const GAIT: &str = "0.1 0.2 0.3 0.4 0.5 0.6 9 9\n0.7 0.8 0.9 1.0 1.1 1.2 9 9\n";

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn labels_of(ds: &TaskDataset) -> Vec<(String, u8)> {
        ds.records
            .iter()
            .map(|r| (r.patient_id.clone(), r.label.as_u8()))
            .collect()
    }

    #[test]
    fn test_open_rejects_non_directory() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ParkLoader::open(dir.path().join("nope")),
            Err(LoaderError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_open_requires_metadata() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "P02_task1.txt", GAIT);
        assert!(matches!(
            ParkLoader::open(dir.path()),
            Err(LoaderError::MetadataNotFound(_))
        ));
    }

    #[test]
    fn test_control_and_patient_scenario() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "HC/P01_HC_task1.txt", GAIT);
        write(dir.path(), "PD/P02_task1.txt", GAIT);
        write(dir.path(), "metadata.csv", "ID,updrs_total\nP02,15\n");

        let loader = ParkLoader::open(dir.path()).unwrap();
        assert_eq!(loader.names(), vec!["task1"]);

        let ds = loader.load("task1").unwrap();
        assert!(ds.skipped.is_empty());
        assert_eq!(
            labels_of(&ds),
            vec![("P01".to_string(), 0), ("P02".to_string(), 1)]
        );
        assert_eq!(ds.records[0].recording.n_columns(), 6);
    }

    #[test]
    fn test_unknown_task_is_none() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "P02_task1.txt", GAIT);
        write(dir.path(), "metadata.csv", "ID,updrs_total\nP02,15\n");

        let loader = ParkLoader::open(dir.path()).unwrap();
        assert!(loader.load("task2").is_none());
        assert!(loader.files("task2").is_none());
        assert_eq!(loader.files("task1").unwrap().len(), 1);
    }

    #[test]
    fn test_all_files_failing_gives_empty_table() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "P02_walk.txt", "not numbers at all here\n");
        write(dir.path(), "P03_walk.txt", "1 2 3\n");
        write(dir.path(), "P04_walk.txt", "");
        write(
            dir.path(),
            "metadata.csv",
            "ID,updrs_total\nP02,15\nP03,25\nP04,45\n",
        );

        let loader = ParkLoader::open(dir.path()).unwrap();
        let ds = loader.load("walk").unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.skipped.len(), 3);
        assert!(ds.labels.is_empty());
        assert_eq!(ds.leave_one_out().count(), 0);
    }

    #[test]
    fn test_missing_label_skips_only_that_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "P02_walk.txt", GAIT);
        write(dir.path(), "P09_walk.txt", GAIT);
        write(dir.path(), "metadata.csv", "ID,updrs_total\nP02,15\n");

        let ds = ParkLoader::open(dir.path()).unwrap().load("walk").unwrap();
        assert_eq!(labels_of(&ds), vec![("P02".to_string(), 1)]);
        assert_eq!(ds.skipped.len(), 1);
        assert!(ds.skipped[0].reason.contains("P09"));
    }

    #[test]
    fn test_well_formed_metadata_drops_nobody() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "P02a_walk.txt", GAIT);
        write(dir.path(), "P02b_walk.txt", GAIT);
        write(dir.path(), "P10_walk.txt", GAIT);
        write(dir.path(), "P11_walk.txt", GAIT);
        write(
            dir.path(),
            "metadata.csv",
            "ID,updrs_total\nP02,30\nP10,45\nP11,5\n",
        );

        let ds = ParkLoader::open(dir.path()).unwrap().load("walk").unwrap();
        assert!(ds.skipped.is_empty());
        assert_eq!(
            ds.patient_ids,
            BTreeSet::from(["P02".to_string(), "P10".to_string(), "P11".to_string()])
        );
        assert_eq!(
            ds.labels,
            BTreeSet::from([
                SeverityClass::Mild,
                SeverityClass::Moderate,
                SeverityClass::Severe
            ])
        );
    }

    #[test]
    fn test_mixed_categories_in_one_root() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "handwriting/P02_spiral.txt",
            "x;y;pressure\n1;2;3\n4;5;6\n",
        );
        write(dir.path(), "gaitRaw/P02_walk.txt", GAIT);
        write(dir.path(), "metadata.csv", "ID,updrs_total\nP02,50\n");

        let loader = ParkLoader::open(dir.path()).unwrap();
        let spiral = loader.load("spiral").unwrap();
        assert_eq!(spiral.records[0].recording.columns, vec!["x", "y", "pressure"]);
        let walk = loader.load("walk").unwrap();
        assert_eq!(walk.records[0].recording.n_columns(), 6);
    }

    #[test]
    fn test_three_patients_three_folds() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "HC/P01_walk.txt", GAIT);
        write(dir.path(), "P02_walk.txt", GAIT);
        write(dir.path(), "P03_walk.txt", GAIT);
        write(dir.path(), "P04_walk.txt", GAIT);
        write(
            dir.path(),
            "metadata.csv",
            "ID,updrs_total\nP02,10\nP03,22\nP04,41\n",
        );

        let ds = ParkLoader::open(dir.path()).unwrap().load("walk").unwrap();
        let folds: Vec<_> = ds.leave_one_out().collect();
        assert_eq!(folds.len(), 3);
        for fold in &folds {
            assert_eq!(fold.test.len(), 1);
            assert_eq!(fold.train.len(), 3);
            assert!(fold
                .test_indices
                .iter()
                .all(|&i| ds.records[i].patient_id == fold.patient_id));
        }
    }

    #[test]
    fn test_exact_policy_from_config() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "P02_walk.txt", GAIT);
        write(dir.path(), "metadata.csv", "ID,updrs_total\nP02_v1,15\n");

        let prefix = ParkLoader::open(dir.path()).unwrap().load("walk").unwrap();
        assert_eq!(prefix.len(), 1);

        let config = LoaderConfig {
            label_match: crate::labels::LabelMatch::Exact,
            ..LoaderConfig::default()
        };
        let exact = ParkLoader::with_config(dir.path(), config)
            .unwrap()
            .load("walk")
            .unwrap();
        assert!(exact.is_empty());
        assert_eq!(exact.skipped.len(), 1);
    }
}
