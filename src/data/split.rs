use std::collections::btree_set;

use log::debug;

use super::model::{Recording, SeverityClass, TaskDataset};
use super::normalize::ZStats;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Patient partition
// ---------------------------------------------------------------------------

/// Split record indices into (everyone else, `patient`).
pub fn partition_indices(dataset: &TaskDataset, patient: &str) -> (Vec<usize>, Vec<usize>) {
    dataset
        .records
        .iter()
        .enumerate()
        .map(|(i, r)| (i, r.patient_id == patient))
        .fold((Vec::new(), Vec::new()), |(mut train, mut test), (i, held_out)| {
            if held_out {
                test.push(i);
            } else {
                train.push(i);
            }
            (train, test)
        })
}

// ---------------------------------------------------------------------------
// Fold
// ---------------------------------------------------------------------------

/// One leave-one-subject-out split.
#[derive(Debug, Clone)]
pub struct Fold {
    /// The held-out patient.
    pub patient_id: String,
    pub train: Vec<Recording>,
    pub test: Vec<Recording>,
    pub train_labels: Vec<SeverityClass>,
    pub test_labels: Vec<SeverityClass>,
    /// Indices into the source table's records.
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl Fold {
    fn build(
        dataset: &TaskDataset,
        patient_id: String,
        train_indices: Vec<usize>,
        test_indices: Vec<usize>,
    ) -> Self {
        let take = |indices: &[usize]| -> (Vec<Recording>, Vec<SeverityClass>) {
            indices
                .iter()
                .map(|&i| {
                    let r = &dataset.records[i];
                    (r.recording.clone(), r.label)
                })
                .unzip()
        };
        let (train, train_labels) = take(&train_indices);
        let (test, test_labels) = take(&test_indices);
        Fold {
            patient_id,
            train,
            test,
            train_labels,
            test_labels,
            train_indices,
            test_indices,
        }
    }

    /// Z-normalize train and test with statistics fitted on train only.
    pub fn z_normalize(&mut self) -> Result<ZStats> {
        let stats = ZStats::fit(&self.train)?;
        for rec in self.train.iter_mut().chain(self.test.iter_mut()) {
            stats.apply(rec);
        }
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// LeaveOneOut iterator
// ---------------------------------------------------------------------------

/// Lazily yields one [`Fold`] per non-control patient, in ascending id order.
///
/// Consumed once; call [`TaskDataset::leave_one_out`] again for a fresh pass.
pub struct LeaveOneOut<'a> {
    dataset: &'a TaskDataset,
    patients: btree_set::IntoIter<String>,
}

impl<'a> LeaveOneOut<'a> {
    pub fn new(dataset: &'a TaskDataset) -> Self {
        Self {
            dataset,
            patients: dataset.non_control_patients().into_iter(),
        }
    }
}

impl Iterator for LeaveOneOut<'_> {
    type Item = Fold;

    fn next(&mut self) -> Option<Fold> {
        loop {
            let patient = self.patients.next()?;
            let (train, test) = partition_indices(self.dataset, &patient);
            if test.is_empty() {
                debug!("Patient '{patient}' has no rows, no fold");
                continue;
            }
            return Some(Fold::build(self.dataset, patient, train, test));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.patients.len()))
    }
}

impl TaskDataset {
    pub fn leave_one_out(&self) -> LeaveOneOut<'_> {
        LeaveOneOut::new(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    use super::*;
    use crate::data::model::Record;

    fn record(patient: &str, label: SeverityClass, base: f64) -> Record {
        Record {
            path: PathBuf::from(format!("{patient}_walk.txt")),
            patient_id: patient.to_string(),
            label,
            recording: Recording {
                columns: vec!["c0".to_string(), "c1".to_string()],
                rows: vec![vec![base, base + 1.0], vec![base + 2.0, base + 3.0]],
            },
        }
    }

    fn dataset() -> TaskDataset {
        TaskDataset::from_records(
            "walk",
            vec![
                record("P01", SeverityClass::Control, 0.0),
                record("P02", SeverityClass::Mild, 10.0),
                record("P03", SeverityClass::Moderate, 20.0),
                record("P02", SeverityClass::Mild, 11.0),
                record("P04", SeverityClass::Severe, 30.0),
            ],
            Vec::new(),
        )
    }

    fn patients_of(ds: &TaskDataset, indices: &[usize]) -> BTreeSet<String> {
        indices
            .iter()
            .map(|&i| ds.records[i].patient_id.clone())
            .collect()
    }

    #[test]
    fn test_partition_indices() {
        let ds = dataset();
        let (train, test) = partition_indices(&ds, "P02");
        assert_eq!(test, vec![1, 3]);
        assert_eq!(train, vec![0, 2, 4]);
    }

    #[test]
    fn test_one_fold_per_non_control_patient() {
        let ds = dataset();
        let held_out: Vec<String> = ds.leave_one_out().map(|f| f.patient_id).collect();
        assert_eq!(held_out, vec!["P02", "P03", "P04"]);
    }

    #[test]
    fn test_folds_are_exact_partitions() {
        let ds = dataset();
        for fold in ds.leave_one_out() {
            let train = patients_of(&ds, &fold.train_indices);
            let test = patients_of(&ds, &fold.test_indices);

            assert_eq!(test, BTreeSet::from([fold.patient_id.clone()]));
            assert!(train.is_disjoint(&test));
            let union: BTreeSet<String> = train.union(&test).cloned().collect();
            assert_eq!(union, ds.patient_ids);
            assert!(train.contains("P01"));

            assert_eq!(fold.train.len(), fold.train_labels.len());
            assert_eq!(fold.test.len(), fold.test_labels.len());
            assert_eq!(fold.train.len() + fold.test.len(), ds.len());
        }
    }

    #[test]
    fn test_labels_follow_records() {
        let ds = dataset();
        let fold = ds.leave_one_out().find(|f| f.patient_id == "P02").unwrap();
        assert_eq!(fold.test_labels, vec![SeverityClass::Mild, SeverityClass::Mild]);
        assert_eq!(
            fold.train_labels,
            vec![
                SeverityClass::Control,
                SeverityClass::Moderate,
                SeverityClass::Severe
            ]
        );
    }

    #[test]
    fn test_iterator_is_single_pass_but_rebuildable() {
        let ds = dataset();
        let mut folds = ds.leave_one_out();
        assert_eq!(folds.by_ref().count(), 3);
        assert!(folds.next().is_none());
        assert_eq!(ds.leave_one_out().count(), 3);
    }

    #[test]
    fn test_only_controls_yields_no_folds() {
        let ds = TaskDataset::from_records(
            "walk",
            vec![record("P01", SeverityClass::Control, 0.0)],
            Vec::new(),
        );
        assert_eq!(ds.leave_one_out().count(), 0);
    }

    #[test]
    fn test_z_normalize_uses_train_statistics() {
        let ds = dataset();
        let mut fold = ds.leave_one_out().next().unwrap();
        let raw_test = fold.test.clone();
        let stats = fold.z_normalize().unwrap();

        let train_values: Vec<f64> = fold.train.iter().flat_map(|r| r.values()).collect();
        let mean = train_values.iter().sum::<f64>() / train_values.len() as f64;
        assert!(mean.abs() < 1e-9);

        for (n, r) in fold.test[0].values().zip(raw_test[0].values()) {
            assert!((stats.denormalize(n) - r).abs() < 1e-9);
        }
    }
}
