use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::error;
use serde::Serialize;

use parkloader::{LoaderConfig, ParkLoader, TaskDataset, ZStats};

use crate::cli::Cli;

#[derive(Serialize)]
struct TaskSummary {
    task: String,
    labels: Vec<u8>,
    records: usize,
    skipped: usize,
    folds: Vec<FoldSummary>,
}

#[derive(Serialize)]
struct FoldSummary {
    patient_id: String,
    train: usize,
    test: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    normalization: Option<ZStats>,
}

/// Load every requested task and print its labels and folds.
pub fn run(root: &Path, cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => LoaderConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => LoaderConfig::default(),
    };
    let loader = ParkLoader::with_config(root, config)
        .with_context(|| format!("opening {}", root.display()))?;

    let names = match &cli.task {
        Some(task) => vec![task.clone()],
        None => loader.names(),
    };

    let mut summaries = Vec::with_capacity(names.len());
    for name in &names {
        let Some(dataset) = loader.load(name) else {
            if cli.task.is_some() {
                bail!("task '{name}' not found");
            }
            continue;
        };
        summaries.push(summarize(&dataset, cli.z_norm));
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&summaries).context("serializing summary")?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{json}").context("writing to stdout")?;
    } else {
        print_text(&summaries);
    }
    Ok(())
}

fn summarize(dataset: &TaskDataset, z_norm: bool) -> TaskSummary {
    let folds = dataset
        .leave_one_out()
        .map(|mut fold| {
            let normalization = if z_norm {
                match fold.z_normalize() {
                    Ok(stats) => Some(stats),
                    Err(e) => {
                        error!("{}, fold {}: {e}", dataset.task, fold.patient_id);
                        None
                    }
                }
            } else {
                None
            };
            FoldSummary {
                train: fold.train.len(),
                test: fold.test.len(),
                patient_id: fold.patient_id,
                normalization,
            }
        })
        .collect();

    TaskSummary {
        task: dataset.task.clone(),
        labels: dataset.labels.iter().map(|l| l.as_u8()).collect(),
        records: dataset.len(),
        skipped: dataset.skipped.len(),
        folds,
    }
}

fn print_text(summaries: &[TaskSummary]) {
    for summary in summaries {
        println!("{} Labels: {:?}", summary.task, summary.labels);
        for fold in &summary.folds {
            match &fold.normalization {
                Some(stats) => println!(
                    "  {}  train={} test={} mean={:.4} std={:.4}",
                    fold.patient_id, fold.train, fold.test, stats.mean, stats.std
                ),
                None => println!(
                    "  {}  train={} test={}",
                    fold.patient_id, fold.train, fold.test
                ),
            }
        }
    }
}
