use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "parkloader",
    version,
    about = "Load Parkinson's disease gait and handwriting recordings into leave-one-subject-out splits",
    long_about = "Scans a dataset directory of <PatientID>_<TaskName>.txt recordings plus a metadata \
                  table, prints every task with its labels and the patient held out by each \
                  leave-one-out fold."
)]
pub struct Cli {
    /// Dataset root directory
    pub root: Option<PathBuf>,

    /// Only process this task
    #[arg(long)]
    pub task: Option<String>,

    /// Z-normalize each fold with statistics from its training rows
    #[arg(long, default_value_t = false)]
    pub z_norm: bool,

    /// JSON file overriding the default dataset conventions
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print a JSON summary instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_optional() {
        let cli = Cli::try_parse_from(["parkloader"]).unwrap();
        assert!(cli.root.is_none());
        assert!(!cli.z_norm);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "parkloader",
            "/data",
            "--task",
            "walk",
            "--z-norm",
            "--json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/data")));
        assert_eq!(cli.task.as_deref(), Some("walk"));
        assert!(cli.z_norm);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }
}
