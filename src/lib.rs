//! Loads directories of Parkinson's disease gait and handwriting recordings
//! into labeled tables and leave-one-subject-out splits.
//!
//! ```no_run
//! use parkloader::ParkLoader;
//!
//! let loader = ParkLoader::open("/data/parkinsons")?;
//! for name in loader.names() {
//!     if let Some(dataset) = loader.load(&name) {
//!         for mut fold in dataset.leave_one_out() {
//!             let stats = fold.z_normalize()?;
//!             println!("{name}: held out {} (mean {})", fold.patient_id, stats.mean);
//!         }
//!     }
//! }
//! # Ok::<(), parkloader::LoaderError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod labels;
pub mod park;
pub mod scanner;

pub use config::{LoaderConfig, RecordingSchema, TaskCategory};
pub use data::model::{Record, Recording, SeverityClass, TaskDataset};
pub use data::normalize::ZStats;
pub use data::split::{Fold, LeaveOneOut};
pub use error::{LoaderError, Result};
pub use labels::{LabelMatch, LabelTable, SeverityBands};
pub use park::ParkLoader;
