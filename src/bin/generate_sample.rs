use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Seeded splitmix64 stream; enough for reproducible sensor noise.
struct Noise(u64);

impl Noise {
    fn uniform(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        // 53 high bits, shifted into (0, 1] so ln() below stays finite.
        ((z >> 11) + 1) as f64 / (1u64 << 53) as f64
    }

    fn normal(&mut self, std_dev: f64) -> f64 {
        let radius = (-2.0 * self.uniform().ln()).sqrt();
        let angle = std::f64::consts::TAU * self.uniform();
        std_dev * radius * angle.sin()
    }
}

struct Subject {
    id: &'static str,
    /// `None` for healthy controls.
    updrs: Option<f64>,
}

const SUBJECTS: &[Subject] = &[
    Subject { id: "C01", updrs: None },
    Subject { id: "C02", updrs: None },
    Subject { id: "P01", updrs: Some(12.0) },
    Subject { id: "P02", updrs: Some(18.5) },
    Subject { id: "P03a", updrs: Some(27.0) },
    Subject { id: "P04", updrs: Some(33.0) },
    Subject { id: "P05", updrs: Some(44.0) },
    Subject { id: "P06", updrs: Some(61.0) },
];

/// Tremor amplitude grows with severity; controls get a small baseline.
fn tremor(subject: &Subject) -> f64 {
    0.05 + subject.updrs.unwrap_or(0.0) / 100.0
}

fn group_dir(subject: &Subject) -> &'static str {
    if subject.updrs.is_some() {
        "PD"
    } else {
        "HC"
    }
}

/// Six accelerometer/gyroscope axes plus two trailing derived columns.
fn gait_text(subject: &Subject, steps: usize, noise: &mut Noise) -> String {
    let amp = tremor(subject);
    let mut out = String::new();
    for t in 0..steps {
        let phase = t as f64 * 0.1;
        let mut cells: Vec<String> = (0..6)
            .map(|axis| {
                let v = (phase + axis as f64).sin() + noise.normal(amp);
                format!("{v:.5}")
            })
            .collect();
        cells.push(format!("{:.3}", t as f64 / 100.0));
        cells.push("0".to_string());
        let _ = writeln!(out, "{}", cells.join(" "));
    }
    out
}

fn handwriting_text(subject: &Subject, points: usize, noise: &mut Noise) -> String {
    let amp = tremor(subject);
    let mut out = String::from("x;y;pressure;timestamp\n");
    for i in 0..points {
        let theta = i as f64 * 0.05;
        let r = 10.0 + theta * 2.0;
        let x = r * theta.cos() + noise.normal(amp);
        let y = r * theta.sin() + noise.normal(amp);
        let pressure = 500.0 + noise.normal(40.0 * amp);
        let _ = writeln!(out, "{x:.4};{y:.4};{pressure:.1};{}", i * 10);
    }
    out
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    let mut noise = Noise(42);

    let mut files = 0;
    for subject in SUBJECTS {
        let group = group_dir(subject);
        for task in ["walk", "turn"] {
            let path = root
                .join("gaitRaw")
                .join(group)
                .join(format!("{}_{task}.txt", subject.id));
            write_file(&path, &gait_text(subject, 200, &mut noise))?;
            files += 1;
        }
        for task in ["spiral", "meander"] {
            let path = root
                .join("handwriting")
                .join(group)
                .join(format!("{}_{task}.txt", subject.id));
            write_file(&path, &handwriting_text(subject, 150, &mut noise))?;
            files += 1;
        }
    }

    let metadata_path = root.join("metadata.csv");
    let mut writer = csv::Writer::from_path(&metadata_path)
        .with_context(|| format!("creating {}", metadata_path.display()))?;
    writer.write_record(["ID", "age", "updrs_total"])?;
    for (i, subject) in SUBJECTS.iter().enumerate() {
        let Some(score) = subject.updrs else {
            continue;
        };
        let id = subject.id.trim_end_matches(|c: char| !c.is_ascii_digit());
        writer.write_record([id.to_string(), (55 + i * 3).to_string(), score.to_string()])?;
    }
    writer.flush()?;

    println!(
        "Wrote {files} recordings for {} subjects to {}",
        SUBJECTS.len(),
        root.display()
    );
    Ok(())
}
