// Integration test utilities
//
// Writes small svmlight periods, detection stores and configs into a
// temporary directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Content hash of sample `n`
pub fn sample_id(n: usize) -> String {
    format!("{:064x}", n)
}

pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, body: &str) -> PathBuf {
        let p = self.path(name);
        fs::write(&p, body).unwrap();
        p
    }

    /// Separable training split: malicious rows set feature 1, benign feature 2
    pub fn train_file(&self, name: &str, n: usize) -> PathBuf {
        let mut body = String::new();
        for i in 0..n {
            if i % 2 == 0 {
                body.push_str(&format!("1 1:1 3:{}\n", i % 3));
            } else {
                body.push_str(&format!("0 2:1 3:{}\n", i % 3));
            }
        }
        self.write(name, &body)
    }

    /// Test split dated in `month` with `malicious` + `benign` samples
    ///
    /// Malicious sample k carries id `sample_id(id_offset + k)`.
    pub fn test_file(&self, name: &str, month: u32, malicious: usize, benign: usize, id_offset: usize) -> PathBuf {
        let mut body = String::new();
        for k in 0..malicious {
            body.push_str(&format!(
                "1 1:1 # 2014/{:02}/{:02}/{}.pdf\n",
                month,
                1 + k % 28,
                sample_id(id_offset + k)
            ));
        }
        for k in 0..benign {
            body.push_str(&format!(
                "0 2:1 # 2014/{:02}/{:02}/{}.pdf\n",
                month,
                1 + k % 28,
                sample_id(10_000 + id_offset + k)
            ));
        }
        self.write(name, &body)
    }

    /// Detection store where `AV1` flags the given samples
    pub fn store(&self, name: &str, flagged: &[usize]) -> PathBuf {
        let entries: Vec<String> = flagged
            .iter()
            .map(|&n| format!("\"{}\": {{\"report\": {{\"AV1\": true, \"AV2\": false}}}}", sample_id(n)))
            .collect();
        self.write(name, &format!("{{{}}}", entries.join(", ")))
    }

    /// Small, seeded forest configuration
    pub fn fast_config(&self) -> PathBuf {
        self.write("exp.toml", "seed = 42\n\n[forest]\nn_trees = 10\n")
    }
}

pub fn arg(p: &Path) -> String {
    p.to_string_lossy().to_string()
}
