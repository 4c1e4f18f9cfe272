#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use pop_pyramid::data::PopulationAgeGroup;
use pop_pyramid::pipeline::{ParseResult, ParsedPopulation};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Unwraps a successful parse, failing the test with the error code otherwise.
pub fn expect_success(result: ParseResult) -> ParsedPopulation {
    match result {
        ParseResult::Success(parsed) => parsed,
        ParseResult::Failure { error } => panic!("expected success, got {error}"),
    }
}

/// `(label, male, female)` triples for compact assertions.
pub fn summarize(groups: &[PopulationAgeGroup]) -> Vec<(String, f64, f64)> {
    groups
        .iter()
        .map(|g| (g.age.clone(), g.male, g.female))
        .collect()
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}
