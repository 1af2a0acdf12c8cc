//! Run storage API.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{DiagnosticsReport, ReachScenarioRecord, RunManifest};
use crate::{ResultsError, ResultsResult};

const MANIFEST: &str = "manifest.json";
const RECORDS: &str = "records.jsonl";
const DIAGNOSTICS: &str = "diagnostics.json";

#[derive(Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store under `<study dir>/.tpload/runs`.
    pub fn for_study(study_path: &Path) -> ResultsResult<Self> {
        let study_dir = study_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "study path has no parent directory".to_string(),
            })?;
        let runs_dir = study_dir.join(".tpload").join("runs");
        Self::new(runs_dir)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST).exists()
    }

    /// Write a complete run. The manifest is written last so a partially
    /// written run is never reported by `has_run`.
    pub fn save_run(
        &self,
        manifest: &RunManifest,
        records: &[ReachScenarioRecord],
        diagnostics: &DiagnosticsReport,
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let mut records_content = String::new();
        for record in records {
            let line = serde_json::to_string(record)?;
            records_content.push_str(&line);
            records_content.push('\n');
        }
        fs::write(run_dir.join(RECORDS), records_content)?;

        let diagnostics_json = serde_json::to_string_pretty(diagnostics)?;
        fs::write(run_dir.join(DIAGNOSTICS), diagnostics_json)?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST), manifest_json)?;

        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.existing(run_id, MANIFEST)?;
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_records(&self, run_id: &str) -> ResultsResult<Vec<ReachScenarioRecord>> {
        let path = self.existing(run_id, RECORDS)?;
        let content = fs::read_to_string(path)?;
        let mut records = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                let record: ReachScenarioRecord = serde_json::from_str(line)?;
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn load_diagnostics(&self, run_id: &str) -> ResultsResult<DiagnosticsReport> {
        let path = self.existing(run_id, DIAGNOSTICS)?;
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All stored runs, newest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }

    fn existing(&self, run_id: &str, file: &str) -> ResultsResult<PathBuf> {
        let path = self.run_dir(run_id).join(file);
        if path.exists() {
            Ok(path)
        } else {
            Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            })
        }
    }
}
