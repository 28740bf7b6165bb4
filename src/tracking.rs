//! File-backed store of experiment runs.
//!
//! All runs live in a single `runs.json` document under the store directory.
//! Artifacts are copied next to it, into one sub-directory per run id, so a
//! run record stays usable after the experiment's output directory is
//! cleaned up.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DATABASE_FILE: &str = "runs.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub name: String,
    /// Where the experiment wrote the file.
    pub source: PathBuf,
    /// The copy owned by the store.
    pub stored: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: u64,
    pub experiment: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub stop_time: Option<DateTime<Utc>>,
    pub config: serde_json::Value,
    pub info: BTreeMap<String, f64>,
    pub result: Option<f64>,
    pub artifacts: Vec<ArtifactRecord>,
    pub comment: Option<String>,
    pub fail_trace: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    runs: Vec<RunRecord>,
}

#[derive(Debug)]
pub struct RunStore {
    dir: PathBuf,
    database: Database,
}

impl RunStore {
    /// Opens the store at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let path = dir.join(DATABASE_FILE);
        let database = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            serde_json::from_str(&text).map_err(|e| Error::json(&path, e))?
        } else {
            Database::default()
        };

        Ok(Self { dir, database })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn runs(&self) -> &[RunRecord] {
        &self.database.runs
    }

    pub fn get(&self, id: u64) -> Option<&RunRecord> {
        self.database.runs.iter().find(|run| run.id == id)
    }

    /// Records a new run in the `RUNNING` state and returns its id.
    pub fn start_run(
        &mut self,
        experiment: &str,
        config: serde_json::Value,
        comment: Option<String>,
    ) -> Result<u64> {
        let id = self.database.runs.iter().map(|run| run.id).max().unwrap_or(0) + 1;

        self.database.runs.push(RunRecord {
            id,
            experiment: experiment.to_string(),
            status: RunStatus::Running,
            start_time: Utc::now(),
            stop_time: None,
            config,
            info: BTreeMap::new(),
            result: None,
            artifacts: Vec::new(),
            comment,
            fail_trace: None,
        });
        self.flush()?;

        Ok(id)
    }

    pub fn update_info(&mut self, id: u64, key: &str, value: f64) -> Result<()> {
        self.run_mut(id)?.info.insert(key.to_string(), value);
        self.flush()
    }

    /// Copies `path` into the store and links it to run `id` under `name`.
    pub fn add_artifact(&mut self, id: u64, name: &str, path: &Path) -> Result<PathBuf> {
        // fail on unknown ids before touching the filesystem
        self.run_mut(id)?;

        let file_name = path
            .file_name()
            .ok_or_else(|| Error::InvalidConfig(format!("artifact path {} has no file name", path.display())))?;
        let run_dir = self.dir.join(id.to_string());
        fs::create_dir_all(&run_dir).map_err(|e| Error::io(&run_dir, e))?;

        let stored = run_dir.join(file_name);
        fs::copy(path, &stored).map_err(|e| Error::io(path, e))?;

        self.run_mut(id)?.artifacts.push(ArtifactRecord {
            name: name.to_string(),
            source: path.to_path_buf(),
            stored: stored.clone(),
        });
        self.flush()?;

        Ok(stored)
    }

    pub fn complete_run(&mut self, id: u64, result: Option<f64>) -> Result<()> {
        let run = self.run_mut(id)?;
        run.status = RunStatus::Completed;
        run.stop_time = Some(Utc::now());
        run.result = result;
        self.flush()
    }

    pub fn fail_run(&mut self, id: u64, trace: &str) -> Result<()> {
        let run = self.run_mut(id)?;
        run.status = RunStatus::Failed;
        run.stop_time = Some(Utc::now());
        run.fail_trace = Some(trace.to_string());
        self.flush()
    }

    fn run_mut(&mut self, id: u64) -> Result<&mut RunRecord> {
        self.database
            .runs
            .iter_mut()
            .find(|run| run.id == id)
            .ok_or(Error::UnknownRun(id))
    }

    /// Rewrites the database through a temporary file so readers never see a
    /// partial document.
    fn flush(&self) -> Result<()> {
        let path = self.dir.join(DATABASE_FILE);
        let tmp = self.dir.join(format!("{}.tmp", DATABASE_FILE));

        let text = serde_json::to_string_pretty(&self.database).map_err(|e| Error::json(&path, e))?;
        fs::write(&tmp, text).map_err(|e| Error::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| Error::io(&path, e))
    }
}
