use crate::error::{TunerError, TunerResult};
use crate::setting::{RunId, ROOT_RUN};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::TempDir;
use tracing::debug;

static ARTIFACT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(pat|log|in)$").expect("static regex"));

/// Kinds of per-run files kept in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Patterns,
    Log,
    Parameters,
}

impl Artifact {
    fn extension(self) -> &'static str {
        match self {
            Artifact::Patterns => "pat",
            Artifact::Log => "log",
            Artifact::Parameters => "in",
        }
    }
}

/// Scoped directory holding `<run_id>.{pat,log,in}` for every live run.
/// Removed from disk when dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create() -> TunerResult<Self> {
        let dir = tempfile::Builder::new().prefix("patgen-tuner-").tempdir()?;
        File::create(dir.path().join(format!("{}.pat", ROOT_RUN)))?;
        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn artifact(&self, run_id: RunId, kind: Artifact) -> PathBuf {
        self.dir
            .path()
            .join(format!("{}.{}", run_id, kind.extension()))
    }

    /// Run ids that currently have a pattern file on disk.
    pub fn runs(&self) -> TunerResult<BTreeSet<RunId>> {
        let mut ids = BTreeSet::new();
        for entry in fs::read_dir(self.path())? {
            let name = entry?.file_name();
            if let Some((id, Artifact::Patterns)) = parse_artifact_name(&name.to_string_lossy()) {
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    /// Deletes every artifact whose run id is not in `keep`. The root
    /// pattern file always survives. Returns the number of files removed.
    pub fn remove_except(&self, keep: &BTreeSet<RunId>) -> TunerResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(self.path())? {
            let entry = entry?;
            let name = entry.file_name();
            let Some((id, _)) = parse_artifact_name(&name.to_string_lossy()) else {
                continue;
            };
            if id == ROOT_RUN || keep.contains(&id) {
                continue;
            }
            fs::remove_file(entry.path())?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Moves the pattern file of `run_id` to `dest`, copying when a rename
    /// across filesystems is refused.
    pub fn move_patterns(&self, run_id: RunId, dest: &Path) -> TunerResult<()> {
        let src = self.artifact(run_id, Artifact::Patterns);
        if !src.is_file() {
            return Err(TunerError::Config(format!(
                "No pattern file for run {} in workspace",
                run_id
            )));
        }
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if fs::rename(&src, dest).is_err() {
            fs::copy(&src, dest)?;
            fs::remove_file(&src)?;
        }
        Ok(())
    }
}

fn parse_artifact_name(name: &str) -> Option<(RunId, Artifact)> {
    let caps = ARTIFACT_NAME.captures(name)?;
    let id = caps[1].parse().ok()?;
    let kind = match &caps[2] {
        "pat" => Artifact::Patterns,
        "log" => Artifact::Log,
        _ => Artifact::Parameters,
    };
    Some((id, kind))
}
