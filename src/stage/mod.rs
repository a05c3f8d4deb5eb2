//! Source staging: persists submitted text where the interpreter can read it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::RunnerError;

/// Writes submitted source text beneath a staging directory, creating the
/// directory on demand and fully replacing any prior contents.
///
/// The default naming is the fixed `prog.<ext>`, so repeated runs reuse a
/// single well-known path. Isolation mode generates a unique name per call
/// instead, which keeps concurrent runs from overwriting each other's
/// staged file.
#[derive(Debug, Clone)]
pub struct SourceStager {
    dir: PathBuf,
    ext: String,
    isolated: bool,
}

impl SourceStager {
    pub fn new(dir: impl Into<PathBuf>, ext: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            ext: ext.into(),
            isolated: false,
        }
    }

    pub fn with_isolation(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `source` (any text, empty included) as the complete contents
    /// of the staged file and return its path. The file is closed before
    /// this returns, so a process spawned afterwards sees the full text.
    pub fn stage(&self, source: &str) -> Result<PathBuf, RunnerError> {
        fs::create_dir_all(&self.dir).map_err(RunnerError::Stage)?;
        let path = self.dir.join(self.file_name());
        fs::write(&path, source).map_err(RunnerError::Stage)?;
        debug!(path = %path.display(), bytes = source.len(), "staged source");
        Ok(path)
    }

    /// Best-effort removal of a staged file once its run is over.
    pub fn remove(&self, path: &Path) {
        let _ = fs::remove_file(path);
    }

    fn file_name(&self) -> String {
        if self.isolated {
            format!("prog-{}.{}", Uuid::new_v4(), self.ext)
        } else {
            format!("prog.{}", self.ext)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_overwrites_without_residue() {
        let dir = tempfile::tempdir().unwrap();
        let stager = SourceStager::new(dir.path(), "src");

        let p1 = stager.stage("first program, quite long").unwrap();
        let p2 = stager.stage("second").unwrap();

        assert_eq!(p1, p2);
        assert_eq!(fs::read_to_string(&p2).unwrap(), "second");
    }

    #[test]
    fn staging_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("tmp");
        let stager = SourceStager::new(&nested, "src");

        let path = stager.stage("print(1)").unwrap();
        assert!(nested.is_dir());
        assert_eq!(fs::read_to_string(path).unwrap(), "print(1)");
    }

    #[test]
    fn empty_source_is_staged_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let stager = SourceStager::new(dir.path(), "src");

        let path = stager.stage("").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn isolation_yields_a_fresh_path_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let stager = SourceStager::new(dir.path(), "src").with_isolation(true);

        let p1 = stager.stage("one").unwrap();
        let p2 = stager.stage("two").unwrap();

        assert_ne!(p1, p2);
        assert_eq!(fs::read_to_string(&p1).unwrap(), "one");
        assert_eq!(fs::read_to_string(&p2).unwrap(), "two");
    }

    #[test]
    fn remove_is_quiet_for_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let stager = SourceStager::new(dir.path(), "src");

        let path = stager.stage("x").unwrap();
        stager.remove(&path);
        assert!(!path.exists());
        // Second removal of the same path is a no-op.
        stager.remove(&path);
    }

    #[test]
    fn staging_fails_when_directory_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the staging directory should go.
        let blocker = dir.path().join("tmp");
        fs::write(&blocker, "in the way").unwrap();

        let stager = SourceStager::new(&blocker, "src");
        let err = stager.stage("x").unwrap_err();
        assert!(matches!(err, RunnerError::Stage(_)));
    }
}
