//! JSON file snapshot backend.
//!
//! # Invariants
//! - Writes go to `<file>.tmp` first and are renamed over the target, so a
//!   crash mid-write leaves the previous document in place.
//! - A missing file reads as "nothing persisted".

use crate::repo::snapshot::{SnapshotBackend, SnapshotError, SnapshotResult};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Snapshot backend storing one JSON document per file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl SnapshotBackend for JsonFileBackend {
    fn kind(&self) -> &'static str {
        "json_file"
    }

    fn read(&self) -> SnapshotResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(document) => Ok(Some(document)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SnapshotError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, document: &str) -> SnapshotResult<()> {
        let io_err = |path: &Path, source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| io_err(dir, source))?;
        }

        let tmp = self.temp_path();
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(document.as_bytes())?;
            file.sync_all()
        });
        if let Err(source) = written {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(&tmp, source));
        }

        if let Err(source) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(&self.path, source));
        }
        Ok(())
    }
}
