//! The manifest mapping logical artifact names to file names.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::StreamArtifact;
use crate::error::MsmError;

/// Default manifest file name.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Logical name of the configuration artifact.
pub const CONFIG: &str = "config";
/// Logical name of the count matrix artifact.
pub const TCOUNTS: &str = "tcounts";
/// Logical name of the probability matrix artifact.
pub const TPROBS: &str = "tprobs";
/// Logical name of the mapping artifact.
pub const MAPPING: &str = "mapping";
/// Logical name of the equilibrium artifact.
pub const EQ_PROBS: &str = "eq_probs";

/// Artifacts written only for fit models.
pub const FIT_ARTIFACTS: [&str; 4] = [TCOUNTS, TPROBS, MAPPING, EQ_PROBS];

/// Default file name of every logical artifact.
pub fn default_filename(key: &str) -> Option<&'static str> {
    match key {
        CONFIG => Some("config.toml"),
        TCOUNTS => Some("tcounts.mtx"),
        TPROBS => Some("tprobs.mtx"),
        MAPPING => Some("mapping.csv"),
        EQ_PROBS => Some("eq-probs.dat"),
        _ => None,
    }
}

/// Logical name to relative file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    files: BTreeMap<String, String>,
}

impl Manifest {
    /// Adds an entry, rejecting file names that are not plain names inside
    /// the model directory or that collide with another entry.
    pub fn insert(&mut self, key: &str, filename: &str) -> Result<(), MsmError> {
        let plain = Path::new(filename)
            .file_name()
            .is_some_and(|name| name == filename);
        if !plain || filename == MANIFEST_FILENAME {
            return Err(MsmError::InconsistentArtifacts {
                reason: format!("invalid file name {filename:?} for {key}"),
            });
        }
        if let Some((other, _)) = self.files.iter().find(|(k, f)| *f == filename && *k != key) {
            return Err(MsmError::InconsistentArtifacts {
                reason: format!("{key} and {other} share the file name {filename:?}"),
            });
        }
        self.files.insert(key.to_string(), filename.to_string());
        Ok(())
    }

    /// File name of an artifact.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.files.get(key).map(String::as_str)
    }

    /// Returns `true` if the artifact is listed.
    pub fn contains(&self, key: &str) -> bool {
        self.files.contains_key(key)
    }

    /// Iterates over `(key, file name)` entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, f)| (k.as_str(), f.as_str()))
    }

    /// Returns the file name of a required artifact.
    pub(crate) fn require(&self, key: &str) -> Result<&str, MsmError> {
        self.get(key).ok_or_else(|| MsmError::InconsistentArtifacts {
            reason: format!("manifest does not list {key}"),
        })
    }
}

impl StreamArtifact for Manifest {
    const NAME: &'static str = "manifest";

    fn write_to<W: Write>(&self, mut writer: W) -> Result<(), MsmError> {
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| MsmError::Parse {
            artifact: Self::NAME,
            reason: e.to_string(),
        })?;
        writeln!(writer)?;
        Ok(())
    }

    fn read_from<R: BufRead>(reader: R) -> Result<Self, MsmError> {
        let raw: BTreeMap<String, String> =
            serde_json::from_reader(reader).map_err(|e| MsmError::Parse {
                artifact: Self::NAME,
                reason: e.to_string(),
            })?;
        let mut manifest = Manifest::default();
        for (key, filename) in &raw {
            manifest.insert(key, filename)?;
        }
        Ok(manifest)
    }
}
