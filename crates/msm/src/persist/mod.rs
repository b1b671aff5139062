//! Directory persistence of Markov state models.
//!
//! A saved model is a directory holding a JSON manifest and one file per
//! artifact:
//!
//! ```text
//! model/
//! ├── manifest.json   logical name -> file name
//! ├── config.toml     lag time, sliding window, trim, method
//! ├── tcounts.mtx     Matrix Market counts
//! ├── tprobs.mtx      Matrix Market probabilities
//! ├── mapping.csv     original,trimmed
//! └── eq-probs.dat    one probability per line
//! ```
//!
//! Unfit models store only the manifest and the configuration.

mod config;
mod dense;
pub mod manifest;
mod mapping;
mod mtx;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::config::MsmConfig;
use crate::error::MsmError;
use crate::msm::{FitResult, Msm};
use crate::sparse::SparseMatrix;
use crate::trim::TrimMapping;
pub use manifest::{MANIFEST_FILENAME, Manifest};

/// A value stored as one file of a saved model.
pub trait Artifact: Sized {
    /// Writes `self` to a new file at `path`.
    fn write_file(&self, path: &Path) -> Result<(), MsmError>;

    /// Reads a value from the file at `path`.
    fn read_file(path: &Path) -> Result<Self, MsmError>;
}

/// An artifact encoded through a byte stream.
pub trait StreamArtifact: Sized {
    /// Human-readable name used in error messages.
    const NAME: &'static str;

    /// Encodes `self` into `writer`.
    fn write_to<W: Write>(&self, writer: W) -> Result<(), MsmError>;

    /// Decodes a value from `reader`.
    fn read_from<R: BufRead>(reader: R) -> Result<Self, MsmError>;
}

impl<T: StreamArtifact> Artifact for T {
    fn write_file(&self, path: &Path) -> Result<(), MsmError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn read_file(path: &Path) -> Result<Self, MsmError> {
        Self::read_from(BufReader::new(File::open(path)?))
    }
}

/// Options for [`Msm::save`].
#[derive(Clone, Debug, Default)]
pub struct SaveOptions {
    force: bool,
    archive: bool,
    filenames: BTreeMap<String, String>,
}

impl SaveOptions {
    /// Default options: refuse to overwrite, directory layout, default names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces an existing path when set.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Requests a single-file archive. Saving fails when set.
    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }

    /// Overrides the file name of one logical artifact.
    pub fn with_filename(mut self, key: impl Into<String>, filename: impl Into<String>) -> Self {
        self.filenames.insert(key.into(), filename.into());
        self
    }

    /// Returns whether an existing path is replaced.
    pub fn force(&self) -> bool {
        self.force
    }

    /// Returns whether archive output was requested.
    pub fn archive(&self) -> bool {
        self.archive
    }

    fn manifest(&self, fit: bool) -> Result<Manifest, MsmError> {
        if let Some(key) = self
            .filenames
            .keys()
            .find(|k| manifest::default_filename(k).is_none())
        {
            return Err(MsmError::InconsistentArtifacts {
                reason: format!("unknown artifact {key:?}"),
            });
        }
        let keys = std::iter::once(manifest::CONFIG)
            .chain(manifest::FIT_ARTIFACTS.into_iter().filter(|_| fit));
        let mut manifest = Manifest::default();
        for key in keys {
            let filename = match self.filenames.get(key) {
                Some(name) => name.as_str(),
                None => manifest::default_filename(key).unwrap_or(key),
            };
            manifest.insert(key, filename)?;
        }
        Ok(manifest)
    }
}

fn write_artifacts(msm: &Msm, manifest: &Manifest, dir: &Path) -> Result<(), MsmError> {
    msm.config()
        .write_file(&dir.join(manifest.require(manifest::CONFIG)?))?;
    if let Some(fit) = msm.fit_result() {
        fit.tcounts()
            .write_file(&dir.join(manifest.require(manifest::TCOUNTS)?))?;
        fit.tprobs()
            .write_file(&dir.join(manifest.require(manifest::TPROBS)?))?;
        fit.mapping()
            .write_file(&dir.join(manifest.require(manifest::MAPPING)?))?;
        fit.eq_probs()
            .to_vec()
            .write_file(&dir.join(manifest.require(manifest::EQ_PROBS)?))?;
    }
    manifest.write_file(&dir.join(MANIFEST_FILENAME))
}

fn remove_path(path: &Path) -> Result<(), MsmError> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

impl Msm {
    /// Saves the model as a directory at `path`.
    ///
    /// Artifacts are written into a temporary directory next to `path`,
    /// which is renamed into place once every write succeeded.
    ///
    /// # Errors
    ///
    /// - [`MsmError::Unsupported`] if archive output is requested.
    /// - [`MsmError::AlreadyExists`] if `path` exists and `force` is unset.
    /// - [`MsmError::InconsistentArtifacts`] for unknown or clashing file
    ///   name overrides.
    /// - [`MsmError::Io`] on filesystem failures.
    pub fn save(&self, path: impl AsRef<Path>, options: &SaveOptions) -> Result<(), MsmError> {
        let path = path.as_ref();
        if options.archive() {
            return Err(MsmError::Unsupported {
                feature: "archive output",
            });
        }
        if path.exists() && !options.force() {
            return Err(MsmError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        let manifest = options.manifest(self.is_fit())?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(".mdmsm-save-")
            .tempdir_in(parent)?;
        write_artifacts(self, &manifest, staging.path())?;
        debug!(staging = %staging.path().display(), "wrote model artifacts");

        if path.exists() {
            remove_path(path)?;
        }
        let staged = staging.keep();
        if let Err(e) = fs::rename(&staged, path) {
            let _ = fs::remove_dir_all(&staged);
            return Err(e.into());
        }
        info!(path = %path.display(), fit = self.is_fit(), "saved Markov state model");
        Ok(())
    }

    /// Loads a model saved with [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MsmError> {
        Self::load_with_manifest(path, MANIFEST_FILENAME)
    }

    /// Loads a model whose manifest has a non-default file name.
    ///
    /// # Errors
    ///
    /// - [`MsmError::NotADirectory`] if `path` is not a directory.
    /// - [`MsmError::InconsistentArtifacts`] if the configuration is not
    ///   listed, or only some of the fit artifacts are.
    /// - [`MsmError::Parse`] or [`MsmError::Io`] if an artifact cannot be
    ///   read, and any error of [`FitResult::new`] for mismatched sizes.
    pub fn load_with_manifest(path: impl AsRef<Path>, manifest_name: &str) -> Result<Self, MsmError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(MsmError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        let manifest = Manifest::read_file(&path.join(manifest_name))?;
        let config = MsmConfig::read_file(&path.join(manifest.require(manifest::CONFIG)?))?;

        let listed: Vec<&str> = manifest::FIT_ARTIFACTS
            .into_iter()
            .filter(|key| manifest.contains(key))
            .collect();
        let msm = match listed.len() {
            0 => Msm::new(config)?,
            n if n == manifest::FIT_ARTIFACTS.len() => {
                let file = |key: &str| manifest.require(key).map(|name| path.join(name));
                let fit = FitResult::new(
                    SparseMatrix::read_file(&file(manifest::TCOUNTS)?)?,
                    SparseMatrix::read_file(&file(manifest::TPROBS)?)?,
                    TrimMapping::read_file(&file(manifest::MAPPING)?)?,
                    Vec::<f64>::read_file(&file(manifest::EQ_PROBS)?)?,
                )?;
                Msm::from_fit(config, fit)?
            }
            _ => {
                return Err(MsmError::InconsistentArtifacts {
                    reason: format!("manifest lists only some fit artifacts: {listed:?}"),
                });
            }
        };
        info!(path = %path.display(), fit = msm.is_fit(), "loaded Markov state model");
        Ok(msm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_for_fit_model() {
        let manifest = SaveOptions::new().manifest(true).unwrap();
        let entries: Vec<_> = manifest.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("config", "config.toml"),
                ("eq_probs", "eq-probs.dat"),
                ("mapping", "mapping.csv"),
                ("tcounts", "tcounts.mtx"),
                ("tprobs", "tprobs.mtx"),
            ]
        );
    }

    #[test]
    fn unfit_manifest_lists_only_config() {
        let manifest = SaveOptions::new().manifest(false).unwrap();
        assert_eq!(manifest.iter().count(), 1);
        assert!(manifest.contains(manifest::CONFIG));
    }

    #[test]
    fn filename_overrides() {
        let options = SaveOptions::new().with_filename("tprobs", "probabilities.mtx");
        let manifest = options.manifest(true).unwrap();
        assert_eq!(manifest.get("tprobs"), Some("probabilities.mtx"));

        let unknown = SaveOptions::new().with_filename("tcounts_", "x.mtx");
        assert!(unknown.manifest(true).is_err());

        let clash = SaveOptions::new().with_filename("tprobs", "tcounts.mtx");
        assert!(clash.manifest(true).is_err());
    }
}
