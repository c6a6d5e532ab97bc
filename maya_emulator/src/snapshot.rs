use std::fs;
use std::path::{Path, PathBuf};

use bitcoin::hashes::{sha256, Hash};

use crate::Error;

/// PNG of an emulator screen, compared for byte equality
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    pub fn new(png: Vec<u8>) -> Self {
        Self(png)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// SHA-256 of the image, short enough to log
    pub fn fingerprint(&self) -> String {
        sha256::Hash::hash(&self.0).to_string()
    }

    /// The emulator returns an empty image before the first screen is drawn
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Snapshot({}, {} bytes)", &self.fingerprint()[..16], self.0.len())
    }
}

/// Directories holding the golden images and the ones taken by the last run.
///
/// The snapshots of a test case `name` are written to `<tmp>/<name>/00000.png`,
/// `00001.png`, ... and compared with the same files under `<golden>/<name>`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    golden: PathBuf,
    tmp: PathBuf,
    record: bool,
}

fn file_name(index: usize) -> String {
    format!("{index:05}.png")
}

impl SnapshotStore {
    /// With `record` the golden images are overwritten instead of compared
    pub fn new(golden: impl Into<PathBuf>, tmp: impl Into<PathBuf>, record: bool) -> Self {
        Self {
            golden: golden.into(),
            tmp: tmp.into(),
            record,
        }
    }

    pub fn golden_dir(&self, name: &str) -> PathBuf {
        self.golden.join(name)
    }

    pub fn tmp_dir(&self, name: &str) -> PathBuf {
        self.tmp.join(name)
    }

    fn write_all(dir: &Path, snapshots: &[Snapshot]) -> Result<(), Error> {
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
        for (i, snapshot) in snapshots.iter().enumerate() {
            fs::write(dir.join(file_name(i)), snapshot.as_bytes())?;
        }
        Ok(())
    }

    /// Store `snapshots` of case `name` and check them against the golden images
    pub fn save_and_compare(&self, name: &str, snapshots: &[Snapshot]) -> Result<(), Error> {
        let tmp = self.tmp_dir(name);
        Self::write_all(&tmp, snapshots)?;
        log::debug!("{} snapshots of '{name}' in {}", snapshots.len(), tmp.display());

        let golden = self.golden_dir(name);
        if self.record {
            log::info!("recording golden snapshots of '{name}'");
            return Self::write_all(&golden, snapshots);
        }
        if !golden.is_dir() {
            return Err(Error::MissingGoldenSnapshots(name.to_string()));
        }

        for (index, snapshot) in snapshots.iter().enumerate() {
            let expected = match fs::read(golden.join(file_name(index))) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(Error::SnapshotMismatch {
                        name: name.to_string(),
                        index,
                    })
                }
                Err(e) => return Err(e.into()),
            };
            if expected != snapshot.as_bytes() {
                log::warn!("'{name}' #{index} differs, got {snapshot:?}");
                return Err(Error::SnapshotMismatch {
                    name: name.to_string(),
                    index,
                });
            }
        }

        // golden images left over mean the flow got shorter
        if golden.join(file_name(snapshots.len())).exists() {
            return Err(Error::SnapshotMismatch {
                name: name.to_string(),
                index: snapshots.len(),
            });
        }
        Ok(())
    }
}
