use crate::execution::ExecutionState;
use crate::model::RotationSchedule;
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub trait Storage {
    /// Charge un planning depuis un support.
    fn load(&self) -> anyhow::Result<RotationSchedule>;
    /// Sauvegarde de manière atomique.
    fn save(&self, schedule: &RotationSchedule) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<RotationSchedule> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let schedule: RotationSchedule = serde_json::from_slice(&data)
            .with_context(|| format!("parsing schedule {}", self.path.display()))?;
        Ok(schedule)
    }

    fn save(&self, schedule: &RotationSchedule) -> anyhow::Result<()> {
        write_json_atomic(&self.path, schedule)
    }
}

/// Archive l'état final d'une exécution (historique des séances, alertes).
pub fn save_archive<P: AsRef<Path>>(path: P, state: &ExecutionState) -> anyhow::Result<()> {
    write_json_atomic(path.as_ref(), state)
}

pub fn load_archive<P: AsRef<Path>>(path: P) -> anyhow::Result<ExecutionState> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing archive {}", path.display()))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).with_context(|| "atomic rename")?;
    Ok(())
}
