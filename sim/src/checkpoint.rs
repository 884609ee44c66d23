//! Checkpoints: per-frame particle state written by the run loop and read back on restart.

use crate::particles::Particles;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Persisted simulation state tagged by frame number.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    pub scene_name: String,
    pub frame: u32,
    /// Simulated time at the end of `frame` (seconds)
    pub time: f64,
    /// Number of active spatial axes (2 or 3)
    pub axes: usize,
    pub particles: Particles,
}

/// `<dir>/restart_<frame>.json`
pub fn checkpoint_path(dir: &Path, frame: u32) -> PathBuf {
    dir.join(format!("restart_{frame}.json"))
}

/// Save a checkpoint to a JSON file, creating the parent directory.
pub fn save_checkpoint(checkpoint: &Checkpoint, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = std::fs::File::create(path).with_context(|| format!("writing {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, checkpoint)?;
    Ok(())
}

/// Load a checkpoint and check it matches the expected dimension.
pub fn load_checkpoint(path: &Path, axes: usize) -> anyhow::Result<Checkpoint> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("no checkpoint at {}", path.display()))?;
    let reader = BufReader::new(file);
    let checkpoint: Checkpoint = serde_json::from_reader(reader)
        .with_context(|| format!("corrupt checkpoint {}", path.display()))?;
    if checkpoint.axes != axes {
        bail!(
            "checkpoint {} is {}D but the run is {}D",
            path.display(),
            checkpoint.axes,
            axes
        );
    }
    Ok(checkpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use tempfile::tempdir;

    fn sample() -> Checkpoint {
        let mut particles = Particles::default();
        particles.push(Vector3::new(0.5, 1.0, 0.0), Vector3::new(0.0, -1.0, 0.0), 2.0);
        Checkpoint {
            scene_name: "plate".into(),
            frame: 4,
            time: 0.16,
            axes: 2,
            particles,
        }
    }

    #[test]
    fn saved_checkpoint_loads_back() {
        let dir = tempdir().unwrap();
        let path = checkpoint_path(&dir.path().join("plate"), 4);
        save_checkpoint(&sample(), &path).unwrap();

        let loaded = load_checkpoint(&path, 2).unwrap();
        assert_eq!(loaded.frame, 4);
        assert_eq!(loaded.particles.len(), 1);
        assert_eq!(loaded.particles.x[0], Vector3::new(0.5, 1.0, 0.0));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let path = checkpoint_path(dir.path(), 4);
        save_checkpoint(&sample(), &path).unwrap();
        let err = load_checkpoint(&path, 3).unwrap_err();
        assert!(err.to_string().contains("2D"), "{err}");
    }

    #[test]
    fn missing_checkpoint_names_the_file() {
        let dir = tempdir().unwrap();
        let err = load_checkpoint(&checkpoint_path(dir.path(), 9), 2).unwrap_err();
        assert!(err.to_string().contains("restart_9.json"), "{err}");
    }
}
