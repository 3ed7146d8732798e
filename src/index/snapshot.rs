//! On-disk embedding snapshot (bincode).
//!
//! Produced by the offline pipeline, one row per recipe in metadata-store order.

use crate::types::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Recipe embeddings, row `n` belongs to `RecipeRef(n)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSnapshot {
    pub dimensions: usize,
    pub vectors: Vec<Vec<f32>>,
}

impl VectorSnapshot {
    /// Create snapshot, checking every row has `dimensions` entries.
    pub fn new(dimensions: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        let snapshot = Self { dimensions, vectors };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Load snapshot from `path`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::IoError`/`BincodeError` on unreadable files and
    /// `EngineError::DimensionMismatch` on ragged rows
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let snapshot: Self = bincode::deserialize_from(reader)?;
        snapshot.validate()?;
        tracing::info!(
            path = %path.as_ref().display(),
            vectors = snapshot.vectors.len(),
            dimensions = snapshot.dimensions,
            "Loaded vector snapshot"
        );
        Ok(snapshot)
    }

    /// Write snapshot to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(EngineError::ConfigError("Snapshot dimension must be > 0".to_string()));
        }
        match self.vectors.iter().find(|v| v.len() != self.dimensions) {
            Some(bad) => Err(EngineError::DimensionMismatch {
                expected: self.dimensions,
                got: bad.len(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recipes.vec");

        let snapshot = VectorSnapshot::new(2, vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        snapshot.save(&path).unwrap();

        assert_eq!(VectorSnapshot::load(&path).unwrap(), snapshot);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(VectorSnapshot::new(2, vec![vec![1.0, 0.0], vec![1.0]]).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = VectorSnapshot::load(dir.path().join("absent.vec")).unwrap_err();
        assert!(matches!(err, EngineError::IoError(_)));
    }
}
