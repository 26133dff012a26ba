//! Golfer data consumed by plan regeneration
//!
//! Clubs, shots and course geometry are owned by the persistence
//! collaborator. The sweep only reads them, through [`GolferDataSource`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{Club, Course, CourseId, Shot};

/// Source errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("snapshot I/O error ({0:?}): {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the golfer's bag, practice shots and courses.
pub trait GolferDataSource: Send + Sync {
    /// Clubs in bag order.
    fn clubs(&self) -> Result<Vec<Club>, SourceError>;

    fn shots(&self) -> Result<Vec<Shot>, SourceError>;

    /// Course with holes, or `None` if it does not exist.
    fn course(&self, id: CourseId) -> Result<Option<Course>, SourceError>;
}

/// Point-in-time export of the persistence collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SnapshotSource {
    #[serde(default)]
    pub clubs: Vec<Club>,
    #[serde(default)]
    pub shots: Vec<Shot>,
    #[serde(default)]
    pub courses: Vec<Course>,
}

impl SnapshotSource {
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot JSON file (`{clubs, shots, courses}`).
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| SourceError::Io(path.to_path_buf(), e))?;
        Self::from_json_str(&contents)
    }
}

impl GolferDataSource for SnapshotSource {
    fn clubs(&self) -> Result<Vec<Club>, SourceError> {
        Ok(self.clubs.clone())
    }

    fn shots(&self) -> Result<Vec<Shot>, SourceError> {
        Ok(self.shots.clone())
    }

    fn course(&self, id: CourseId) -> Result<Option<Course>, SourceError> {
        Ok(self.courses.iter().find(|c| c.id == id).cloned())
    }
}
