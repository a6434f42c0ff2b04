//! File management for saved circuits
//!
//! Handles saving, loading, and file state management for circuits.

use crate::constants::file;
use crate::error::{CircuitError, CircuitResult};
use crate::nodes::{Circuit, Node};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Save file data structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub version: String,
    pub metadata: SaveMetadata,
    /// Root nodes with package interiors nested inside them
    pub nodes: Vec<Node>,
}

/// Metadata for save files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub created: String,  // ISO 8601 timestamp
    pub modified: String, // ISO 8601 timestamp
    pub creator: String,
    pub description: String,
}

impl SaveData {
    pub fn new(nodes: Vec<Node>, description: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: file::FORMAT_VERSION.to_string(),
            metadata: SaveMetadata {
                created: now.clone(),
                modified: now,
                creator: file::CREATOR.to_string(),
                description: description.into(),
            },
            nodes,
        }
    }
}

/// Manages file operations for circuits
#[derive(Debug, Default)]
pub struct FileManager {
    /// Current file path (None if unsaved/new file)
    current_file_path: Option<PathBuf>,
    /// Creation time of the current file, kept across saves
    created: Option<String>,
}

impl FileManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_file_path(&self) -> Option<&PathBuf> {
        self.current_file_path.as_ref()
    }

    /// Get display name for the current file
    pub fn get_file_display_name(&self) -> String {
        match &self.current_file_path {
            Some(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("Unknown")
                .to_string(),
            None => "Untitled".to_string(),
        }
    }

    /// Forget the current file
    pub fn new_file(&mut self) {
        self.current_file_path = None;
        self.created = None;
    }

    /// Save every root node of `circuit` to a file
    pub fn save_to_file(&mut self, file_path: &Path, circuit: &Circuit, description: &str) -> CircuitResult<()> {
        let mut save_data = SaveData::new(circuit.snapshot(), description);
        if let Some(created) = &self.created {
            save_data.metadata.created = created.clone();
        }

        let json_content = serde_json::to_string_pretty(&save_data)?;
        std::fs::write(file_path, json_content)?;

        info!(
            "Saved {} root nodes to {}",
            save_data.nodes.len(),
            file_path.display()
        );
        self.current_file_path = Some(file_path.to_path_buf());
        self.created = Some(save_data.metadata.created);
        Ok(())
    }

    /// Load a save file. The caller decides whether to build a circuit from
    /// the nodes and whether to reset it.
    pub fn load_from_file(&mut self, file_path: &Path) -> CircuitResult<SaveData> {
        let file_content = std::fs::read_to_string(file_path)?;
        let save_data: SaveData = serde_json::from_str(&file_content)?;

        if !file::SUPPORTED_VERSIONS.contains(&save_data.version.as_str()) {
            return Err(CircuitError::UnsupportedVersion(save_data.version));
        }

        info!(
            "Loaded {} root nodes from {} ({})",
            save_data.nodes.len(),
            file_path.display(),
            save_data.metadata.creator
        );
        self.current_file_path = Some(file_path.to_path_buf());
        self.created = Some(save_data.metadata.created.clone());
        Ok(save_data)
    }

    /// Save to the current path
    pub fn save_file(&mut self, circuit: &Circuit, description: &str) -> CircuitResult<()> {
        match self.current_file_path.clone() {
            Some(path) => self.save_to_file(&path, circuit, description),
            None => Err(CircuitError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no file path set, use save_to_file",
            ))),
        }
    }
}
