//! Local Fallback Store
//!
//! File-backed persistence for workflow schemas, used as the write
//! fallback when the remote API is unreachable and as a read cache.
//!
//! Schemas are saved to `.formflow/workflows/{id}.json` in the working
//! directory (or a custom root).

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::schema::WorkflowSchema;

use super::StoreError;

/// Default directory for locally persisted schemas.
const DEFAULT_ROOT: &str = ".formflow/workflows";

/// File-backed schema store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Creates a store rooted at the default namespace directory.
    pub fn new() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
        }
    }

    /// Creates a store rooted at a custom directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persists a schema as pretty JSON.
    pub fn save(&self, schema: &WorkflowSchema) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;

        let path = self.schema_path(&schema.id);
        let json = serde_json::to_string_pretty(schema)?;
        fs::write(&path, json)?;

        info!("Saved workflow '{}' to {}", schema.id, path.display());
        Ok(())
    }

    /// Loads a schema by id.
    pub fn load(&self, id: &str) -> Result<WorkflowSchema, StoreError> {
        let path = self.schema_path(id);
        let content = fs::read_to_string(&path).map_err(|_| StoreError::NotFound(id.to_string()))?;
        let schema: WorkflowSchema = serde_json::from_str(&content)?;

        debug!("Loaded workflow '{}' from {}", id, path.display());
        Ok(schema)
    }

    /// Deletes a schema file if present.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.schema_path(id);
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Deleted local workflow file {}", path.display());
        }
        Ok(())
    }

    /// Loads every schema in the store.
    ///
    /// Unreadable files are skipped with a warning rather than failing
    /// the whole listing.
    pub fn list(&self) -> Result<Vec<WorkflowSchema>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut schemas = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|content| Ok(serde_json::from_str::<WorkflowSchema>(&content)?))
            {
                Ok(schema) => schemas.push(schema),
                Err(e) => warn!("Skipping unreadable schema file {}: {}", path.display(), e),
            }
        }

        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schemas)
    }

    /// Returns the file path for a schema id.
    fn schema_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize(id)))
    }

    /// Exposes the root directory (used in diagnostics).
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps ids filesystem-safe; anything outside [A-Za-z0-9._-] becomes '_'.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
