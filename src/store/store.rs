//! Workflow Store
//!
//! Remote-primary, local-fallback CRUD for workflow schemas. Every
//! mutating call first attempts the remote API; on any failure the
//! equivalent operation runs against the local file store and the
//! caller gets a non-fatal warning instead of an error — a user's edit
//! is never lost just because the network call failed, but the caller
//! is told the write is not yet durable remotely.

use chrono::Utc;
use log::{info, warn};

use crate::schema::{Step, WorkflowSchema};

use super::api::ApiClient;
use super::local::LocalStore;
use super::StoreError;

/// Partial update applied by [`WorkflowStore::update`].
///
/// `id` and `created_at` are not patchable; `updated_at` is always
/// refreshed by the store.
#[derive(Debug, Clone, Default)]
pub struct SchemaPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub steps: Option<Vec<Step>>,
    pub connected_workflows: Option<Vec<String>>,
}

/// Result of a mutating store call.
#[derive(Debug, Clone)]
pub struct Saved {
    /// The schema as persisted
    pub schema: WorkflowSchema,
    /// True when the remote write succeeded
    pub durable: bool,
    /// Set when the write only reached local storage
    pub warning: Option<String>,
}

/// Remote-primary / local-fallback schema store.
pub struct WorkflowStore {
    api: ApiClient,
    local: LocalStore,
}

impl WorkflowStore {
    /// Creates a store over an API client and a local fallback store.
    pub fn new(api: ApiClient, local: LocalStore) -> Self {
        Self { api, local }
    }

    /// Creates a schema.
    pub async fn create(&self, mut schema: WorkflowSchema) -> Result<Saved, StoreError> {
        schema.renumber_steps();
        schema.touch();

        match self.api.create_workflow(&schema).await {
            Ok(persisted) => {
                // Refresh the cache so offline reads see the latest
                if let Err(e) = self.local.save(&persisted) {
                    warn!("Failed to refresh local cache: {}", e);
                }
                Ok(Saved {
                    schema: persisted,
                    durable: true,
                    warning: None,
                })
            }
            Err(e) => {
                warn!("Remote create failed, falling back to local store: {}", e);
                self.local.save(&schema)?;
                Ok(Saved {
                    schema,
                    durable: false,
                    warning: Some(format!("Saved locally only: {}", e)),
                })
            }
        }
    }

    /// Applies a partial update to a schema.
    ///
    /// Preserves `id` and `created_at` unconditionally, refreshes
    /// `updated_at`, and renumbers steps so the ordering invariant
    /// holds after any step mutation in the patch.
    pub async fn update(&self, id: &str, patch: SchemaPatch) -> Result<Saved, StoreError> {
        let current = self.get_by_id(id).await?;
        let mut updated = apply_patch(current, patch);

        match self.api.update_workflow(id, &updated).await {
            Ok(mut persisted) => {
                // The server echo must not be allowed to violate the
                // identity guarantees either
                persisted.id = updated.id.clone();
                persisted.created_at = updated.created_at;
                if let Err(e) = self.local.save(&persisted) {
                    warn!("Failed to refresh local cache: {}", e);
                }
                Ok(Saved {
                    schema: persisted,
                    durable: true,
                    warning: None,
                })
            }
            Err(e) => {
                warn!("Remote update failed, falling back to local store: {}", e);
                updated.touch();
                self.local.save(&updated)?;
                Ok(Saved {
                    schema: updated,
                    durable: false,
                    warning: Some(format!("Saved locally only: {}", e)),
                })
            }
        }
    }

    /// Deletes a schema remotely and from the local cache.
    pub async fn delete(&self, id: &str) -> Result<Option<String>, StoreError> {
        let warning = match self.api.delete_workflow(id).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Remote delete failed, deleting locally only: {}", e);
                Some(format!("Deleted locally only: {}", e))
            }
        };

        self.local.delete(id)?;
        Ok(warning)
    }

    /// Fetches a schema, falling back to the local cache.
    pub async fn get_by_id(&self, id: &str) -> Result<WorkflowSchema, StoreError> {
        match self.api.get_workflow(id).await {
            Ok(schema) => {
                if let Err(e) = self.local.save(&schema) {
                    warn!("Failed to refresh local cache: {}", e);
                }
                Ok(schema)
            }
            Err(e) => {
                info!("Remote fetch of '{}' failed ({}), trying local cache", id, e);
                self.local.load(id)
            }
        }
    }

    /// Lists all schemas, falling back to the local cache.
    pub async fn get_all(&self) -> Result<Vec<WorkflowSchema>, StoreError> {
        match self.api.list_workflows(false).await {
            Ok(schemas) => Ok(schemas),
            Err(e) => {
                info!("Remote list failed ({}), using local cache", e);
                self.local.list()
            }
        }
    }

    /// Lists schemas selectable for new records.
    pub async fn get_active(&self) -> Result<Vec<WorkflowSchema>, StoreError> {
        match self.api.list_workflows(true).await {
            Ok(schemas) => Ok(schemas),
            Err(e) => {
                info!("Remote list failed ({}), using local cache", e);
                Ok(self
                    .local
                    .list()?
                    .into_iter()
                    .filter(|s| s.is_active)
                    .collect())
            }
        }
    }

    /// The underlying API client (shared with the edit-session loader).
    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

/// Merges a patch into a schema, keeping identity fields intact.
fn apply_patch(mut schema: WorkflowSchema, patch: SchemaPatch) -> WorkflowSchema {
    if let Some(name) = patch.name {
        schema.name = name;
    }
    if let Some(description) = patch.description {
        schema.description = description;
    }
    if let Some(is_active) = patch.is_active {
        schema.is_active = is_active;
    }
    if let Some(steps) = patch.steps {
        schema.steps = steps;
    }
    if let Some(connected) = patch.connected_workflows {
        schema.connected_workflows = connected;
    }

    schema.renumber_steps();
    schema.updated_at = Utc::now();
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType};
    use tempfile::tempdir;

    /// A client against a port nothing listens on: every remote call
    /// fails fast, exercising the fallback paths.
    fn unreachable_api() -> ApiClient {
        ApiClient::new("http://127.0.0.1:1")
    }

    fn sample(name: &str) -> WorkflowSchema {
        WorkflowSchema::from_steps(
            name,
            vec![Step::new("s1", "Step").with_field(Field::new("f1", FieldType::Text, "F1"))],
        )
    }

    #[tokio::test]
    async fn test_create_falls_back_to_local() {
        let dir = tempdir().unwrap();
        let store = WorkflowStore::new(unreachable_api(), LocalStore::with_root(dir.path()));

        let saved = store.create(sample("Offline")).await.unwrap();

        assert!(!saved.durable);
        assert!(saved.warning.is_some());

        // The schema is readable back from the fallback store
        let loaded = store.get_by_id(&saved.schema.id).await.unwrap();
        assert_eq!(loaded.name, "Offline");
    }

    #[tokio::test]
    async fn test_update_preserves_identity() {
        let dir = tempdir().unwrap();
        let store = WorkflowStore::new(unreachable_api(), LocalStore::with_root(dir.path()));

        let saved = store.create(sample("Before")).await.unwrap();
        let id = saved.schema.id.clone();
        let created_at = saved.schema.created_at;

        let updated = store
            .update(
                &id,
                SchemaPatch {
                    name: Some("After".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.schema.id, id);
        assert_eq!(updated.schema.created_at, created_at);
        assert_eq!(updated.schema.name, "After");
        assert!(updated.schema.updated_at >= created_at);
        assert!(!updated.durable);
    }

    #[tokio::test]
    async fn test_update_renumbers_patched_steps() {
        let dir = tempdir().unwrap();
        let store = WorkflowStore::new(unreachable_api(), LocalStore::with_root(dir.path()));

        let saved = store.create(sample("W")).await.unwrap();

        let mut new_steps = vec![Step::new("b", "B"), Step::new("a", "A")];
        new_steps[0].order = 9;
        new_steps[1].order = 4;

        let updated = store
            .update(
                &saved.schema.id,
                SchemaPatch {
                    steps: Some(new_steps),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let orders: Vec<u32> = updated.schema.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_update_missing_schema() {
        let dir = tempdir().unwrap();
        let store = WorkflowStore::new(unreachable_api(), LocalStore::with_root(dir.path()));

        let result = store.update("ghost", SchemaPatch::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_falls_back_with_warning() {
        let dir = tempdir().unwrap();
        let store = WorkflowStore::new(unreachable_api(), LocalStore::with_root(dir.path()));

        let saved = store.create(sample("Doomed")).await.unwrap();
        let warning = store.delete(&saved.schema.id).await.unwrap();

        assert!(warning.is_some());
        assert!(store.get_by_id(&saved.schema.id).await.is_err());
    }

    #[tokio::test]
    async fn test_get_active_filters_local_cache() {
        let dir = tempdir().unwrap();
        let store = WorkflowStore::new(unreachable_api(), LocalStore::with_root(dir.path()));

        let mut inactive = sample("Inactive");
        inactive.is_active = false;
        store.create(inactive).await.unwrap();
        store.create(sample("Active")).await.unwrap();

        let active = store.get_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Active");
    }
}
