//! Record Edit Sessions
//!
//! Orchestrates loading a workflow schema and an existing record for
//! edit mode, with the ordering guarantees the UI depends on:
//!
//! - a given (workflow, record) pair is fetched at most once per
//!   session, even when the triggering event fires twice;
//! - reconciliation runs only once both the schema and the record have
//!   fully arrived — a partial artifact is never merged;
//! - a delayed repair pass re-checks country-like fields once, after a
//!   short fixed delay, without refetching anything;
//! - teardown discards the effect of any still-in-flight operation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};

use crate::form::{FormValueMap, Wizard};
use crate::reconcile::{reconcile, repair_country_fields, ExternalRecord, Reconciliation};
use crate::schema::WorkflowSchema;

use super::store::WorkflowStore;
use super::StoreError;

/// Delay before the country-field repair pass runs.
const REPAIR_DELAY: Duration = Duration::from_millis(400);

/// Outcome of a load trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Both artifacts arrived and were reconciled
    Loaded,
    /// This (workflow, record) pair is already loading or loaded
    DuplicateTrigger,
    /// The session was torn down while the fetch was in flight
    Discarded,
}

/// Mutable session state behind the shared handle.
struct SessionState {
    schema: Option<WorkflowSchema>,
    record: Option<ExternalRecord>,
    values: FormValueMap,
    reconciliation: Option<Reconciliation>,
    repair_done: bool,
    epoch: u64,
    loads: HashSet<(String, String)>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            schema: None,
            record: None,
            values: FormValueMap::new(),
            reconciliation: None,
            repair_done: false,
            epoch: 0,
            loads: HashSet::new(),
        }
    }
}

/// One edit-mode session over a (workflow, record) pair.
pub struct EditSession {
    store: Arc<WorkflowStore>,
    state: Arc<Mutex<SessionState>>,
}

impl EditSession {
    /// Creates a session over a store.
    pub fn new(store: Arc<WorkflowStore>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(SessionState::new())),
        }
    }

    /// Loads the schema and record, then reconciles.
    ///
    /// The schema read goes through the store (local-cache fallback);
    /// the record read is remote-only, and its failure is a blocking
    /// [`StoreError::RecordLoad`] — presenting a blank edit form as if
    /// it were a new record would silently lose existing data.
    pub async fn load(
        &self,
        workflow_id: &str,
        record_id: &str,
    ) -> Result<LoadOutcome, StoreError> {
        let epoch = match self.begin_load(workflow_id, record_id) {
            Some(epoch) => epoch,
            None => {
                debug!(
                    "Duplicate load trigger for ({}, {}) suppressed",
                    workflow_id, record_id
                );
                return Ok(LoadOutcome::DuplicateTrigger);
            }
        };

        let loaded = async {
            let schema = self.store.get_by_id(workflow_id).await?;
            let record = self
                .store
                .api()
                .get_record(workflow_id, record_id)
                .await
                .map_err(|e| StoreError::RecordLoad {
                    workflow_id: workflow_id.to_string(),
                    record_id: record_id.to_string(),
                    message: e.to_string(),
                })?;
            Ok::<_, StoreError>((schema, record))
        }
        .await;

        match loaded {
            Ok((schema, record)) => {
                if self.complete_load(epoch, schema, record) {
                    Ok(LoadOutcome::Loaded)
                } else {
                    Ok(LoadOutcome::Discarded)
                }
            }
            Err(e) => {
                // Release the token so the user may retry the load
                self.release_load(workflow_id, record_id);
                Err(e)
            }
        }
    }

    /// Runs the delayed repair pass.
    ///
    /// Sleeps for the fixed delay, then — if the session is still alive
    /// and reconciliation completed — gives country-labelled fields one
    /// more resolution attempt against the already-loaded record. Runs
    /// at most once per session; returns the field ids it populated.
    pub async fn run_repair_pass(&self) -> Vec<String> {
        let epoch = match self.state.lock() {
            Ok(state) => {
                if state.reconciliation.is_none() || state.repair_done {
                    return Vec::new();
                }
                state.epoch
            }
            Err(_) => return Vec::new(),
        };

        tokio::time::sleep(REPAIR_DELAY).await;

        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return Vec::new(),
        };

        if state.epoch != epoch {
            debug!("Repair pass discarded: session torn down during delay");
            return Vec::new();
        }
        if state.repair_done || state.reconciliation.is_none() {
            return Vec::new();
        }
        state.repair_done = true;

        let (schema, record) = match (state.schema.clone(), state.record.clone()) {
            (Some(schema), Some(record)) => (schema, record),
            _ => return Vec::new(),
        };

        let repaired = repair_country_fields(&schema, &record, &mut state.values);
        if !repaired.is_empty() {
            info!("Repair pass populated {} field(s)", repaired.len());
        }
        repaired
    }

    /// Tears the session down: any in-flight fetch or pending repair
    /// pass observes the epoch change and discards its effect.
    pub fn teardown(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.epoch += 1;
            debug!("Session torn down (epoch {})", state.epoch);
        }
    }

    /// True once both artifacts are loaded and reconciled.
    pub fn is_ready(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.reconciliation.is_some())
            .unwrap_or(false)
    }

    /// Snapshot of the current form values.
    pub fn values(&self) -> FormValueMap {
        self.state
            .lock()
            .map(|s| s.values.clone())
            .unwrap_or_default()
    }

    /// The reconciliation report, once available.
    pub fn reconciliation(&self) -> Option<Reconciliation> {
        self.state.lock().ok().and_then(|s| s.reconciliation.clone())
    }

    /// Applies a mutation against the latest value state.
    ///
    /// All edits go through here so they are derived from the current
    /// map rather than a stale snapshot captured before an async
    /// completion landed.
    pub fn update_values(&self, mutate: impl FnOnce(&mut FormValueMap)) {
        if let Ok(mut state) = self.state.lock() {
            mutate(&mut state.values);
        }
    }

    /// Builds a wizard over the loaded schema and reconciled values.
    pub fn wizard(&self) -> Option<Wizard> {
        let state = self.state.lock().ok()?;
        let schema = state.schema.clone()?;
        Some(Wizard::with_values(schema, state.values.clone()))
    }

    /// Registers a load trigger; `None` when the pair already loaded.
    fn begin_load(&self, workflow_id: &str, record_id: &str) -> Option<u64> {
        let mut state = self.state.lock().ok()?;
        let key = (workflow_id.to_string(), record_id.to_string());
        if !state.loads.insert(key) {
            return None;
        }
        Some(state.epoch)
    }

    /// Drops a load token after a failed fetch so a retry can proceed.
    fn release_load(&self, workflow_id: &str, record_id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state
                .loads
                .remove(&(workflow_id.to_string(), record_id.to_string()));
        }
    }

    /// Installs both artifacts and reconciles.
    ///
    /// Returns false — leaving the session untouched — when the epoch
    /// moved while the fetch was in flight.
    fn complete_load(&self, epoch: u64, schema: WorkflowSchema, record: ExternalRecord) -> bool {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => {
                warn!("Session state poisoned, discarding load");
                return false;
            }
        };

        if state.epoch != epoch {
            info!("Discarding load completion for a torn-down session");
            return false;
        }

        state.schema = Some(schema);
        state.record = Some(record);

        // Both artifacts present: reconcile now, never earlier
        let (schema, record) = match (&state.schema, &state.record) {
            (Some(schema), Some(record)) => (schema.clone(), record.clone()),
            _ => return false,
        };

        let report = reconcile(&schema, &record, &mut state.values);
        state.reconciliation = Some(report);
        true
    }
}
