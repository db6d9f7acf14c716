//! Workflow Connector Canvas
//!
//! Lets an operator compose a directed graph of workflows (node = a
//! workflow, edge = "run next after completion"). The canvas is a
//! convenience view: the authoritative data is each workflow's
//! `connected_workflows` list, and saving the canvas writes that field
//! back on every affected schema. Node and edge edits stay local until
//! a save is triggered; nothing persists incrementally mid-edit.

use std::collections::HashSet;

use log::{info, warn};

use crate::schema::WorkflowSchema;
use crate::store::{Saved, SchemaPatch, StoreError, WorkflowStore};

/// A directed edge: run `to` after `from` completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// In-memory editing state for the connector canvas.
#[derive(Debug, Clone, Default)]
pub struct CanvasGraph {
    nodes: Vec<String>,
    edges: Vec<Edge>,
}

impl CanvasGraph {
    /// Creates an empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the canvas view from existing schemas, one node per
    /// workflow and one edge per `connected_workflows` entry.
    pub fn from_schemas(schemas: &[WorkflowSchema]) -> Self {
        let ids: HashSet<&str> = schemas.iter().map(|s| s.id.as_str()).collect();
        let mut graph = Self {
            nodes: schemas.iter().map(|s| s.id.clone()).collect(),
            edges: Vec::new(),
        };

        for schema in schemas {
            for target in &schema.connected_workflows {
                if !ids.contains(target.as_str()) {
                    warn!(
                        "Workflow '{}' references unknown connection '{}'",
                        schema.id, target
                    );
                    continue;
                }
                graph.edges.push(Edge {
                    from: schema.id.clone(),
                    to: target.clone(),
                });
            }
        }

        graph
    }

    /// Adds a node. Duplicates are ignored.
    pub fn add_node(&mut self, workflow_id: impl Into<String>) {
        let id = workflow_id.into();
        if !self.nodes.contains(&id) {
            self.nodes.push(id);
        }
    }

    /// Removes a node and every edge touching it. Local-only until save.
    pub fn remove_node(&mut self, workflow_id: &str) {
        self.nodes.retain(|n| n != workflow_id);
        self.edges
            .retain(|e| e.from != workflow_id && e.to != workflow_id);
    }

    /// Adds an edge between two existing nodes.
    ///
    /// Rejects self-edges, duplicate edges, and edges to unknown nodes.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), String> {
        if from == to {
            return Err(format!("Workflow '{}' cannot connect to itself", from));
        }
        if !self.nodes.iter().any(|n| n == from) {
            return Err(format!("Unknown workflow '{}'", from));
        }
        if !self.nodes.iter().any(|n| n == to) {
            return Err(format!("Unknown workflow '{}'", to));
        }

        let edge = Edge {
            from: from.to_string(),
            to: to.to_string(),
        };
        if self.edges.contains(&edge) {
            return Err(format!("'{}' is already connected to '{}'", from, to));
        }

        self.edges.push(edge);
        Ok(())
    }

    /// Removes an edge. Local-only until save.
    pub fn remove_edge(&mut self, from: &str, to: &str) {
        self.edges.retain(|e| !(e.from == from && e.to == to));
    }

    /// The node list.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// The edge list.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Outgoing connections for one node, in insertion order.
    pub fn connections_of(&self, workflow_id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|e| e.from == workflow_id)
            .map(|e| e.to.clone())
            .collect()
    }

    /// Rewrites every schema's `connected_workflows` to mirror the
    /// canvas edges, returning the ids whose connections changed.
    ///
    /// The invariant after this call: an edge A → B exists if and only
    /// if B's id is present in A's `connected_workflows`.
    pub fn apply_to(&self, schemas: &mut [WorkflowSchema]) -> Vec<String> {
        let mut changed = Vec::new();

        for schema in schemas.iter_mut() {
            if !self.nodes.iter().any(|n| n == &schema.id) {
                continue;
            }
            let connections = self.connections_of(&schema.id);
            if schema.connected_workflows != connections {
                schema.connected_workflows = connections;
                changed.push(schema.id.clone());
            }
        }

        changed
    }

    /// Persists the canvas: applies the edges to the given schemas and
    /// writes every changed schema through the store.
    ///
    /// Returns one [`Saved`] per changed schema; per the store's
    /// contract a failed remote write degrades to a local save with a
    /// warning rather than an error.
    pub async fn save(
        &self,
        store: &WorkflowStore,
        schemas: &mut [WorkflowSchema],
    ) -> Result<Vec<Saved>, StoreError> {
        let changed = self.apply_to(schemas);
        let mut results = Vec::with_capacity(changed.len());

        for id in &changed {
            let schema = match schemas.iter().find(|s| &s.id == id) {
                Some(schema) => schema,
                None => continue,
            };

            let saved = store
                .update(
                    id,
                    SchemaPatch {
                        connected_workflows: Some(schema.connected_workflows.clone()),
                        ..Default::default()
                    },
                )
                .await?;
            results.push(saved);
        }

        info!("Canvas saved: {} workflow(s) updated", results.len());
        Ok(results)
    }
}
