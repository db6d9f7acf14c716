//! Workflow Connector Module
//!
//! Composition of workflows into a directed "run next" graph, edited on
//! a canvas and persisted through each workflow's `connected_workflows`
//! list.

pub mod canvas;

pub use canvas::{CanvasGraph, Edge};
