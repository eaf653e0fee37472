//! Core fractal-tree animation kernel.
//!
//! Main components:
//! - [`part`] — per-node state and the child-slot part factory.
//! - [`store`] — per-level part/matrix arrays and their lifecycle.
//! - [`update`] — the per-level world-transform math.
//! - [`scheduler`] — dependency-chained parallel level updates per frame.
//! - [`tree`] — the owning aggregate with build/rebuild/teardown.
//! - [`publish`] — the instance-buffer boundary toward a renderer.
//! - [`transform`] — packed 3x4 instance transforms and bounds.
//! - [`config`] — validated configuration for the whole tree.
//! - [`types`] — shared constants and index helpers.

pub mod config;
pub mod part;
pub mod publish;
pub mod scheduler;
pub mod store;
pub mod transform;
pub mod tree;
pub mod types;
pub mod update;
