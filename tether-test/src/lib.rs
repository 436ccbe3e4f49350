//! End-to-end scenarios for the tether offline layer.
//!
//! Scenarios live in `tests/features` and run through the cucumber harness in
//! `tests/bdd.rs` against a [`MockNetwork`](network::MockNetwork), a
//! fault-injecting storage and in-memory pages.

pub mod network;
pub mod steps;
pub mod storage;
pub mod tracing;
pub mod world;
