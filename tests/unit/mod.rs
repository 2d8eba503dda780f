// Test code is allowed to panic on failure
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Unit tests for the cluster API
//!
//! These tests run the lifecycle operations and the HTTP router against an
//! in-memory control plane:
//! - Create, get, delete and list orchestration
//! - Poll budgets and degradation on a paused clock
//! - Leftover sweeping after delete
//! - HTTP status codes and bodies

#[path = "../common/mod.rs"]
mod common;

mod api;
