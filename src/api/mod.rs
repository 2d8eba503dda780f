//! HTTP surface of the service

pub mod server;

pub use server::{NameQuery, build_router, run_server};
