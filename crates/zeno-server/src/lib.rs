//! Zeno server library - HTTP API for the Zeno Knowledge Hub.
//!
//! This library provides the routes, auth-gate middleware, application
//! state, and the background sync worker. It's separated from main.rs to
//! enable integration testing.

pub mod app;
pub mod auth_layer;
pub mod config;
pub mod logging;
pub mod routes;
pub mod state;
pub mod sync_worker;
