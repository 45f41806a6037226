//! Records shared by the orchestrator, the monitor and the worker binary

pub mod models;
