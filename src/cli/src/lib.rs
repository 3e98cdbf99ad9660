//! Autorun CLI - run container images from their `com.docker.auto.*` labels.

pub mod commands;
pub mod engine;
pub mod logging;
