//! Autorun Core - image label interpretation and auto-run orchestration.
//!
//! This crate turns a fixed vocabulary of `com.docker.auto.*` image labels
//! into container run options, renders the equivalent engine command line,
//! asks for confirmation when labels touch the host, and hands the result
//! to a [`ContainerEngine`] implementation.

pub mod autorun;
pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod host;
pub mod image;
pub mod interpreter;
pub mod labels;
pub mod options;
pub mod proxy;
pub mod reference;
pub mod render;
pub mod tokenizer;

// Re-export commonly used types
pub use autorun::{AutoRunRequest, AutoRunner, Outcome, Terminal};
pub use config::{AutoRunConfig, EngineConfig, LogLevel};
pub use container::ContainerConfig;
pub use engine::{ContainerEngine, ResolvedReference};
pub use error::{AutoRunError, Result};
pub use host::{HostEnv, ProcessEnv};
pub use image::{ExposedPort, ImageConfig};
pub use interpreter::{interpret, Interpretation};
pub use labels::{AutoLabel, LabelEffect};
pub use options::{CreateOptions, MountSpec, NetworkAttachment, OptionsBundle, PullPolicy, RunOptions};
pub use reference::ImageReference;
pub use tokenizer::split_command_line;

/// Autorun version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
