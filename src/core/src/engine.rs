//! Container engine abstraction.
//!
//! The orchestrator never talks to an engine directly. Everything it needs
//! from image storage, the registry and the container runner goes through
//! [`ContainerEngine`], so the CLI can back it with an engine binary and
//! tests can back it with an in-memory fake.

use async_trait::async_trait;

use crate::container::ContainerConfig;
use crate::error::Result;
use crate::image::ImageConfig;
use crate::options::{CreateOptions, RunOptions};
use crate::reference::ImageReference;

/// Outcome of reference resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Normalized reference with a default tag applied, if it names a
    /// repository. `None` for bare image IDs.
    pub named: Option<String>,
    /// Digest-pinned reference when content trust resolved one.
    pub canonical: Option<String>,
}

impl ResolvedReference {
    /// Reference that is not named (image ID) and carries no trust data.
    pub fn unnamed() -> Self {
        Self {
            named: None,
            canonical: None,
        }
    }

    /// Reference that names a repository, without a trusted digest.
    pub fn named(reference: impl Into<String>) -> Self {
        Self {
            named: Some(reference.into()),
            canonical: None,
        }
    }

    /// Parse `image` without consulting any trust data.
    ///
    /// Named references are kept in familiar form with the default tag
    /// applied (`nginx` becomes `nginx:latest`).
    pub fn from_image(image: &str) -> Result<Self> {
        if ImageReference::is_image_id(image) {
            return Ok(Self::unnamed());
        }
        Ok(Self::named(ImageReference::parse(image)?.familiar()))
    }

    /// Whether the named reference carries a tag (not just a digest).
    pub fn is_tagged(&self) -> bool {
        self.named
            .as_deref()
            .and_then(|n| ImageReference::parse(n).ok())
            .is_some_and(|r| r.is_tagged())
    }
}

/// Operations the auto-run flow needs from a container engine.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Normalize `image`; with `trust` enabled, also resolve its signed digest.
    async fn resolve_reference(&self, image: &str, trust: bool) -> Result<ResolvedReference>;

    /// Pull `reference`, optionally for a specific platform.
    async fn pull_image(&self, reference: &str, platform: Option<&str>) -> Result<()>;

    /// Tag a trusted digest reference with its human-readable tag.
    async fn tag_trusted(&self, canonical: &str, tagged: &str) -> Result<()>;

    /// Read labels and exposed ports of a local image.
    ///
    /// Must return [`crate::AutoRunError::NotFound`] when the image is
    /// not present locally.
    async fn inspect_image(&self, reference: &str) -> Result<ImageConfig>;

    /// Operating system of the engine (`linux`, `windows`).
    async fn server_os(&self) -> Result<String>;

    /// Validate options into a runnable configuration.
    fn parse_container_config(
        &self,
        create: &CreateOptions,
        run: &RunOptions,
        os_type: &str,
    ) -> Result<ContainerConfig> {
        ContainerConfig::parse(create, run, os_type)
    }

    /// Create and run the container, returning its exit status.
    async fn run_container(&self, run: &RunOptions, config: &ContainerConfig) -> Result<i32>;
}
