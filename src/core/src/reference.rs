//! Image reference parsing.
//!
//! Parses image references like `ghcr.io/acme/tool:v1` into structured
//! components and renders the short ("familiar") form engines print.

use crate::error::{AutoRunError, Result};

/// Default registry when none is specified.
const DEFAULT_REGISTRY: &str = "docker.io";

/// Namespace of official images on the default registry.
const OFFICIAL_NAMESPACE: &str = "library/";

/// Default tag when none is specified.
const DEFAULT_TAG: &str = "latest";

/// Parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry hostname (e.g., "ghcr.io", "docker.io")
    pub registry: String,
    /// Repository path (e.g., "library/nginx", "acme/tool")
    pub repository: String,
    /// Tag (e.g., "latest", "v1")
    pub tag: Option<String>,
    /// Digest (e.g., "sha256:abc123...")
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference string.
    ///
    /// Supports formats:
    /// - `nginx` → docker.io/library/nginx:latest
    /// - `nginx:1.25` → docker.io/library/nginx:1.25
    /// - `myuser/myimage` → docker.io/myuser/myimage:latest
    /// - `ghcr.io/org/image:tag` → ghcr.io/org/image:tag
    /// - `ghcr.io/org/image@sha256:abc...` → ghcr.io/org/image@sha256:abc...
    ///
    /// A reference without tag or digest gets the `latest` tag.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AutoRunError::InvalidReference(
                "empty image reference".to_string(),
            ));
        }

        // Split off digest first (@ separator)
        let (name_tag, digest) = match reference.rsplit_once('@') {
            Some((name_tag, digest)) => {
                if !digest.contains(':') {
                    return Err(AutoRunError::InvalidReference(format!(
                        "invalid digest in '{reference}': expected algorithm:hex"
                    )));
                }
                (name_tag, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        // Tag separator is the last colon after the last slash, so a
        // registry port (`host:5000/repo`) is never mistaken for a tag.
        let last_segment_start = name_tag.rfind('/').map_or(0, |p| p + 1);
        let (name, tag) = match name_tag[last_segment_start..].rfind(':') {
            Some(colon) => {
                let colon = last_segment_start + colon;
                (&name_tag[..colon], Some(name_tag[colon + 1..].to_string()))
            }
            None => (name_tag, None),
        };

        if tag.as_deref() == Some("") {
            return Err(AutoRunError::InvalidReference(format!(
                "empty tag in '{reference}'"
            )));
        }

        let (registry, repository) = Self::split_registry_repository(name)?;

        if repository.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(AutoRunError::InvalidReference(format!(
                "repository name must be lowercase: '{reference}'"
            )));
        }

        // Apply default tag if no tag and no digest
        let tag = if tag.is_none() && digest.is_none() {
            Some(DEFAULT_TAG.to_string())
        } else {
            tag
        };

        Ok(ImageReference {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// True for a bare image ID (`sha256:<hex>` or 64 hex characters),
    /// which names no repository.
    pub fn is_image_id(reference: &str) -> bool {
        let hex = reference.strip_prefix("sha256:").unwrap_or(reference);
        hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Split a name into registry and repository components.
    fn split_registry_repository(name: &str) -> Result<(String, String)> {
        // First component is a registry if it contains a dot or colon,
        // or is "localhost"
        if let Some((first, rest)) = name.split_once('/') {
            if first.contains('.') || first.contains(':') || first == "localhost" {
                if rest.is_empty() {
                    return Err(AutoRunError::InvalidReference(format!(
                        "empty repository in '{name}'"
                    )));
                }
                return Ok((first.to_string(), rest.to_string()));
            }
        }

        if name.is_empty() || name.split('/').any(str::is_empty) {
            return Err(AutoRunError::InvalidReference(format!(
                "empty path component in '{name}'"
            )));
        }

        // No registry detected — use default
        let repository = if name.contains('/') {
            name.to_string()
        } else {
            format!("{OFFICIAL_NAMESPACE}{name}")
        };

        Ok((DEFAULT_REGISTRY.to_string(), repository))
    }

    /// Whether the reference carries a tag.
    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }

    /// Repository name in familiar form (`nginx`, `acme/tool`, `ghcr.io/org/x`).
    pub fn familiar_name(&self) -> String {
        if self.registry == DEFAULT_REGISTRY {
            self.repository
                .strip_prefix(OFFICIAL_NAMESPACE)
                .unwrap_or(&self.repository)
                .to_string()
        } else {
            format!("{}/{}", self.registry, self.repository)
        }
    }

    /// Familiar form of the whole reference (`nginx:latest`).
    pub fn familiar(&self) -> String {
        let mut s = self.familiar_name();
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }

    /// Canonical reference pinned to `digest`, without a tag.
    pub fn with_digest(&self, digest: &str) -> Self {
        Self {
            registry: self.registry.clone(),
            repository: self.repository.clone(),
            tag: None,
            digest: Some(digest.to_string()),
        }
    }
}
