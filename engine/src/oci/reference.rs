//! Image reference parsing.
//!
//! Parses image references like `quay.io/coreos/clair:v2.0.0` into structured components.

use layerscan_core::error::{Result, ScanError};

/// Default registry when none is specified.
const DEFAULT_REGISTRY: &str = "docker.io";

/// Default tag when none is specified.
const DEFAULT_TAG: &str = "latest";

/// Parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry hostname (e.g., "quay.io", "docker.io", "localhost:5000")
    pub registry: String,
    /// Repository path (e.g., "library/nginx", "coreos/clair")
    pub repository: String,
    /// Tag (e.g., "latest", "v2.0.0")
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
    /// - `quay.io/org/image:tag` → quay.io/org/image:tag
    /// - `localhost:5000/image@sha256:abc...` → localhost:5000/image@sha256:abc...
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ScanError::ImageReference(
                "Empty image reference".to_string(),
            ));
        }

        let (name_tag, digest) = match reference.rfind('@') {
            Some(at_pos) => {
                let digest_part = &reference[at_pos + 1..];
                if !digest_part.contains(':') {
                    return Err(ScanError::ImageReference(format!(
                        "Invalid digest format in reference '{}': expected algorithm:hex",
                        reference
                    )));
                }
                (&reference[..at_pos], Some(digest_part.to_string()))
            }
            None => (reference, None),
        };

        let (name, tag) = split_tag(name_tag);
        let (registry, repository) = Self::split_registry_repository(name)?;

        let tag = match (tag, &digest) {
            (None, None) => Some(DEFAULT_TAG.to_string()),
            (tag, _) => tag.map(str::to_string),
        };

        Ok(ImageReference {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// Split a name into registry and repository components.
    fn split_registry_repository(name: &str) -> Result<(String, String)> {
        // A first component with a dot or port, or "localhost", is a registry
        if let Some(slash_pos) = name.find('/') {
            let first = &name[..slash_pos];
            if first.contains('.') || first.contains(':') || first == "localhost" {
                let repo = &name[slash_pos + 1..];
                if repo.is_empty() {
                    return Err(ScanError::ImageReference(format!(
                        "Empty repository in reference '{}'",
                        name
                    )));
                }
                return Ok((first.to_string(), repo.to_string()));
            }
        }

        let repository = if name.contains('/') {
            name.to_string()
        } else {
            format!("library/{}", name)
        };

        Ok((DEFAULT_REGISTRY.to_string(), repository))
    }

    /// Registry host this image was resolved from.
    pub fn hostname(&self) -> &str {
        &self.registry
    }

    /// Tag if present, otherwise the digest, otherwise `latest`.
    pub fn tag_or_digest(&self) -> &str {
        self.tag
            .as_deref()
            .or(self.digest.as_deref())
            .unwrap_or(DEFAULT_TAG)
    }

    /// `repository:tag` as it appears in a local image store's tag list.
    pub fn repo_tag(&self) -> String {
        let repository = if self.registry == DEFAULT_REGISTRY {
            self.repository
                .strip_prefix("library/")
                .unwrap_or(&self.repository)
                .to_string()
        } else {
            format!("{}/{}", self.registry, self.repository)
        };
        format!("{}:{}", repository, self.tag.as_deref().unwrap_or(DEFAULT_TAG))
    }

    /// Get the full reference string.
    pub fn full_reference(&self) -> String {
        let mut s = format!("{}/{}", self.registry, self.repository);
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
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}

/// Split `name[:tag]`, treating a numeric suffix of a single-component name
/// as a registry port rather than a tag.
fn split_tag(name_tag: &str) -> (&str, Option<&str>) {
    let (prefix_len, last) = match name_tag.rfind('/') {
        Some(slash_pos) => (slash_pos + 1, &name_tag[slash_pos + 1..]),
        None => (0, name_tag),
    };
    match last.rfind(':') {
        Some(colon_pos) => {
            let after_colon = &last[colon_pos + 1..];
            if prefix_len == 0 && after_colon.chars().all(|c| c.is_ascii_digit()) {
                (name_tag, None)
            } else {
                (&name_tag[..prefix_len + colon_pos], Some(after_colon))
            }
        }
        None => (name_tag, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_name() {
        let r = ImageReference::parse("nginx").unwrap();
        assert_eq!(r.registry, "docker.io");
        assert_eq!(r.repository, "library/nginx");
        assert_eq!(r.tag, Some("latest".to_string()));
        assert_eq!(r.digest, None);
    }

    #[test]
    fn test_parse_name_with_tag() {
        let r = ImageReference::parse("nginx:1.25").unwrap();
        assert_eq!(r.repository, "library/nginx");
        assert_eq!(r.tag, Some("1.25".to_string()));
    }

    #[test]
    fn test_parse_user_repo() {
        let r = ImageReference::parse("jgsqware/ubuntu-git").unwrap();
        assert_eq!(r.registry, "docker.io");
        assert_eq!(r.repository, "jgsqware/ubuntu-git");
        assert_eq!(r.tag, Some("latest".to_string()));
    }

    #[test]
    fn test_parse_custom_registry() {
        let r = ImageReference::parse("quay.io/coreos/clair:v2.0.0").unwrap();
        assert_eq!(r.registry, "quay.io");
        assert_eq!(r.repository, "coreos/clair");
        assert_eq!(r.tag, Some("v2.0.0".to_string()));
    }

    #[test]
    fn test_parse_registry_with_port() {
        let r = ImageReference::parse("localhost:5000/alpine:3.4").unwrap();
        assert_eq!(r.registry, "localhost:5000");
        assert_eq!(r.repository, "alpine");
        assert_eq!(r.tag, Some("3.4".to_string()));
    }

    #[test]
    fn test_parse_digest_only() {
        let r = ImageReference::parse("quay.io/coreos/clair@sha256:abcdef1234567890").unwrap();
        assert_eq!(r.tag, None);
        assert_eq!(r.digest, Some("sha256:abcdef1234567890".to_string()));
        assert_eq!(r.tag_or_digest(), "sha256:abcdef1234567890");
    }

    #[test]
    fn test_parse_tag_and_digest() {
        let r = ImageReference::parse("quay.io/coreos/clair:v2@sha256:abc").unwrap();
        assert_eq!(r.tag, Some("v2".to_string()));
        assert_eq!(r.digest, Some("sha256:abc".to_string()));
        assert_eq!(r.tag_or_digest(), "v2");
    }

    #[test]
    fn test_parse_localhost_registry() {
        let r = ImageReference::parse("localhost/myimage:test").unwrap();
        assert_eq!(r.registry, "localhost");
        assert_eq!(r.repository, "myimage");
    }

    #[test]
    fn test_parse_empty_reference() {
        assert!(ImageReference::parse("").is_err());
        assert!(ImageReference::parse("   ").is_err());
    }

    #[test]
    fn test_parse_invalid_digest() {
        let err = ImageReference::parse("nginx@invaliddigest").unwrap_err();
        assert!(matches!(err, ScanError::ImageReference(_)));
    }

    #[test]
    fn test_parse_empty_repository() {
        assert!(ImageReference::parse("quay.io/").is_err());
    }

    #[test]
    fn test_hostname() {
        let r = ImageReference::parse("registry.example.com/team/app:1").unwrap();
        assert_eq!(r.hostname(), "registry.example.com");
    }

    #[test]
    fn test_repo_tag_docker_hub() {
        let r = ImageReference::parse("ubuntu:16.04").unwrap();
        assert_eq!(r.repo_tag(), "ubuntu:16.04");
        let r = ImageReference::parse("jgsqware/ubuntu-git").unwrap();
        assert_eq!(r.repo_tag(), "jgsqware/ubuntu-git:latest");
    }

    #[test]
    fn test_repo_tag_custom_registry() {
        let r = ImageReference::parse("localhost:5000/alpine:3.4").unwrap();
        assert_eq!(r.repo_tag(), "localhost:5000/alpine:3.4");
    }

    #[test]
    fn test_display() {
        let r = ImageReference::parse("nginx:1.25").unwrap();
        assert_eq!(format!("{}", r), "docker.io/library/nginx:1.25");
    }

    #[test]
    fn test_deep_repository_path() {
        let r = ImageReference::parse("ghcr.io/org/sub/image:v1").unwrap();
        assert_eq!(r.repository, "org/sub/image");
        assert_eq!(r.tag, Some("v1".to_string()));
    }
}
