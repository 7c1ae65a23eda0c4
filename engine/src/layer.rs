//! Layer identifiers.
//!
//! A layer is addressed by its content digest (`algorithm:hex`). The analysis
//! service in local mode expects bare hex, so the algorithm prefix is dropped
//! there and kept otherwise.

use std::fmt;

/// Digest algorithm prefix stripped in local mode.
const DIGEST_PREFIX: &str = "sha256:";

/// Length of the short, log-only form.
const SHORT_LEN: usize = 12;

/// Canonical layer identifier sent to the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(String);

impl LayerId {
    /// Normalize a raw digest for the given transport.
    pub fn normalize(digest: &str, local: bool) -> Self {
        let id = if local {
            digest.strip_prefix(DIGEST_PREFIX).unwrap_or(digest)
        } else {
            digest
        };
        LayerId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, for log output only.
    pub fn short(&self) -> &str {
        self.0.get(..SHORT_LEN).unwrap_or(&self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LayerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        LayerId(id.to_string())
    }
}
