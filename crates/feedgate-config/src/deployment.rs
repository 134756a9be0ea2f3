//! Cache deployment selection.

use std::fmt;

/// Which cache backend is active for the process.
///
/// Decoded from the integer `cache.deployment_type` discriminant once at
/// startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheDeployment {
    /// Single Redis node.
    Standalone,
    /// Redis cluster.
    Cluster,
    /// Process-local map.
    #[default]
    InMemory,
}

impl CacheDeployment {
    /// Discriminant selecting a single Redis node.
    pub const STANDALONE: i64 = 1;
    /// Discriminant selecting a Redis cluster.
    pub const CLUSTER: i64 = 2;

    /// Maps a discriminant to a deployment. Unknown values select the
    /// in-process store.
    #[must_use]
    pub const fn from_discriminant(value: i64) -> Self {
        match value {
            Self::STANDALONE => Self::Standalone,
            Self::CLUSTER => Self::Cluster,
            _ => Self::InMemory,
        }
    }

    /// Returns true if the backend lives in a remote Redis service.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Standalone | Self::Cluster)
    }
}

impl fmt::Display for CacheDeployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standalone => write!(f, "redis-standalone"),
            Self::Cluster => write!(f, "redis-cluster"),
            Self::InMemory => write!(f, "in-memory"),
        }
    }
}
