//! Flush policy for log writes.
//!
//! Defines when mapped bytes are synced to disk.

use serde::{Deserialize, Serialize};

/// Flush policy for log writes.
///
/// Controls whether each container is synced before the header that counts
/// it is rewritten, trading throughput for crash consistency.
///
/// # Policy Comparison
///
/// | Policy | Syncs | After a crash |
/// |--------|-------|---------------|
/// | EveryContainer | container range, then header | header counts only synced containers |
/// | OnClose | once, on close | header may count containers never written back |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Sync every container's byte range before the header rewrite.
    #[default]
    EveryContainer,

    /// Leave write-back to the OS until close.
    ///
    /// Use for scratch recordings where throughput matters more than a
    /// readable file after a crash.
    OnClose,
}

impl FlushPolicy {
    /// Check if each container is synced as soon as it is written.
    pub fn syncs_every_container(&self) -> bool {
        matches!(self, FlushPolicy::EveryContainer)
    }

    /// Human-readable description of the policy.
    pub fn description(&self) -> &'static str {
        match self {
            FlushPolicy::EveryContainer => "Sync each container (crash-consistent header)",
            FlushPolicy::OnClose => "Sync on close only (fastest)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_every_container() {
        let policy = FlushPolicy::default();
        assert_eq!(policy, FlushPolicy::EveryContainer);
        assert!(policy.syncs_every_container());
    }

    #[test]
    fn test_on_close() {
        let policy = FlushPolicy::OnClose;
        assert!(!policy.syncs_every_container());
        assert_eq!(policy.description(), "Sync on close only (fastest)");
    }
}
