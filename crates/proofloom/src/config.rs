//! Session configuration types.

use std::time::{Duration, Instant};

use crate::error::{ProofloomError, Result};

/// Configuration for a prover session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Memory limit for the whole session in MB (None = unlimited)
    pub memory_limit_mb: Option<usize>,
    /// Wall-clock budget for the whole session (None = unlimited)
    pub time_limit: Option<Duration>,
    /// Seed recorded for reproducibility of randomized strategies
    pub random_seed: u64,
    /// What the interpolant minimizer optimizes for
    pub optimization_target: OptimizationTarget,
    /// Forbid all slicing of proof nodes (simulates the non-minimizing algorithm)
    pub no_slicing: bool,
    /// Print the value of the cost function after minimization
    pub show_stats: bool,
}

/// What the interpolant minimizer optimizes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationTarget {
    /// Sum of symbol-count weights of the digest components
    #[default]
    Weight,
    /// Number of distinct digest components
    Count,
    /// Number of distinct variables in the digest components
    Quantifiers,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            memory_limit_mb: None,
            time_limit: None,
            random_seed: 123456,
            optimization_target: OptimizationTarget::default(),
            no_slicing: false,
            show_stats: false,
        }
    }
}

/// Cooperative cancellation budget checked inside long traversals.
///
/// Cloned freely; all clones share the same deadline. Checks are cheap
/// enough to run once per visited node.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    deadline: Option<Instant>,
    memory_limit_mb: Option<usize>,
}

impl Budget {
    /// A budget that never expires.
    pub fn unlimited() -> Self {
        Budget::default()
    }

    /// Derive the budget from a session configuration, starting the clock now.
    pub fn from_config(config: &SessionConfig) -> Self {
        Budget {
            deadline: config.time_limit.map(|d| Instant::now() + d),
            memory_limit_mb: config.memory_limit_mb,
        }
    }

    /// A budget expiring after `limit` from now.
    pub fn with_time_limit(limit: Duration) -> Self {
        Budget {
            deadline: Some(Instant::now() + limit),
            memory_limit_mb: None,
        }
    }

    /// Check the wall clock against the deadline.
    pub fn check(&self) -> Result<()> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ProofloomError::TimeLimit);
            }
        }
        Ok(())
    }

    /// Check the wall clock and the process RSS. More expensive than
    /// `check`; call at coarser intervals.
    pub fn check_memory(&self) -> Result<()> {
        self.check()?;
        if let Some(limit) = self.memory_limit_mb {
            if let Some(rss) = process_memory_mb() {
                if rss > limit {
                    return Err(ProofloomError::MemoryLimit);
                }
            }
        }
        Ok(())
    }
}

/// Get current process RSS in MB. Returns None if unavailable.
pub fn process_memory_mb() -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let rss_pages: usize = statm.split_whitespace().nth(1)?.parse().ok()?;
        let page_size = 4096usize; // standard on Linux
        Some(rss_pages * page_size / (1024 * 1024))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_budget_never_expires() {
        let budget = Budget::unlimited();
        assert!(budget.check().is_ok());
        assert!(budget.check_memory().is_ok());
    }

    #[test]
    fn test_expired_budget() {
        let budget = Budget::with_time_limit(Duration::from_secs(0));
        assert!(matches!(budget.check(), Err(ProofloomError::TimeLimit)));
    }
}
