//! Runtime tunables.

use std::time::Duration;

use crate::backoff::RetryPolicy;

/// Configuration for the placement layer.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// How long `ask` waits for a reply before reporting
    /// [`crate::AskError::Timeout`].
    pub ask_timeout: Duration,

    /// Idle time after which an active trip instance passivates.
    pub passivate_after: Duration,

    /// Bound on each instance's command mailbox.
    pub mailbox_capacity: usize,

    /// Backoff applied when activation/recovery fails.
    pub retry_policy: RetryPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ask_timeout: Duration::from_secs(3),
            passivate_after: Duration::from_secs(120),
            mailbox_capacity: 64,
            retry_policy: RetryPolicy::default(),
        }
    }
}
