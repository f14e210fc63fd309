use std::time::Duration;

pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_CONFIRMATION_ATTEMPTS: u32 = 5;
pub const DEFAULT_CONFIRMATION_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Tunables shared by [`crate::SettlementApi`] and [`crate::ReconciliationApi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementConfig {
    /// Upper bound on every call to the payment gateway.
    pub gateway_timeout: Duration,
    /// How hard to look for a payment when a confirmation for it arrives.
    pub confirmation_retries: ConfirmationRetryPolicy,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self { gateway_timeout: DEFAULT_GATEWAY_TIMEOUT, confirmation_retries: ConfirmationRetryPolicy::default() }
    }
}

/// A gateway confirmation can overtake the commit of the payment it refers to. Lookups are retried `attempts` times,
/// `delay` apart, before the payment is declared missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationRetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for ConfirmationRetryPolicy {
    fn default() -> Self {
        Self { attempts: DEFAULT_CONFIRMATION_ATTEMPTS, delay: DEFAULT_CONFIRMATION_RETRY_DELAY }
    }
}

impl ConfirmationRetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts: attempts.max(1), delay }
    }

    /// Look once, and never wait.
    pub fn no_retries() -> Self {
        Self { attempts: 1, delay: Duration::ZERO }
    }
}
