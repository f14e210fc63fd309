use std::{env, time::Duration};

use log::*;
use settlement_engine::{ConfirmationRetryPolicy, SettlementConfig};
use spg_common::{
    helpers::{parse_boolean_flag, parse_duration},
    Secret,
};

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8470;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/spg_store.db";
pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_CONFIRMATION_RETRIES: u32 = 5;
const DEFAULT_CONFIRMATION_RETRY_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_STALE_PAYMENT_AGE: Duration = Duration::from_secs(900);
const DEFAULT_RECONCILIATION_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub paystack: PaystackConfig,
    /// If false, webhook signatures are not checked. **DANGER**. Only ever disable this for local testing.
    pub webhook_signature_checks: bool,
    /// Gateway timeout and confirmation lookup policy, handed to the settlement engine.
    pub settlement: SettlementConfig,
    /// Pending payments older than this are reconciled by polling the gateway.
    pub stale_payment_age: Duration,
    /// How often the reconciliation worker runs.
    pub reconciliation_interval: Duration,
}

#[derive(Clone, Debug)]
pub struct PaystackConfig {
    /// The Paystack secret key. It authorises API calls and signs webhooks.
    pub secret_key: Secret<String>,
    pub base_url: String,
    /// Where Paystack redirects the customer once checkout completes.
    pub callback_url: Option<String>,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self { secret_key: Secret::default(), base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(), callback_url: None }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            paystack: PaystackConfig::default(),
            webhook_signature_checks: true,
            settlement: SettlementConfig {
                gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
                confirmation_retries: ConfirmationRetryPolicy::new(
                    DEFAULT_CONFIRMATION_RETRIES,
                    DEFAULT_CONFIRMATION_RETRY_DELAY,
                ),
            },
            stale_payment_age: DEFAULT_STALE_PAYMENT_AGE,
            reconciliation_interval: DEFAULT_RECONCILIATION_INTERVAL,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let paystack = PaystackConfig::from_env_or_default();
        let webhook_signature_checks = parse_boolean_flag(env::var("SPG_WEBHOOK_SIGNATURE_CHECKS").ok(), true);
        if !webhook_signature_checks {
            warn!(
                "🚨️ Webhook signature checks are DISABLED. Anyone can confirm payments. Never run like this in \
                 production."
            );
        }
        let gateway_timeout =
            duration_from_env("SPG_GATEWAY_TIMEOUT_SECS", Duration::from_secs(1), DEFAULT_GATEWAY_TIMEOUT);
        let attempts = env::var("SPG_CONFIRMATION_RETRIES")
            .ok()
            .map(|s| {
                s.parse::<u32>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid value for SPG_CONFIRMATION_RETRIES. {e} Using the default instead.");
                    DEFAULT_CONFIRMATION_RETRIES
                })
            })
            .unwrap_or(DEFAULT_CONFIRMATION_RETRIES);
        let retry_delay = duration_from_env(
            "SPG_CONFIRMATION_RETRY_DELAY_MS",
            Duration::from_millis(1),
            DEFAULT_CONFIRMATION_RETRY_DELAY,
        );
        let settlement = SettlementConfig {
            gateway_timeout,
            confirmation_retries: ConfirmationRetryPolicy::new(attempts, retry_delay),
        };
        let stale_payment_age =
            duration_from_env("SPG_STALE_PAYMENT_AGE_SECS", Duration::from_secs(1), DEFAULT_STALE_PAYMENT_AGE);
        let reconciliation_interval = duration_from_env(
            "SPG_RECONCILIATION_INTERVAL_SECS",
            Duration::from_secs(1),
            DEFAULT_RECONCILIATION_INTERVAL,
        );
        Self {
            host,
            port,
            database_url,
            paystack,
            webhook_signature_checks,
            settlement,
            stale_payment_age,
            reconciliation_interval,
        }
    }
}

impl PaystackConfig {
    pub fn from_env_or_default() -> Self {
        let secret_key = env::var("SPG_PAYSTACK_SECRET_KEY").ok().unwrap_or_else(|| {
            error!(
                "🪛️ SPG_PAYSTACK_SECRET_KEY is not set. Gateway payments will fail and no webhook signature will \
                 validate until it is set."
            );
            String::default()
        });
        let base_url = env::var("SPG_PAYSTACK_BASE_URL").ok().unwrap_or_else(|| DEFAULT_PAYSTACK_BASE_URL.into());
        let callback_url = env::var("SPG_PAYSTACK_CALLBACK_URL").ok().filter(|s| !s.trim().is_empty());
        if callback_url.is_none() {
            info!("🪛️ SPG_PAYSTACK_CALLBACK_URL is not set. Paystack will use the callback URL from your dashboard.");
        }
        Self { secret_key: Secret::new(secret_key), base_url, callback_url }
    }
}

fn duration_from_env(name: &str, unit: Duration, default: Duration) -> Duration {
    match env::var(name) {
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default:?}.");
            default
        },
        Ok(s) => parse_duration(Some(s.as_str()), unit).unwrap_or_else(|| {
            warn!("🪛️ Invalid configuration value for {name}: {s}. Using the default value of {default:?}.");
            default
        }),
    }
}
