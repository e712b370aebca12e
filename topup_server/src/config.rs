//! Server configuration.
//!
//! Everything is read from environment variables once, at start-up, in [`ServerConfig::from_env_or_default`]. Nothing
//! below the binary reads the environment; the resulting values are passed in explicitly.
use std::{env, net::IpAddr};

use log::*;
use topup_common::{helpers::parse_boolean_flag, Secret};
use topup_engine::LedgerConfig;

const DEFAULT_TOPUP_HOST: &str = "127.0.0.1";
const DEFAULT_TOPUP_PORT: u16 = 4000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/topup_ledger.db";
/// Use this as the database url to run against the in-memory ledger.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    pub ledger: LedgerConfig,
    pub razorpay: RazorpayConfig,
}

#[derive(Clone, Debug)]
pub struct RazorpayConfig {
    /// The webhook secret configured in the Razorpay dashboard. `None` if unset or blank.
    pub webhook_secret: Option<Secret<String>>,
    /// If false, webhook signatures are not checked at all. **DANGER**
    pub signature_checks: bool,
    /// If supplied, requests against `/webhook` are only accepted from these addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub whitelist: Option<Vec<IpAddr>>,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self { webhook_secret: None, signature_checks: true, whitelist: None }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TOPUP_HOST.to_string(),
            port: DEFAULT_TOPUP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            ledger: LedgerConfig::default(),
            razorpay: RazorpayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("TOPUP_HOST").ok().unwrap_or_else(|| DEFAULT_TOPUP_HOST.into());
        let port = env::var("TOPUP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TOPUP_PORT. {e} Using the default, {DEFAULT_TOPUP_PORT}, \
                         instead."
                    );
                    DEFAULT_TOPUP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TOPUP_PORT);
        let database_url = env::var("TOPUP_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ TOPUP_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("TOPUP_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("TOPUP_USE_FORWARDED").ok(), false);
        let ledger = configure_ledger();
        let razorpay = RazorpayConfig::from_env_or_defaults();
        Self { host, port, database_url, use_x_forwarded_for, use_forwarded, ledger, razorpay }
    }

    pub fn uses_memory_backend(&self) -> bool {
        self.database_url.trim().eq_ignore_ascii_case(MEMORY_DATABASE_URL)
    }
}

impl RazorpayConfig {
    pub fn from_env_or_defaults() -> Self {
        let webhook_secret = env::var("RAZORPAY_WEBHOOK_SECRET").ok().map(Secret::new).filter(|s| !s.is_blank());
        if webhook_secret.is_none() {
            error!(
                "🪛️ RAZORPAY_WEBHOOK_SECRET is not set. Every webhook call will fail with a server error until it is \
                 set to the webhook secret from the Razorpay dashboard."
            );
        }
        let signature_checks = parse_boolean_flag(env::var("TOPUP_SIGNATURE_CHECKS").ok(), true);
        if !signature_checks {
            warn!(
                "🚨️🚨️🚨️ Webhook signature checks are DISABLED. Anyone who can reach this server can credit any \
                 ledger. Never run a production instance like this. 🚨️🚨️🚨️"
            );
        }
        let whitelist = env::var("TOPUP_WEBHOOK_IP_WHITELIST").ok().and_then(|s| parse_whitelist(&s));
        match &whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The webhook IP whitelist was configured, but is empty. The server will run, but won't \
                     accept any webhook calls."
                );
            },
            None => {
                info!("🪛️ No webhook IP whitelist is set. Only signature validation will be used.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Webhook IP whitelist: {addrs}");
            },
        }
        Self { webhook_secret, signature_checks, whitelist }
    }
}

/// Parses a comma-separated list of IP addresses. Invalid entries are skipped with a warning.
/// `none`, `false` and `0` disable the whitelist.
pub fn parse_whitelist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Webhook IP whitelist is disabled. If this is not what you want, set TOPUP_WEBHOOK_IP_WHITELIST to a \
             comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>().map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in the whitelist: {e}")).ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

fn configure_ledger() -> LedgerConfig {
    let defaults = LedgerConfig::default();
    let max_write_attempts = env::var("TOPUP_MAX_WRITE_ATTEMPTS")
        .map_err(|_| {
            info!("🪛️ TOPUP_MAX_WRITE_ATTEMPTS is not set. Using the default value of {}.", defaults.max_write_attempts)
        })
        .and_then(|s| {
            s.parse::<u32>().map_err(|e| warn!("🪛️ Invalid configuration value for TOPUP_MAX_WRITE_ATTEMPTS. {e}"))
        })
        .ok()
        .unwrap_or(defaults.max_write_attempts);
    let payment_history_size = env::var("TOPUP_PAYMENT_HISTORY_SIZE")
        .map_err(|_| {
            info!(
                "🪛️ TOPUP_PAYMENT_HISTORY_SIZE is not set. Using the default value of {}.",
                defaults.payment_history_size
            )
        })
        .and_then(|s| {
            s.parse::<usize>().map_err(|e| warn!("🪛️ Invalid configuration value for TOPUP_PAYMENT_HISTORY_SIZE. {e}"))
        })
        .ok()
        .unwrap_or(defaults.payment_history_size);
    LedgerConfig::new(max_write_attempts, payment_history_size)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
