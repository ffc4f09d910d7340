//! Application configuration from `RAILMEAL_*` environment variables.
//!
//! Every setting has a default except the store location: either
//! `RAILMEAL_FIXTURES_DIR` (in-memory store loaded from JSON files) or both
//! `RAILMEAL_STORE_URL` and `RAILMEAL_STORE_KEY` must be set.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::cache::CacheConfig;
use crate::domain::fixed_offset;
use crate::drafts::DraftConfig;
use crate::eligibility::{EligibilityConfig, MenuConfig, RunningDayPolicy};
use crate::pricing::PricingConfig;
use crate::store::RestStoreConfig;

/// Errors reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Where timetable, restaurant and order data live.
#[derive(Debug, Clone)]
pub enum StoreSettings {
    /// PostgREST-style gateway.
    Rest(RestStoreConfig),
    /// JSON fixtures loaded into memory.
    Fixtures(PathBuf),
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreSettings,
    pub eligibility: EligibilityConfig,
    pub pricing: PricingConfig,
    pub menu: MenuConfig,
    pub cache: CacheConfig,
    pub drafts: DraftConfig,
}

impl AppConfig {
    /// Defaults for everything, serving the given store.
    pub fn new(store: StoreSettings) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            store,
            eligibility: EligibilityConfig::default(),
            pricing: PricingConfig::default(),
            menu: MenuConfig::default(),
            cache: CacheConfig::default(),
            drafts: DraftConfig::default(),
        }
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut eligibility = EligibilityConfig::default();
        if let Some(minutes) = parse(&var, "RAILMEAL_UTC_OFFSET_MINUTES")? {
            eligibility = eligibility.with_utc_offset(minutes);
        }
        if let Some(minutes) = parse(&var, "RAILMEAL_DEFAULT_CUTOFF_MINUTES")? {
            eligibility = eligibility.with_default_cutoff(minutes);
        }
        if let Some(n) = parse(&var, "RAILMEAL_HOLIDAY_CHUNK_SIZE")? {
            eligibility = eligibility.with_holiday_chunk_size(n);
        }
        if let Some(secs) = parse(&var, "RAILMEAL_LOOKUP_TIMEOUT_SECS")? {
            eligibility = eligibility.with_lookup_timeout(secs);
        }
        if let Some(policy) = parse::<RunningDayPolicy>(&var, "RAILMEAL_RUNNING_DAY_POLICY")? {
            eligibility = eligibility.with_running_day_policy(policy);
        }

        let store = match var("RAILMEAL_FIXTURES_DIR") {
            Some(dir) => StoreSettings::Fixtures(PathBuf::from(dir)),
            None => {
                let url = var("RAILMEAL_STORE_URL").ok_or(ConfigError::Missing("RAILMEAL_STORE_URL"))?;
                let key = var("RAILMEAL_STORE_KEY").ok_or(ConfigError::Missing("RAILMEAL_STORE_KEY"))?;
                let mut rest = RestStoreConfig::new(url, key)
                    .with_local_offset(fixed_offset(eligibility.utc_offset_minutes));
                if let Some(secs) = parse(&var, "RAILMEAL_STORE_TIMEOUT_SECS")? {
                    rest = rest.with_timeout(secs);
                }
                if let Some(n) = parse(&var, "RAILMEAL_STORE_MAX_CONCURRENT")? {
                    rest = rest.with_max_concurrent(n);
                }
                if let Some(column) = var("RAILMEAL_RESTAURANT_KEY") {
                    rest = rest.with_restaurant_key(column);
                }
                StoreSettings::Rest(rest)
            }
        };

        let mut config = Self::new(store);
        config.eligibility = eligibility;

        if let Some(addr) = parse(&var, "RAILMEAL_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(percent) = parse::<Decimal>(&var, "RAILMEAL_GST_PERCENT")? {
            config.pricing = config.pricing.with_gst_percent(percent);
        }
        if let Some(charge) = parse::<Decimal>(&var, "RAILMEAL_PLATFORM_CHARGE")? {
            config.pricing = config.pricing.with_platform_charge(charge);
        }
        if let Some(order) = var("RAILMEAL_MENU_CATEGORY_ORDER") {
            let groups = order
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(String::from)
                .collect();
            config.menu = config.menu.with_category_order(groups);
        }
        if let Some(secs) = parse::<u64>(&var, "RAILMEAL_ROUTE_CACHE_TTL_SECS")? {
            config.cache = config.cache.with_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = parse::<u64>(&var, "RAILMEAL_DRAFT_IDLE_SECS")? {
            config.drafts = config.drafts.with_idle_ttl(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    var(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value })
        })
        .transpose()
}
