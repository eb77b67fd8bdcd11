use std::{env, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use tbs_common::helpers::{parse_boolean_flag, parse_positive_integer};
use ticket_booking_engine::{
    booking_api::{BookingFlowConfig, CacheConfig, ReservationConfig},
    http_catalog::{HttpCatalogConfig, DEFAULT_CATALOG_TIMEOUT},
};

const DEFAULT_TBS_HOST: &str = "127.0.0.1";
const DEFAULT_TBS_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/ticket_booking.db";
const DEFAULT_EXTERNAL_CALL_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
const DEFAULT_UNPAID_BOOKING_TIMEOUT: Duration = Duration::minutes(30);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Where event metadata comes from. `None` means the catalog tables in the local database are used.
    pub catalog: Option<HttpCatalogConfig>,
    /// Upper bound on every individual call to the catalog or the inventory store while serving a request.
    pub external_call_timeout: StdDuration,
    pub cache: CacheConfig,
    /// The time before a booking that has not been paid for is cancelled and its tickets go back on sale.
    pub unpaid_booking_timeout: Duration,
    /// When true, cancelling a confirmed booking returns its tickets to inventory.
    pub release_on_confirmed_cancel: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TBS_HOST.to_string(),
            port: DEFAULT_TBS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            catalog: None,
            external_call_timeout: StdDuration::from_millis(DEFAULT_EXTERNAL_CALL_TIMEOUT_MS),
            cache: CacheConfig::default(),
            unpaid_booking_timeout: DEFAULT_UNPAID_BOOKING_TIMEOUT,
            release_on_confirmed_cancel: BookingFlowConfig::default().release_on_confirmed_cancel,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TBS_HOST").ok().unwrap_or_else(|| DEFAULT_TBS_HOST.into());
        let port = env::var("TBS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for TBS_PORT. {e} Using the default, {DEFAULT_TBS_PORT}.");
                    DEFAULT_TBS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TBS_PORT);
        let database_url = env::var("TBS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ TBS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let catalog = configure_catalog();
        let external_call_timeout = positive_or_default(
            "TBS_EXTERNAL_CALL_TIMEOUT_MS",
            DEFAULT_EXTERNAL_CALL_TIMEOUT_MS,
            StdDuration::from_millis,
        );
        let cache = CacheConfig {
            cache_enabled: parse_boolean_flag(env::var("TBS_AVAILABILITY_CACHE_ENABLED").ok(), true),
            ttl_seconds: positive_or_default("TBS_AVAILABILITY_CACHE_TTL", DEFAULT_CACHE_TTL_SECONDS, |v| v),
        };
        if !cache.cache_enabled {
            info!("🪛️ The availability cache is disabled. Every availability read goes to the database.");
        }
        let unpaid_booking_timeout = positive_or_default(
            "TBS_UNPAID_BOOKING_TIMEOUT",
            DEFAULT_UNPAID_BOOKING_TIMEOUT.num_minutes() as u64,
            |v| Duration::minutes(v as i64),
        );
        let release_on_confirmed_cancel = parse_boolean_flag(
            env::var("TBS_RELEASE_ON_CONFIRMED_CANCEL").ok(),
            BookingFlowConfig::default().release_on_confirmed_cancel,
        );
        Self {
            host,
            port,
            database_url,
            catalog,
            external_call_timeout,
            cache,
            unpaid_booking_timeout,
            release_on_confirmed_cancel,
        }
    }

    pub fn reservation_config(&self) -> ReservationConfig {
        ReservationConfig { call_timeout: self.external_call_timeout }
    }

    pub fn booking_flow_config(&self) -> BookingFlowConfig {
        BookingFlowConfig { release_on_confirmed_cancel: self.release_on_confirmed_cancel }
    }
}

fn configure_catalog() -> Option<HttpCatalogConfig> {
    let base_url = match env::var("TBS_CATALOG_URL") {
        Ok(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            info!("🪛️ TBS_CATALOG_URL is not set. Events are read from the local database.");
            return None;
        },
    };
    let timeout = positive_or_default("TBS_CATALOG_TIMEOUT", DEFAULT_CATALOG_TIMEOUT.as_secs(), StdDuration::from_secs);
    info!("🪛️ Reading events from the catalog service at {base_url}");
    Some(HttpCatalogConfig { base_url, timeout })
}

fn positive_or_default<T, F>(var: &str, default: u64, convert: F) -> T
where F: Fn(u64) -> T {
    let value = env::var(var).ok();
    match (value.as_deref(), parse_positive_integer(value.as_deref())) {
        (_, Some(v)) => convert(v),
        (None, None) => {
            debug!("🪛️ {var} is not set. Using the default value of {default}.");
            convert(default)
        },
        (Some(s), None) => {
            warn!("🪛️ Invalid configuration value for {var}: {s}. Using the default value of {default}.");
            convert(default)
        },
    }
}
