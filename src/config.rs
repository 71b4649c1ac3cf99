use std::{env, str::FromStr, time::Duration};

use crate::{
    codec::{ConnectionParameters, IndoorBikeDataLayout, RangeTriple},
    error::{Error, ErrorType},
};

pub const NOTIFY_INTERVAL_ENV: &str = "FTMS_NOTIFY_INTERVAL_MS";
pub const LOCAL_NAME_ENV: &str = "FTMS_LOCAL_NAME";
pub const DEVICE_NAME_ENV: &str = "FTMS_DEVICE_NAME";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub notify_interval: Duration,
    pub local_name: String,
    pub device_name: String,
    pub appearance: u16,
    pub connection_parameters: ConnectionParameters,
    /// Register the Generic Access service ourselves. Most host stacks
    /// already expose one.
    pub generic_access: bool,
    pub training_status: u8,
    pub machine_status: u8,
    pub indoor_bike: IndoorBikeDataLayout,
    pub power_range: RangeTriple,
    pub resistance_range: RangeTriple,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            notify_interval: Duration::from_millis(1000),
            local_name: String::from("HERL FM"),
            device_name: String::from("HERL HR"),
            appearance: 833,
            connection_parameters: ConnectionParameters {
                min_interval: 24,
                max_interval: 40,
                latency: 0,
                timeout: 400,
            },
            generic_access: false,
            training_status: 0x02,
            machine_status: 0x02,
            indoor_bike: IndoorBikeDataLayout::default(),
            power_range: RangeTriple::new(0, 2000, 1),
            resistance_range: RangeTriple::new(0, 100, 1),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServerConfig::default();
        if let Some(raw) = lookup(NOTIFY_INTERVAL_ENV) {
            let millis: u64 = parse_var(NOTIFY_INTERVAL_ENV, &raw)?;
            if millis == 0 {
                return Err(Error::new(
                    NOTIFY_INTERVAL_ENV,
                    "notify interval must be positive",
                    ErrorType::Config,
                ));
            }
            config.notify_interval = Duration::from_millis(millis);
        }
        if let Some(name) = lookup(LOCAL_NAME_ENV) {
            config.local_name = name;
        }
        if let Some(name) = lookup(DEVICE_NAME_ENV) {
            config.device_name = name;
        }
        Ok(config)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| {
        Error::new(
            key.to_string(),
            format!("{}: {}", raw, err),
            ErrorType::Config,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.notify_interval, Duration::from_millis(1000));
        assert_eq!(config.local_name, "HERL FM");
        assert_eq!(config.power_range, RangeTriple::new(0, 2000, 1));
    }

    #[test]
    fn overrides_are_applied() {
        let config = ServerConfig::from_lookup(lookup(&[
            (NOTIFY_INTERVAL_ENV, "500"),
            (LOCAL_NAME_ENV, "Trainer"),
        ]))
        .unwrap();
        assert_eq!(config.notify_interval, Duration::from_millis(500));
        assert_eq!(config.local_name, "Trainer");
        assert_eq!(config.device_name, "HERL HR");
    }

    #[test]
    fn bad_interval_is_rejected() {
        for raw in ["soon", "0", "-5"] {
            let err = ServerConfig::from_lookup(lookup(&[(NOTIFY_INTERVAL_ENV, raw)])).unwrap_err();
            assert_eq!(err.error_type(), &ErrorType::Config);
        }
    }
}
