use clap::{Arg, ArgMatches, Command};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::errors::ValidationError;

const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for an OBS bucket
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ObsStorageConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    /// Signing region; derived from the endpoint when unset
    #[serde(default)]
    pub region: Option<String>,
    /// Whole-request timeout; only the connect phase is bounded when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ObsStorageConfig {
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: None,
            timeout_secs: None,
        }
    }

    /// Check that every required field is present. Reports all missing fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing: Vec<&'static str> = [
            ("endpoint", &self.endpoint),
            ("bucket", &self.bucket),
            ("access_key", &self.access_key),
            ("secret_key", &self.secret_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingConfigFields(missing))
        }
    }

    /// Region used for request signing.
    ///
    /// Huawei endpoints look like `obs.<region>.myhuaweicloud.com`.
    pub fn region(&self) -> String {
        if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            return region.to_string();
        }

        let host = self
            .endpoint
            .split("://")
            .last()
            .unwrap_or_default()
            .split(['/', ':'])
            .next()
            .unwrap_or_default();

        let mut labels = host.split('.');
        match (labels.next(), labels.next(), labels.next()) {
            (Some("obs"), Some(region), Some(_)) if !region.is_empty() => region.to_string(),
            _ => DEFAULT_REGION.to_string(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Register the `obs.*` flags on `cmd`
    pub fn register_flags(cmd: Command) -> Command {
        Self::register_flags_with_prefix(cmd, "")
    }

    /// Register the `obs.*` flags on `cmd`, each name prefixed with `prefix`.
    ///
    /// Every flag can also be set through an environment variable derived
    /// from its name, e.g. `ruler.obs.access-key` reads `RULER_OBS_ACCESS_KEY`.
    pub fn register_flags_with_prefix(cmd: Command, prefix: &str) -> Command {
        FLAGS.iter().fold(cmd, |cmd, (name, help)| {
            let id = flag_name(prefix, name);
            cmd.arg(
                Arg::new(id.clone())
                    .long(id.clone())
                    .env(env_name(&id))
                    .help(*help)
                    .global(true),
            )
        })
    }

    /// Build a config from matches of a command set up with `register_flags`
    pub fn from_arg_matches(matches: &ArgMatches) -> Self {
        Self::from_arg_matches_with_prefix(matches, "")
    }

    pub fn from_arg_matches_with_prefix(matches: &ArgMatches, prefix: &str) -> Self {
        let get = |name: &str| {
            matches
                .get_one::<String>(&flag_name(prefix, name))
                .cloned()
        };

        Self {
            endpoint: get("endpoint").unwrap_or_default(),
            bucket: get("bucket").unwrap_or_default(),
            access_key: get("access-key").unwrap_or_default(),
            secret_key: get("secret-key").unwrap_or_default(),
            region: get("region"),
            timeout_secs: None,
        }
    }

    /// Read the config from `OBS_ENDPOINT`, `OBS_BUCKET`, `OBS_ACCESS_KEY`,
    /// `OBS_SECRET_KEY` and `OBS_REGION`
    pub fn from_env() -> Self {
        let get = |name: &str| std::env::var(env_name(&flag_name("", name))).ok();

        Self {
            endpoint: get("endpoint").unwrap_or_default(),
            bucket: get("bucket").unwrap_or_default(),
            access_key: get("access-key").unwrap_or_default(),
            secret_key: get("secret-key").unwrap_or_default(),
            region: get("region"),
            timeout_secs: get("timeout-secs").and_then(|v| v.parse().ok()),
        }
    }
}

const FLAGS: [(&str, &str); 5] = [
    ("endpoint", "OBS endpoint"),
    ("bucket", "OBS bucket name"),
    ("access-key", "OBS access key"),
    ("secret-key", "OBS secret key"),
    ("region", "OBS region used for request signing"),
];

fn flag_name(prefix: &str, name: &str) -> String {
    format!("{}obs.{}", prefix, name)
}

fn env_name(flag: &str) -> String {
    flag.chars()
        .map(|c| match c {
            '.' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}
