/// Configuration management for the purge service
///
/// Settings are layered lowest to highest priority:
/// 1. `appsettings.json` (optional)
/// 2. `appsettings.local.json` (optional)
/// 3. Environment variables (a `.env` file is loaded first)
///
/// Optional features are modelled as `Option` values: no secondary path means no
/// secondary targets, no distribution id means no CDN steps at all.
use crate::error::{PurgeError, Result};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat, Map, Source, Value};
use secrecy::SecretString;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const BASE_SETTINGS_FILE: &str = "appsettings.json";
pub const LOCAL_SETTINGS_FILE: &str = "appsettings.local.json";

const DEFAULT_REGION: &str = "ap-southeast-2";
const DEFAULT_EXTENSION: &str = ".webp";
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Fully validated configuration for one run
#[derive(Debug)]
pub struct PurgeConfig {
    pub storage: StorageConfig,
    pub paths: PathConfig,
    pub cdn: Option<CdnConfig>,
    pub runtime: RuntimeConfig,
}

#[derive(Debug)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Static credentials; `None` uses the default AWS credential chain
    pub credentials: Option<AwsCredentials>,
}

#[derive(Debug)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
}

/// Where a logical identifier lives in the bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    pub primary_path: String,
    pub secondary_path: Option<String>,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnConfig {
    pub distribution_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Identifiers processed in parallel
    pub concurrency: usize,
    /// Log invalidation commands instead of calling the CDN API
    pub dry_run: bool,
    /// Only invalidate paths the public edge still serves
    pub gate_on_edge_presence: bool,
    /// Submit all cached paths of one identifier in a single invalidation
    pub batch_invalidations: bool,
    pub call_timeout: Duration,
    /// Retry budget for transient provider failures
    pub max_retries: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            dry_run: false,
            gate_on_edge_presence: true,
            batch_invalidations: false,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            max_retries: 0,
        }
    }
}

/// Flat settings as they appear in files and the environment, keyed case-insensitively
#[derive(Debug, Default)]
struct RawSettings {
    values: HashMap<String, Value>,
}

impl RawSettings {
    fn new(table: Map<String, Value>) -> Self {
        // Lowercase keys are inserted last so they win over differently-cased duplicates
        let (lower, other): (Vec<_>, Vec<_>) = table
            .into_iter()
            .partition(|(key, _)| *key == key.to_lowercase());

        let mut values = HashMap::new();
        for (key, value) in other.into_iter().chain(lower) {
            values.insert(key.to_lowercase(), value);
        }
        Self { values }
    }

    fn string(&self, key: &str) -> Result<Option<String>> {
        self.get(key, Value::into_string)
    }

    fn flag(&self, key: &str) -> Result<Option<bool>> {
        self.get(key, Value::into_bool)
    }

    fn number<T: TryFrom<i64>>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key, Value::into_int)? {
            None => Ok(None),
            Some(n) => T::try_from(n).map(Some).map_err(|_| {
                PurgeError::ConfigurationMissing(format!("{key} is out of range: {n}"))
            }),
        }
    }

    fn get<T>(
        &self,
        key: &str,
        convert: fn(Value) -> std::result::Result<T, config::ConfigError>,
    ) -> Result<Option<T>> {
        match self.values.get(&key.to_lowercase()) {
            None => Ok(None),
            // Blank values (e.g. `PURGE_DRY_RUN=` in the environment) fall back to defaults
            Some(value) if is_blank(value) => Ok(None),
            Some(value) => convert(value.clone()).map(Some).map_err(|e| {
                PurgeError::ConfigurationMissing(format!("{key} is invalid: {e}"))
            }),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    matches!(value.clone().into_string(), Ok(text) if text.trim().is_empty())
}

impl PurgeConfig {
    /// Load configuration from the settings files in `dir` and the environment
    pub fn load(dir: &Path) -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let base = dir.join(BASE_SETTINGS_FILE);
        let local = dir.join(LOCAL_SETTINGS_FILE);

        let builder = config::Config::builder()
            .add_source(File::new(&base.to_string_lossy(), FileFormat::Json).required(false))
            .add_source(File::new(&local.to_string_lossy(), FileFormat::Json).required(false))
            .add_source(Environment::default());

        Self::from_builder(builder)
    }

    /// Build configuration from an in-memory JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_builder(
            config::Config::builder().add_source(File::from_str(json, FileFormat::Json)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let raw = RawSettings::new(builder.build()?.collect()?);
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let bucket = require(raw.string("S3_BUCKET")?, "S3_BUCKET")?;
        let primary_path = require(raw.string("S3_PATH")?, "S3_PATH")?;

        let credentials = match (
            non_blank(raw.string("AWS_ACCESS_KEY")?),
            non_blank(raw.string("AWS_SECRET_KEY")?),
        ) {
            (Some(access_key_id), Some(secret)) => Some(AwsCredentials {
                access_key_id,
                secret_access_key: SecretString::from(secret),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(PurgeError::ConfigurationMissing(
                    "AWS_SECRET_KEY must be set together with AWS_ACCESS_KEY".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(PurgeError::ConfigurationMissing(
                    "AWS_ACCESS_KEY must be set together with AWS_SECRET_KEY".to_string(),
                ))
            }
        };

        let concurrency = raw
            .number::<usize>("PURGE_CONCURRENCY")?
            .unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(PurgeError::ConfigurationMissing(
                "PURGE_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let timeout_secs = raw
            .number::<u64>("PURGE_CALL_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_CALL_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(PurgeError::ConfigurationMissing(
                "PURGE_CALL_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            storage: StorageConfig {
                bucket,
                region: non_blank(raw.string("AWS_REGION")?)
                    .unwrap_or_else(|| DEFAULT_REGION.to_string()),
                credentials,
            },
            paths: PathConfig {
                primary_path,
                secondary_path: non_blank(raw.string("S3_SECONDARY_PATH")?),
                extension: non_blank(raw.string("FILE_EXTENSION")?)
                    .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
            },
            cdn: non_blank(raw.string("CDN_DISTRIBUTION_ID")?)
                .map(|distribution_id| CdnConfig { distribution_id }),
            runtime: RuntimeConfig {
                concurrency,
                dry_run: raw.flag("PURGE_DRY_RUN")?.unwrap_or(false),
                gate_on_edge_presence: raw.flag("PURGE_GATE_ON_EDGE")?.unwrap_or(true),
                batch_invalidations: raw.flag("PURGE_BATCH_INVALIDATIONS")?.unwrap_or(false),
                call_timeout: Duration::from_secs(timeout_secs),
                max_retries: raw.number::<u32>("PURGE_MAX_RETRIES")?.unwrap_or(0),
            },
        })
    }

    pub fn secondary_enabled(&self) -> bool {
        self.paths.secondary_path.is_some()
    }

    pub fn cdn_enabled(&self) -> bool {
        self.cdn.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require(value: Option<String>, key: &str) -> Result<String> {
    non_blank(value).ok_or_else(|| PurgeError::ConfigurationMissing(format!("{key} is not set")))
}
