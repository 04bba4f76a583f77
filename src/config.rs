use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, Source};
use serde::{Deserialize, Serialize};

/// Application configuration loaded from config.toml or environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub chain_rpc: ChainRpcConfig,
    pub detector: DetectorConfig,
}

/// Ethereum JSON-RPC endpoint and transport policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRpcConfig {
    pub url: String,
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_seconds: u64,
    pub concurrent_requests: usize,
}

impl Default for ChainRpcConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".to_string(),
            timeout_seconds: 30,
            max_retries: 5,
            initial_backoff_ms: 200,
            backoff_multiplier: 2.0,
            max_backoff_seconds: 10,
            concurrent_requests: 8,
        }
    }
}

/// Block detector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Tag to watch for; empty means "must be supplied on the command line"
    pub tag: String,
    /// Payload keys to extract, in order
    pub data_keys: Vec<String>,
    /// Suppress per-block and per-match log output
    pub silent: bool,
    /// How often the head block number is polled
    pub poll_interval_ms: u64,
    /// Bound on block notifications waiting to be processed
    pub queue_capacity: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tag: String::new(),
            data_keys: Vec::new(),
            silent: false,
            poll_interval_ms: 2000,
            queue_capacity: 64,
        }
    }
}

impl AppConfig {
    /// Load configuration from config.toml file and environment variables
    /// Environment variables take precedence over file configuration
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration using `path` (without extension) as the optional file source
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let rpc = ChainRpcConfig::default();
        let detector = DetectorConfig::default();
        let builder = Config::builder()
            // Chain RPC defaults
            .set_default("chain_rpc.url", rpc.url)?
            .set_default("chain_rpc.timeout_seconds", rpc.timeout_seconds)?
            .set_default("chain_rpc.max_retries", rpc.max_retries as i64)?
            .set_default("chain_rpc.initial_backoff_ms", rpc.initial_backoff_ms)?
            .set_default("chain_rpc.backoff_multiplier", rpc.backoff_multiplier)?
            .set_default("chain_rpc.max_backoff_seconds", rpc.max_backoff_seconds)?
            .set_default(
                "chain_rpc.concurrent_requests",
                rpc.concurrent_requests as i64,
            )?
            // Detector defaults
            .set_default("detector.tag", detector.tag)?
            .set_default("detector.data_keys", Vec::<String>::new())?
            .set_default("detector.silent", detector.silent)?
            .set_default("detector.poll_interval_ms", detector.poll_interval_ms)?
            .set_default("detector.queue_capacity", detector.queue_capacity as i64)?
            // Load from config.toml if it exists
            .add_source(File::with_name(path).required(false));

        // CHAIN_RPC_* env variables override the RPC section, GHOSTTAG_* the detector section
        let builder = layer_env_section(builder, "chain_rpc", "CHAIN_RPC")?;
        let builder = layer_env_section(builder, "detector", "GHOSTTAG")?;

        let mut app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.detector.data_keys = normalise_keys(&app_config.detector.data_keys);
        Ok(app_config)
    }

    /// Get default config values for CLI argument defaults
    pub fn get_defaults() -> Self {
        // Try to load config for defaults, but don't fail if not found
        Self::load().unwrap_or_else(|_| Self {
            chain_rpc: ChainRpcConfig::default(),
            detector: DetectorConfig::default(),
        })
    }
}

/// Split a comma-separated key list, dropping blanks
pub fn split_keys(raw: &str) -> Vec<String> {
    normalise_keys(raw.split(','))
}

fn normalise_keys<I, S>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .map(|k| k.as_ref().trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Overlay every `<PREFIX>_<FIELD>` variable onto `<section>.<field>`
fn layer_env_section(
    builder: ConfigBuilder<DefaultState>,
    section: &str,
    prefix: &str,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let vars = Environment::with_prefix(prefix)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("data_keys")
        .collect()?;

    vars.into_iter().try_fold(builder, |builder, (key, value)| {
        builder.set_override(format!("{}.{}", section, key), value)
    })
}
