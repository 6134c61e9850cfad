use payrelay::{DEFAULT_CALLBACK_PATH, DEFAULT_SIGNATURE_PATH};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_SALT_INDEX: &str = "1";
const DEFAULT_RATE_LIMIT_RPM: u64 = 120;
const MIN_SALT_KEY_LEN: usize = 16;

#[derive(Clone)]
pub struct RelayConfig {
    /// Listening port
    pub port: u16,
    /// Listening address
    pub bind_addr: String,
    /// Salt key shared with the payment provider
    pub salt_key: String,
    /// Salt index the provider appends after `###` (informational)
    pub salt_index: String,
    /// Endpoint path the provider mixes into the signature
    pub signature_path: String,
    /// Route the provider posts callbacks to
    pub callback_path: String,
    /// CORS allowed origins (empty = localhost only)
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute per IP
    pub rate_limit_rpm: u64,
    /// Bearer token required for /metrics
    pub metrics_token: Option<String>,
    /// Serve /metrics without a token when none is configured
    pub public_metrics: bool,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("port", &self.port)
            .field("bind_addr", &self.bind_addr)
            .field("salt_key", &"[REDACTED]")
            .field("salt_index", &self.salt_index)
            .field("signature_path", &self.signature_path)
            .field("callback_path", &self.callback_path)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("public_metrics", &self.public_metrics)
            .finish()
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        // Required: salt key
        let salt_key = var("PAYRELAY_SALT_KEY")
            .ok_or(ConfigError::MissingRequired("PAYRELAY_SALT_KEY"))?;
        if salt_key.len() < MIN_SALT_KEY_LEN {
            tracing::warn!(
                "PAYRELAY_SALT_KEY is only {} bytes; check it matches the provider's salt key",
                salt_key.len()
            );
        }

        let port = match var("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: p,
            })?,
            None => DEFAULT_PORT,
        };

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let salt_index =
            var("PAYRELAY_SALT_INDEX").unwrap_or_else(|| DEFAULT_SALT_INDEX.to_string());

        let signature_path = route_path(
            "PAYRELAY_SIGNATURE_PATH",
            var("PAYRELAY_SIGNATURE_PATH"),
            DEFAULT_SIGNATURE_PATH,
        )?;
        let callback_path = route_path(
            "PAYRELAY_CALLBACK_PATH",
            var("PAYRELAY_CALLBACK_PATH"),
            DEFAULT_CALLBACK_PATH,
        )?;

        let allowed_origins: Vec<String> = var("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if allowed_origins.iter().any(|o| o == "*") {
            tracing::warn!("ALLOWED_ORIGINS contains '*'; any site can poll payment statuses");
        }

        let rate_limit_rpm = match var("RATE_LIMIT_RPM") {
            Some(r) => match r.parse() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: "RATE_LIMIT_RPM",
                        value: r,
                    })
                }
                Ok(n) => n,
            },
            None => DEFAULT_RATE_LIMIT_RPM,
        };

        let metrics_token = var("METRICS_TOKEN");

        let public_metrics = var("PAYRELAY_PUBLIC_METRICS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            port,
            bind_addr,
            salt_key,
            salt_index,
            signature_path,
            callback_path,
            allowed_origins,
            rate_limit_rpm,
            metrics_token,
            public_metrics,
        })
    }
}

fn route_path(
    key: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<String, ConfigError> {
    match value {
        Some(path) if path.starts_with('/') => Ok(path),
        Some(path) => Err(ConfigError::InvalidValue { key, value: path }),
        None => Ok(default.to_string()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
