use std::{
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

use http::{HeaderName, Method};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request body size limit in bytes. Listing requests carry no body, so
    /// this only bounds what a misbehaving client can push at the server.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            timeout_secs: default_timeout(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8008
}

fn default_body_limit() -> usize {
    64 * 1024 // 64 KB
}

fn default_timeout() -> u64 {
    30
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Enable CORS.
    #[serde(default = "default_cors_enabled")]
    pub enabled: bool,

    /// Allowed origins. Use ["*"] for any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Allowed HTTP methods.
    #[serde(default = "default_cors_methods")]
    pub allowed_methods: Vec<String>,

    /// Allowed headers.
    #[serde(default = "default_cors_headers")]
    pub allowed_headers: Vec<String>,

    /// Max age for preflight cache in seconds.
    #[serde(default = "default_cors_max_age")]
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_cors_enabled(),
            allowed_origins: vec![],
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
            max_age_secs: default_cors_max_age(),
        }
    }
}

impl CorsConfig {
    /// Build a CorsLayer from the configuration.
    ///
    /// Returns None if CORS is disabled. An empty `allowed_origins` rejects
    /// every cross-origin request; `["*"]` allows any origin.
    pub fn into_layer(self) -> Option<CorsLayer> {
        if !self.enabled {
            tracing::debug!("CORS is disabled");
            return None;
        }

        let allow_origin = if self.allowed_origins.is_empty() {
            tracing::info!(
                "CORS: No allowed_origins configured - cross-origin requests will be rejected"
            );
            AllowOrigin::list(std::iter::empty::<http::HeaderValue>())
        } else if self.allowed_origins.len() == 1 && self.allowed_origins[0] == "*" {
            tracing::warn!("CORS: Allowing any origin (allowed_origins = [\"*\"])");
            AllowOrigin::any()
        } else {
            let origins: Vec<http::HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!(origin = %origin, "Invalid CORS origin, skipping");
                        None
                    })
                })
                .collect();
            tracing::info!(origins = ?self.allowed_origins, "CORS: Allowing specific origins");
            AllowOrigin::list(origins)
        };

        let methods: Vec<Method> = self
            .allowed_methods
            .iter()
            .filter_map(|m| {
                m.parse().ok().or_else(|| {
                    tracing::warn!(method = %m, "Invalid CORS method, skipping");
                    None
                })
            })
            .collect();

        let headers: Vec<HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| {
                h.parse().ok().or_else(|| {
                    tracing::warn!(header = %h, "Invalid CORS header, skipping");
                    None
                })
            })
            .collect();

        Some(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods(AllowMethods::list(methods))
                .allow_headers(AllowHeaders::list(headers))
                .max_age(Duration::from_secs(self.max_age_secs)),
        )
    }
}

fn default_cors_enabled() -> bool {
    true
}

fn default_cors_methods() -> Vec<String> {
    vec!["GET".to_string(), "OPTIONS".to_string()]
}

fn default_cors_headers() -> Vec<String> {
    vec!["Content-Type".to_string(), "X-Request-Id".to_string()]
}

fn default_cors_max_age() -> u64 {
    86400 // 24 hours
}
