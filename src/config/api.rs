use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Listing API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Page size defaults and bounds.
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pagination.validate()
    }
}

/// Page size settings applied to every listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Page size used when a request omits `size`.
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    /// Largest `size` a request may ask for. Larger values are rejected
    /// rather than clamped.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl PaginationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size <= 0 {
            return Err(ConfigError::Validation(
                "api.pagination.default_page_size must be positive".into(),
            ));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::Validation(
                "api.pagination.default_page_size cannot exceed max_page_size".into(),
            ));
        }
        Ok(())
    }
}

fn default_page_size() -> i64 {
    20
}

fn default_max_page_size() -> i64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let config = PaginationConfig::default();
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_above_max_rejected() {
        let config = PaginationConfig {
            default_page_size: 50,
            max_page_size: 10,
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_default_rejected() {
        let config = PaginationConfig {
            default_page_size: 0,
            max_page_size: 10,
        };
        assert!(config.validate().is_err());
    }
}
