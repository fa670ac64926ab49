//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, thresholds ordered)
//! - Check endpoint URLs are WebSocket URLs
//! - Check bind addresses of enabled listeners
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before the monitor loop starts

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{Aggregation, EndpointConfig, MonitorConfig};

/// Upper bound on the reconnect backoff cap.
pub const MAX_RECONNECT_DELAY_MS: u64 = 3_600_000;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("evaluation.window_size must be greater than zero")]
    EmptyWindow,

    #[error("evaluation.min_samples must be between 1 and window_size ({window_size}), got {min_samples}")]
    MinSamplesOutOfRange { min_samples: usize, window_size: usize },

    #[error("evaluation.aggregation percentile must be in (0, 100], got {0}")]
    PercentileOutOfRange(f64),

    #[error("evaluation.aggregation {field} ({count}) must be a strict majority of window_size {window_size}")]
    CountNotMajority {
        field: &'static str,
        count: usize,
        window_size: usize,
    },

    #[error("{endpoint}: good_threshold_ms ({good}) must be below bad_threshold_ms ({bad})")]
    ThresholdsInverted { endpoint: String, good: u64, bad: u64 },

    #[error("{endpoint}: {field} must be greater than zero")]
    ZeroDuration { endpoint: String, field: &'static str },

    #[error("{endpoint}: invalid url '{url}': {reason}")]
    InvalidUrl { endpoint: String, url: String, reason: String },

    #[error("connection.reconnect_base_delay_ms ({base}) exceeds reconnect_max_delay_ms ({max})")]
    BackoffInverted { base: u64, max: u64 },

    #[error("connection.reconnect_max_delay_ms ({0}) exceeds the one hour limit")]
    BackoffTooLong(u64),

    #[error("{field}: invalid bind address '{address}'")]
    InvalidAddress { field: &'static str, address: String },
}

/// Check every semantic rule and report all violations together.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_endpoint(&config.primary, &mut errors);
    validate_endpoint(&config.healthcheck, &mut errors);

    let eval = &config.evaluation;
    if eval.window_size == 0 {
        errors.push(ValidationError::EmptyWindow);
    }
    if eval.min_samples == 0 || eval.min_samples > eval.window_size {
        errors.push(ValidationError::MinSamplesOutOfRange {
            min_samples: eval.min_samples,
            window_size: eval.window_size,
        });
    }
    match eval.aggregation {
        Aggregation::Percentile { p } if !(p > 0.0 && p <= 100.0) => {
            errors.push(ValidationError::PercentileOutOfRange(p));
        }
        // Two strict majorities cannot both hold, so Bad and Good never overlap.
        Aggregation::Count {
            min_bad_count,
            min_good_count,
        } => {
            for (field, count) in [("min_bad_count", min_bad_count), ("min_good_count", min_good_count)] {
                if count > eval.window_size || count * 2 <= eval.window_size {
                    errors.push(ValidationError::CountNotMajority {
                        field,
                        count,
                        window_size: eval.window_size,
                    });
                }
            }
        }
        _ => {}
    }

    let conn = &config.connection;
    if conn.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration {
            endpoint: "connection".to_string(),
            field: "connect_timeout_ms",
        });
    }
    if conn.reconnect_base_delay_ms > conn.reconnect_max_delay_ms {
        errors.push(ValidationError::BackoffInverted {
            base: conn.reconnect_base_delay_ms,
            max: conn.reconnect_max_delay_ms,
        });
    }

    if conn.reconnect_max_delay_ms > MAX_RECONNECT_DELAY_MS {
        errors.push(ValidationError::BackoffTooLong(conn.reconnect_max_delay_ms));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            address: config.observability.metrics_address.clone(),
        });
    }
    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "admin.bind_address",
            address: config.admin.bind_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_endpoint(endpoint: &EndpointConfig, errors: &mut Vec<ValidationError>) {
    if endpoint.good_threshold_ms >= endpoint.bad_threshold_ms {
        errors.push(ValidationError::ThresholdsInverted {
            endpoint: endpoint.name.clone(),
            good: endpoint.good_threshold_ms,
            bad: endpoint.bad_threshold_ms,
        });
    }
    for (field, value) in [
        ("probe_interval_ms", endpoint.probe_interval_ms),
        ("timeout_ms", endpoint.timeout_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration {
                endpoint: endpoint.name.clone(),
                field,
            });
        }
    }

    let reason = match Url::parse(&endpoint.url) {
        Ok(url) if matches!(url.scheme(), "ws" | "wss") => None,
        Ok(url) => Some(format!("unsupported scheme '{}'", url.scheme())),
        Err(e) => Some(e.to_string()),
    };
    if let Some(reason) = reason {
        errors.push(ValidationError::InvalidUrl {
            endpoint: endpoint.name.clone(),
            url: endpoint.url.clone(),
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&MonitorConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_violation() {
        let mut config = MonitorConfig::default();
        config.evaluation.window_size = 0;
        config.primary.good_threshold_ms = 300;
        config.healthcheck.url = "http://example.com".to_string();
        config.healthcheck.timeout_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyWindow));
        assert!(errors.contains(&ValidationError::MinSamplesOutOfRange {
            min_samples: 5,
            window_size: 0,
        }));
        assert!(errors.contains(&ValidationError::ThresholdsInverted {
            endpoint: "primary".to_string(),
            good: 300,
            bad: 200,
        }));
        assert!(errors.contains(&ValidationError::ZeroDuration {
            endpoint: "healthcheck".to_string(),
            field: "timeout_ms",
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidUrl { endpoint, .. } if endpoint == "healthcheck")));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_equal_thresholds_rejected() {
        let mut config = MonitorConfig::default();
        config.primary.good_threshold_ms = 200;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_aggregation_bounds() {
        let mut config = MonitorConfig::default();
        config.evaluation.aggregation = Aggregation::Percentile { p: 0.0 };
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::PercentileOutOfRange(0.0)])
        );

        config.evaluation.aggregation = Aggregation::Count {
            min_bad_count: 7,
            min_good_count: 5,
        };
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::CountNotMajority {
                field: "min_good_count",
                count: 5,
                window_size: 10,
            }])
        );

        config.evaluation.aggregation = Aggregation::Count {
            min_bad_count: 11,
            min_good_count: 7,
        };
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::CountNotMajority {
                field: "min_bad_count",
                count: 11,
                window_size: 10,
            }])
        );

        config.evaluation.aggregation = Aggregation::Count {
            min_bad_count: 7,
            min_good_count: 7,
        };
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_backoff_cap_is_bounded() {
        let mut config = MonitorConfig::default();
        config.connection.reconnect_max_delay_ms = u64::MAX;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::BackoffTooLong(u64::MAX)])
        );

        config.connection.reconnect_max_delay_ms = MAX_RECONNECT_DELAY_MS;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_disabled_listeners_skip_address_checks() {
        let mut config = MonitorConfig::default();
        config.admin.bind_address = "not an address".to_string();
        assert_eq!(validate_config(&config), Ok(()));

        config.admin.enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidAddress {
                field: "admin.bind_address",
                address: "not an address".to_string(),
            }])
        );
    }
}
