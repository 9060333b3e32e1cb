//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::types::MediaType;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_file_size_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_bytes must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.max_alloc_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_alloc_bytes must be > 0".into(),
            ));
        }
        if self.limits.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.preview.max_edge == 0 {
            return Err(ConfigError::ValidationError(
                "preview.max_edge must be > 0".into(),
            ));
        }
        if !(1..=100).contains(&self.preview.quality) {
            return Err(ConfigError::ValidationError(
                "preview.quality must be between 1 and 100".into(),
            ));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::ValidationError(
                "output.quality must be between 1 and 100".into(),
            ));
        }
        if MediaType::from_name(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be \"jpeg\" or \"png\", got {:?}",
                self.output.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_file_size() {
        let mut config = Config::default();
        config.limits.max_file_size_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_file_size_bytes"));
    }

    #[test]
    fn test_validate_rejects_zero_parallel_workers() {
        let mut config = Config::default();
        config.processing.parallel_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("parallel_workers"));
    }

    #[test]
    fn test_validate_rejects_zero_alloc_limit() {
        let mut config = Config::default();
        config.limits.max_alloc_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_alloc_bytes"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.request_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_quality() {
        let mut config = Config::default();
        config.output.quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.quality"));

        let mut config = Config::default();
        config.preview.quality = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("preview.quality"));
    }

    #[test]
    fn test_validate_rejects_unknown_output_format() {
        let mut config = Config::default();
        config.output.format = "webp".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.format"));
    }
}
