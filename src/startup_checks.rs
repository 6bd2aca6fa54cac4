use crate::Config;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Limit '{0}' must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("max_memory ({max_memory}) is larger than max_file_size ({max_file_size})")]
    MemoryExceedsFileSize { max_memory: u64, max_file_size: u64 },

    #[error("Quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    #[error("Compression level must be between 0 and 9, got {0}")]
    InvalidCompression(u8),

    #[error("Processing timeout must be greater than zero")]
    ZeroTimeout,
}

impl StartupCheckError {
    /// Whether the server should refuse to start.
    ///
    /// Critical errors would make every scale request fail.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StartupCheckError::ZeroLimit(_) | StartupCheckError::ZeroTimeout
        )
    }
}

pub fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let upload = &config.upload;
    if upload.max_file_size == 0 {
        errors.push(StartupCheckError::ZeroLimit("max_file_size"));
    }
    if upload.max_memory == 0 {
        errors.push(StartupCheckError::ZeroLimit("max_memory"));
    }
    if upload.max_memory > upload.max_file_size {
        warn!(
            "max_memory {} exceeds max_file_size {}",
            upload.max_memory, upload.max_file_size
        );
        errors.push(StartupCheckError::MemoryExceedsFileSize {
            max_memory: upload.max_memory,
            max_file_size: upload.max_file_size,
        });
    }

    let processing = &config.processing;
    if !(1..=100).contains(&processing.quality) {
        errors.push(StartupCheckError::InvalidQuality(processing.quality));
    }
    if processing.compression > 9 {
        errors.push(StartupCheckError::InvalidCompression(processing.compression));
    }
    if processing.processing_timeout_secs == Some(0) {
        errors.push(StartupCheckError::ZeroTimeout);
    }
    if processing.max_input_dimension == 0 {
        errors.push(StartupCheckError::ZeroLimit("max_input_dimension"));
    }
    if processing.max_output_pixels == 0 {
        errors.push(StartupCheckError::ZeroLimit("max_output_pixels"));
    }

    info!(
        "Upload limits: max_file_size={} bytes, max_memory={} bytes",
        upload.max_file_size, upload.max_memory
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(perform_startup_checks(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_file_size_is_critical() {
        let mut config = Config::default();
        config.upload.max_file_size = 0;

        let errors = perform_startup_checks(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.is_critical()));
    }

    #[test]
    fn test_out_of_range_processing_values() {
        let mut config = Config::default();
        config.processing.quality = 0;
        config.processing.compression = 12;

        let errors = perform_startup_checks(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| !e.is_critical()));
        assert!(matches!(errors[0], StartupCheckError::InvalidQuality(0)));
        assert!(matches!(errors[1], StartupCheckError::InvalidCompression(12)));
    }

    #[test]
    fn test_zero_timeout_is_critical() {
        let mut config = Config::default();
        config.processing.processing_timeout_secs = Some(0);

        let errors = perform_startup_checks(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], StartupCheckError::ZeroTimeout));
        assert!(errors[0].is_critical());
    }

    #[test]
    fn test_zero_processing_limits_are_critical() {
        let mut config = Config::default();
        config.processing.max_input_dimension = 0;
        config.processing.max_output_pixels = 0;

        let errors = perform_startup_checks(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.is_critical()));
    }

    #[test]
    fn test_memory_larger_than_file_size() {
        let mut config = Config::default();
        config.upload.max_memory = 2048;
        config.upload.max_file_size = 1024;

        let errors = perform_startup_checks(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            StartupCheckError::MemoryExceedsFileSize {
                max_memory: 2048,
                max_file_size: 1024
            }
        ));
    }
}
