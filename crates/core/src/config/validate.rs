use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Engine timeout and log capacity are not 0
/// - Upload limit is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Engine validation
    if config.engine.exec_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine.exec_timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.engine.log_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "engine.log_capacity cannot be 0".to_string(),
        ));
    }

    if config.files.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "files.max_upload_bytes cannot be 0".to_string(),
        ));
    }

    Ok(())
}
