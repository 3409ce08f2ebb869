use std::path::Path;

use crate::config::schema::AppConfig;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<AppConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: AppConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Checks the rules the schema cannot express.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    if config.max_document_chars == 0 {
        return Err(ConfigError::Validation {
            message: "max_document_chars must be at least 1".to_string(),
        });
    }

    if config.default_query.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "default_query must not be blank".to_string(),
        });
    }

    let retry = &config.completion.retry;
    if retry.max_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "completion.retry.max_attempts must be at least 1".to_string(),
        });
    }
    if retry.initial_backoff_ms > retry.max_backoff_ms {
        return Err(ConfigError::Validation {
            message: "completion.retry.initial_backoff_ms exceeds max_backoff_ms".to_string(),
        });
    }

    config.pipeline_config().validate()?;

    Ok(())
}
