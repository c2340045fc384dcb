use crate::config::types::{ApiConfig, ClassifierConfig, Config, RetryConfig, RunConfig, TaskConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_run_config(&config.run)?;
    validate_api_config(&config.api)?;
    validate_retry_config(&config.retry)?;
    validate_task_config(&config.task)?;
    validate_classifier_config(&config.classifier)?;
    Ok(())
}

/// Checks that a credential is available unless the client is bypassed
pub fn validate_credentials(config: &Config) -> Result<(), ConfigError> {
    if config.run.dry_run {
        return Ok(());
    }
    match config.api.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingCredential),
    }
}

fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.progress_every < 1 {
        return Err(ConfigError::Validation(format!(
            "progress_every must be >= 1, got {}",
            config.progress_every
        )));
    }

    if let Some(output) = &config.output_path {
        if output == &config.input_path {
            return Err(ConfigError::Validation(format!(
                "output_path must differ from input_path ({})",
                output.display()
            )));
        }
    }

    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::Validation(format!("Invalid endpoint: {}", e)))?;
    if endpoint.scheme() != "https" && endpoint.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "endpoint must use http(s), got {}",
            endpoint.scheme()
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0 and 2, got {}",
            config.temperature
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(
            "max_retries must be >= 1".to_string(),
        ));
    }

    if !config.backoff_base.is_finite() || config.backoff_base < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_base must be >= 1, got {}",
            config.backoff_base
        )));
    }

    Ok(())
}

fn validate_task_config(config: &TaskConfig) -> Result<(), ConfigError> {
    if config.context_fields.is_empty() {
        return Err(ConfigError::Validation(
            "context_fields cannot be empty".to_string(),
        ));
    }

    if config.context_fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "context_fields cannot contain blank names".to_string(),
        ));
    }

    if config.max_field_length < 1 {
        return Err(ConfigError::Validation(
            "max_field_length must be >= 1".to_string(),
        ));
    }

    if config.ementa_column.trim().is_empty() {
        return Err(ConfigError::Validation(
            "ementa_column cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    validate_domain_string(&config.authority_domain)?;
    validate_domain_string(&config.authority_suffix)?;
    validate_label(&config.regional_prefix)?;

    for domain in &config.general_domains {
        validate_domain_string(domain)?;
    }

    Ok(())
}

/// Validates a single DNS label (letters, digits, hyphens)
fn validate_label(label: &str) -> Result<(), ConfigError> {
    if label.is_empty()
        || label.starts_with('-')
        || label.ends_with('-')
        || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "'{}' is not a valid domain label",
            label
        )));
    }
    Ok(())
}

/// Validates a lowercase domain string such as `tse.jus.br`
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if domain != domain.to_lowercase() {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must be lowercase",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., jus.br, not just "br")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot",
            domain
        )));
    }

    for label in domain.split('.') {
        validate_label(label).map_err(|_| {
            ConfigError::InvalidPattern(format!("Domain '{}' contains an invalid label", domain))
        })?;
    }

    Ok(())
}
