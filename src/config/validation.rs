use super::models::Settings;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("concurrency_limit must be at least 1")]
    ZeroConcurrencyLimit,

    #[error("Fetch method must not be empty")]
    EmptyMethod,

    #[error("Timeout must be positive: {field} = {value}")]
    InvalidTimeout { field: String, value: u64 },

    #[error("User agent must not be empty")]
    EmptyUserAgent,

    #[error("Invalid proxy scheme in '{proxy}', expected http://, https:// or socks5://")]
    InvalidProxyScheme { proxy: String },

    #[error("External client binary must not be empty")]
    EmptyCurlBinary,

    #[error("{field} must not be empty")]
    EmptyPath { field: String },
}

/// Validate the entire configuration
pub fn validate(settings: &Settings) -> Result<(), ValidationError> {
    validate_download(settings)?;
    validate_http(settings)?;
    validate_curl(settings)?;
    validate_output(settings)?;
    Ok(())
}

fn validate_download(settings: &Settings) -> Result<(), ValidationError> {
    // An unknown method is fine (it falls back to `fetch`), a blank one is a typo
    if settings.download.method.trim().is_empty() {
        return Err(ValidationError::EmptyMethod);
    }

    if settings.download.concurrency_limit == 0 {
        return Err(ValidationError::ZeroConcurrencyLimit);
    }

    Ok(())
}

fn validate_http(settings: &Settings) -> Result<(), ValidationError> {
    let http = &settings.http;

    for (field, value) in [
        ("connect_timeout_secs", http.connect_timeout_secs),
        ("request_timeout_secs", http.request_timeout_secs),
    ] {
        if value == 0 {
            return Err(ValidationError::InvalidTimeout {
                field: field.to_string(),
                value,
            });
        }
    }

    if http.user_agent.trim().is_empty() {
        return Err(ValidationError::EmptyUserAgent);
    }

    if let Some(proxy) = &http.proxy {
        let valid = ["http://", "https://", "socks5://"]
            .iter()
            .any(|scheme| proxy.starts_with(scheme));
        if !valid {
            return Err(ValidationError::InvalidProxyScheme {
                proxy: proxy.clone(),
            });
        }
    }

    Ok(())
}

fn validate_curl(settings: &Settings) -> Result<(), ValidationError> {
    if settings.curl.binary.trim().is_empty() {
        return Err(ValidationError::EmptyCurlBinary);
    }
    Ok(())
}

fn validate_output(settings: &Settings) -> Result<(), ValidationError> {
    let output = &settings.output;

    for (field, path) in [
        ("output.dir", &output.dir),
        ("output.failed_output", &output.failed_output),
        ("output.missing_output", &output.missing_output),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyPath {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_defaults() {
        assert!(validate(&Settings::default()).is_ok());
    }

    #[test]
    fn test_zero_concurrency_limit() {
        let mut settings = Settings::default();
        settings.download.concurrency_limit = 0;

        assert!(matches!(
            validate(&settings),
            Err(ValidationError::ZeroConcurrencyLimit)
        ));
    }

    #[test]
    fn test_blank_method() {
        let mut settings = Settings::default();
        settings.download.method = "  ".to_string();

        assert!(matches!(validate(&settings), Err(ValidationError::EmptyMethod)));
    }

    #[test]
    fn test_unknown_method_is_allowed() {
        let mut settings = Settings::default();
        settings.download.method = "wget".to_string();

        assert!(validate(&settings).is_ok());
    }

    #[test]
    fn test_zero_timeout() {
        let mut settings = Settings::default();
        settings.http.request_timeout_secs = 0;

        assert!(matches!(
            validate(&settings),
            Err(ValidationError::InvalidTimeout { field, value: 0 }) if field == "request_timeout_secs"
        ));
    }

    #[test]
    fn test_proxy_scheme() {
        let mut settings = Settings::default();
        settings.http.proxy = Some("ftp://proxy:21".to_string());
        assert!(matches!(
            validate(&settings),
            Err(ValidationError::InvalidProxyScheme { .. })
        ));

        settings.http.proxy = Some("socks5://127.0.0.1:1080".to_string());
        assert!(validate(&settings).is_ok());
    }

    #[test]
    fn test_empty_curl_binary() {
        let mut settings = Settings::default();
        settings.curl.binary = String::new();

        assert!(matches!(validate(&settings), Err(ValidationError::EmptyCurlBinary)));
    }

    #[test]
    fn test_empty_failed_output() {
        let mut settings = Settings::default();
        settings.output.failed_output = PathBuf::new();

        assert!(matches!(
            validate(&settings),
            Err(ValidationError::EmptyPath { field }) if field == "output.failed_output"
        ));
    }
}
