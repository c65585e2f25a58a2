//! Server configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first when present, real
//! environment variables take precedence over it.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Root of the local object store; `temp/` and `permanent/` live below it.
    pub storage_root: PathBuf,
    /// Uploads older than this are treated as purged.
    pub temp_ttl: Duration,
    /// Base URL used when building signed URLs handed to clients.
    pub public_base_url: String,
    pub signing_secret: String,
    pub signed_url_ttl: Duration,
    /// Deadline applied to every request scoped operation.
    pub request_timeout: Duration,
    pub docx_cmd: String,
    pub docx_args: Vec<String>,
    pub soffice_cmd: String,
    pub soffice_args: Vec<String>,
    pub scratch_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("JF_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&var, "JF_PORT", 8080u16)?;
        let public_base_url = var("JF_PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();
        let signing_secret =
            var("JF_SIGNING_SECRET").ok_or(ConfigError::MissingEnvVar("JF_SIGNING_SECRET"))?;

        Ok(Self {
            database_path: PathBuf::from(
                var("JF_DATABASE_PATH").unwrap_or_else(|| "jabfung.sqlite".to_string()),
            ),
            storage_root: PathBuf::from(
                var("JF_STORAGE_ROOT").unwrap_or_else(|| "storage".to_string()),
            ),
            temp_ttl: Duration::from_secs(parse_or(&var, "JF_TEMP_TTL_SECS", 86_400u64)?),
            public_base_url,
            signing_secret,
            signed_url_ttl: Duration::from_secs(parse_or(&var, "JF_SIGNED_URL_TTL_SECS", 900u64)?),
            request_timeout: Duration::from_secs(parse_or(&var, "JF_REQUEST_TIMEOUT_SECS", 15u64)?),
            docx_cmd: var("JF_DOCX_CMD").unwrap_or_else(|| "docx-render".to_string()),
            docx_args: split_args(var("JF_DOCX_ARGS")),
            soffice_cmd: var("JF_SOFFICE_CMD").unwrap_or_else(|| "soffice".to_string()),
            soffice_args: split_args(var("JF_SOFFICE_ARGS")),
            scratch_dir: var("JF_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_upload_bytes: parse_or(&var, "JF_MAX_UPLOAD_BYTES", 20 * 1024 * 1024usize)?,
            host,
            port,
        })
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

fn split_args(value: Option<String>) -> Vec<String> {
    value
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("JF_SIGNING_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.public_base_url, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.docx_cmd, "docx-render");
        assert!(config.docx_args.is_empty());
    }

    #[test]
    fn secret_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("JF_SIGNING_SECRET")));
    }

    #[test]
    fn invalid_numbers_are_rejected_and_args_split() {
        let err = Config::from_lookup(lookup(&[
            ("JF_SIGNING_SECRET", "x"),
            ("JF_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "JF_PORT", .. }));

        let config = Config::from_lookup(lookup(&[
            ("JF_SIGNING_SECRET", "x"),
            ("JF_SOFFICE_ARGS", "--norestore  --nologo"),
            ("JF_PUBLIC_BASE_URL", "https://jf.example.go.id/"),
        ]))
        .unwrap();
        assert_eq!(config.soffice_args, vec!["--norestore", "--nologo"]);
        assert_eq!(config.public_base_url, "https://jf.example.go.id");
    }
}
