use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing env var {0}")]
    Missing(&'static str),
    #[error("invalid env var {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub s3_bucket: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub s3_force_path_style: bool,
    pub s3_create_bucket: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            s3_endpoint: None,
            s3_region: "us-east-1".to_string(),
            s3_bucket: None,
            s3_access_key: None,
            s3_secret_key: None,
            s3_force_path_style: true,
            s3_create_bucket: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let s3_endpoint = env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty());
        let s3_region = env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        if s3_region.trim().is_empty() {
            return Err(ConfigError::Invalid("S3_REGION", "empty".to_string()));
        }
        let s3_bucket = env::var("S3_BUCKET").ok().filter(|v| !v.is_empty());

        let s3_access_key = env::var("S3_ACCESS_KEY_ID").ok();
        let s3_secret_key = env::var("S3_SECRET_ACCESS_KEY").ok();
        match (&s3_access_key, &s3_secret_key) {
            (Some(_), None) => return Err(ConfigError::Missing("S3_SECRET_ACCESS_KEY")),
            (None, Some(_)) => return Err(ConfigError::Missing("S3_ACCESS_KEY_ID")),
            _ => {}
        }

        let s3_force_path_style = env_bool("S3_FORCE_PATH_STYLE", true)?;
        let s3_create_bucket = env_bool("S3_CREATE_BUCKET", false)?;

        Ok(Self {
            s3_endpoint,
            s3_region,
            s3_bucket,
            s3_access_key,
            s3_secret_key,
            s3_force_path_style,
            s3_create_bucket,
        })
    }

    pub fn bucket(&self) -> Result<&str, ConfigError> {
        self.s3_bucket.as_deref().ok_or(ConfigError::Missing("S3_BUCKET"))
    }

    pub fn bucket_to_create<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        if !self.s3_create_bucket {
            return None;
        }
        requested.or(self.s3_bucket.as_deref())
    }
}

fn env_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(v) => parse_bool(&v).ok_or_else(|| ConfigError::Invalid(key, v)),
        Err(_) => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
