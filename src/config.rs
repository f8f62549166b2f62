use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, Result};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub session_secret: String,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_upload_preset: String,
    pub cloudinary_folder: String,
    pub secure_cookies: bool,
    pub assets_dir: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            port: try_load("PORT", "3000")?,
            mongodb_uri: try_load("MONGODB_URI", "mongodb://localhost:27017")?,
            mongodb_database: try_load("MONGODB_DATABASE", "hope_foundation")?,
            session_secret: env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
            cloudinary_cloud_name: env::var("CLOUDINARY_CLOUD_NAME").ok(),
            cloudinary_upload_preset: try_load("CLOUDINARY_UPLOAD_PRESET", "ml_default")?,
            cloudinary_folder: try_load("CLOUDINARY_FOLDER", "donation_proofs")?,
            secure_cookies: env::var("APP_ENV").is_ok_and(|v| v == "production"),
            assets_dir: try_load("ASSETS_DIR", "assets")?,
        })
    }

    /// Settings for tests and local tooling: no upload provider, insecure cookies.
    pub fn for_tests(session_secret: &str) -> Self {
        Self {
            port: 0,
            mongodb_uri: String::new(),
            mongodb_database: String::new(),
            session_secret: session_secret.to_string(),
            cloudinary_cloud_name: None,
            cloudinary_upload_preset: "ml_default".to_string(),
            cloudinary_folder: "donation_proofs".to_string(),
            secure_cookies: false,
            assets_dir: "assets".to_string(),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid {key} value: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let port: u16 = try_load("HOPE_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn unparsable_values_are_rejected() {
        let err = try_load::<u16>("HOPE_TEST_UNSET_BAD", "not-a-port").unwrap_err();
        assert!(err.to_string().starts_with("Invalid HOPE_TEST_UNSET_BAD value"));
    }
}
