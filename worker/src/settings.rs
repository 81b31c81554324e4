//! Connection settings for the activity store.
//!
//! Either a database URL is given directly, or credentials are looked up by database
//! identifier in a key-value settings bucket at `database_settings/<id>.json`.

use anyhow::{anyhow, Context, Result};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{ObjectStore, ObjectStoreExt};
use serde::{Deserialize, Serialize};

use crate::config::SettingsStoreConfig;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub user: String,
    pub password: String,
    pub port: u16,
}

impl DatabaseSettings {
    pub fn pg_config(&self, database_name: Option<&str>) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password);
        if let Some(name) = database_name {
            config.dbname(name);
        }
        config
    }
}

pub fn settings_path(database_id: &str) -> Path {
    Path::from(format!("database_settings/{}.json", database_id))
}

pub fn settings_store(config: &SettingsStoreConfig) -> Result<AmazonS3> {
    AmazonS3Builder::new()
        .with_region(&config.region)
        .with_endpoint(&config.endpoint)
        .with_bucket_name(&config.bucket)
        .with_access_key_id(&config.access_key)
        .with_secret_access_key(&config.secret_key)
        .with_allow_http(true)
        // Path-style URLs for S3-compatible stores such as MinIO
        .with_virtual_hosted_style_request(false)
        .build()
        .context("Failed to build settings store client")
}

pub async fn lookup<S: ObjectStore>(store: &S, database_id: &str) -> Result<DatabaseSettings> {
    match store.get(&settings_path(database_id)).await {
        Ok(result) => {
            let bytes = result.bytes().await?;
            let settings = serde_json::from_slice(&bytes)
                .with_context(|| format!("Invalid settings for database {}", database_id))?;
            Ok(settings)
        }
        Err(object_store::Error::NotFound { .. }) => {
            Err(anyhow!("No settings found for database {}", database_id))
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolves the store connection from a URL, or from the settings of `database_id`.
pub async fn database_config(
    database_url: Option<&str>,
    database_id: Option<&str>,
    database_name: Option<&str>,
) -> Result<tokio_postgres::Config> {
    if let Some(url) = database_url {
        return url.parse().context("Invalid database URL");
    }
    let id = database_id.ok_or_else(|| anyhow!("Either a database URL or a database id is required"))?;

    let store = settings_store(&SettingsStoreConfig::from_env().context(
        "Missing settings store config. Required env vars: WEATHER_SETTINGS_BUCKET, \
         WEATHER_SETTINGS_ENDPOINT, WEATHER_SETTINGS_REGION, WEATHER_SETTINGS_ACCESS_KEY, \
         WEATHER_SETTINGS_SECRET_KEY",
    )?)?;
    let settings = lookup(&store, id).await?;
    log::info!("Using database settings {} ({}:{})", id, settings.host, settings.port);
    Ok(settings.pg_config(database_name))
}
