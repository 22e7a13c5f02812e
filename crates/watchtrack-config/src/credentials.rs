use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const TMDB_API_KEY: &str = "tmdb_api_key";
const STORE_SERVICE_KEY: &str = "store_service_key";
const AVAILABILITY_API_KEY: &str = "availability_api_key";
const CRON_SECRET: &str = "cron_secret";

/// Credential key and the environment variable that overrides it
const ENV_OVERRIDES: &[(&str, &str)] = &[
    (TMDB_API_KEY, "TMDB_API_KEY"),
    (STORE_SERVICE_KEY, "SUPABASE_SERVICE_KEY"),
    (AVAILABILITY_API_KEY, "AVAILABILITY_API_KEY"),
    (CRON_SECRET, "CRON_SECRET"),
];

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Secrets kept apart from `config.toml` so the config can be shared
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Environment values win over the file. Empty variables are ignored.
    pub fn apply_env_overrides(&mut self) {
        for (key, var) in ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    self.set(key.to_string(), value.trim().to_string());
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.credentials
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn tmdb_api_key(&self) -> Option<&str> {
        self.get(TMDB_API_KEY)
    }

    pub fn set_tmdb_api_key(&mut self, key: String) {
        self.set(TMDB_API_KEY.to_string(), key);
    }

    pub fn store_service_key(&self) -> Option<&str> {
        self.get(STORE_SERVICE_KEY)
    }

    pub fn set_store_service_key(&mut self, key: String) {
        self.set(STORE_SERVICE_KEY.to_string(), key);
    }

    pub fn availability_api_key(&self) -> Option<&str> {
        self.get(AVAILABILITY_API_KEY)
    }

    pub fn set_availability_api_key(&mut self, key: String) {
        self.set(AVAILABILITY_API_KEY.to_string(), key);
    }

    /// Shared secret the scheduler presents as a bearer token
    pub fn cron_secret(&self) -> Option<&str> {
        self.get(CRON_SECRET)
    }

    pub fn set_cron_secret(&mut self, secret: String) {
        self.set(CRON_SECRET.to_string(), secret);
    }

    /// Stored key names, for `config show` without leaking values
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.credentials.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credential_store_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        store.set_tmdb_api_key("tmdb-key".to_string());
        store.set_cron_secret("s3cret".to_string());
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        assert_eq!(loaded_store.tmdb_api_key(), Some("tmdb-key"));
        assert_eq!(loaded_store.cron_secret(), Some("s3cret"));
        assert_eq!(loaded_store.store_service_key(), None);
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        store.set_availability_api_key(String::new());
        assert_eq!(store.availability_api_key(), None);
    }

    #[test]
    fn test_credential_store_remove() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        store.set("key1".to_string(), "value1".to_string());
        store.set("key2".to_string(), "value2".to_string());

        assert_eq!(store.get("key1"), Some("value1"));
        store.remove("key1");
        assert_eq!(store.get("key1"), None);
        assert_eq!(store.keys(), vec!["key2".to_string()]);
    }
}
