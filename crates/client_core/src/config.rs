use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use url::Url;

pub const SETTINGS_FILE: &str = "explore.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base URL the endpoint names are appended to, e.g. `http://host/api`.
    pub api_base_url: String,
    pub database_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000/api".into(),
            database_url: "sqlite://./data/explore.db".into(),
            request_timeout_secs: 60,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.api_base_url)
            .with_context(|| format!("invalid api_base_url '{}'", self.api_base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "api_base_url must start with http:// or https://, got '{}'",
                self.api_base_url
            ));
        }
        Ok(())
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, Path::new(SETTINGS_FILE));
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings
}

fn apply_file_overrides(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
        Ok(file_cfg) => {
            if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
                settings.api_base_url = v.to_string();
            }
            if let Some(v) = file_cfg.get("database_url").and_then(toml::Value::as_str) {
                settings.database_url = v.to_string();
            }
            if let Some(v) = file_cfg
                .get("request_timeout_secs")
                .and_then(toml::Value::as_integer)
            {
                settings.request_timeout_secs = u64::try_from(v).unwrap_or_default();
            }
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings file: {err}");
        }
    }
}

fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("EXPLORE_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

/// Turns plain file paths into sqlite URLs the store can open.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plain_file_path_to_sqlite_url() {
        assert_eq!(
            normalize_database_url("./data/test.db"),
            "sqlite://./data/test.db"
        );
        assert_eq!(normalize_database_url("  "), Settings::default().database_url);
        assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    }

    #[test]
    fn prefixed_env_vars_win_over_plain_ones() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("EXPLORE_API_URL", "http://plain:8000"),
            ("APP__API_BASE_URL", "http://prefixed:8000/api"),
            ("DATABASE_URL", "sqlite://plain.db"),
            ("APP__REQUEST_TIMEOUT_SECS", "5"),
        ]);
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.api_base_url, "http://prefixed:8000/api");
        assert_eq!(settings.database_url, "sqlite://plain.db");
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn file_overrides_are_read_from_toml() {
        let dir = std::env::temp_dir().join(format!("explore_settings_{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join(SETTINGS_FILE);
        fs::write(
            &path,
            "api_base_url = \"https://explore.example/api\"\nrequest_timeout_secs = 0\n",
        )
        .expect("write settings");

        let mut settings = Settings::default();
        apply_file_overrides(&mut settings, &path);

        assert_eq!(settings.api_base_url, "https://explore.example/api");
        assert_eq!(settings.request_timeout(), None);
        fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let settings = Settings {
            api_base_url: "ftp://example.com".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
        assert!(Settings::default().validate().is_ok());
    }
}
