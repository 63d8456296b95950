// src/config.rs
//! Process configuration, read once at boot and passed into `AppState`
//! explicitly. No hidden globals: handlers receive the config they use.

pub const ENV_BACKEND_URL: &str = "PORTAL_BACKEND_URL";
pub const ENV_SITE_URL: &str = "PORTAL_SITE_URL";
pub const ENV_LANG: &str = "PORTAL_LANG";

/// Production fallbacks when nothing is configured.
pub const DEFAULT_BACKEND_URL: &str = "https://api.warcrypto.app";
pub const DEFAULT_SITE_URL: &str = "https://warcrypto.app";
pub const DEFAULT_LANG: &str = "so";

#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Upstream news/AI backend origin, no trailing slash.
    pub backend_base_url: String,
    /// Public origin of this portal, no trailing slash.
    pub site_base_url: String,
    /// Target language code sent to the backend.
    pub lang: String,
}

impl PortalConfig {
    pub fn from_env() -> Self {
        Self {
            backend_base_url: env_or(ENV_BACKEND_URL, DEFAULT_BACKEND_URL),
            site_base_url: env_or(ENV_SITE_URL, DEFAULT_SITE_URL),
            lang: env_or(ENV_LANG, DEFAULT_LANG),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => trim_trailing_slash(v.trim()),
        _ => default.to_string(),
    }
}

fn trim_trailing_slash(s: &str) -> String {
    s.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_overrides_and_trailing_slash_trim() {
        std::env::set_var(ENV_BACKEND_URL, "https://backend.example.com/");
        std::env::set_var(ENV_SITE_URL, "  https://site.example.com  ");
        std::env::remove_var(ENV_LANG);

        let cfg = PortalConfig::from_env();
        assert_eq!(cfg.backend_base_url, "https://backend.example.com");
        assert_eq!(cfg.site_base_url, "https://site.example.com");
        assert_eq!(cfg.lang, "so");

        std::env::remove_var(ENV_BACKEND_URL);
        std::env::remove_var(ENV_SITE_URL);
    }

    #[serial_test::serial]
    #[test]
    fn defaults_when_unset_or_blank() {
        std::env::set_var(ENV_BACKEND_URL, "   ");
        std::env::remove_var(ENV_SITE_URL);

        let cfg = PortalConfig::from_env();
        assert_eq!(cfg.backend_base_url, DEFAULT_BACKEND_URL);
        assert_eq!(cfg.site_base_url, DEFAULT_SITE_URL);

        std::env::remove_var(ENV_BACKEND_URL);
    }
}
