//! Service configuration.
//!
//! Every environment read happens here. The rest of the crate receives an
//! [`AppConfig`] built once at startup.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

pub const WEBSHARE_USERNAME: &str = "WEBSHARE_USERNAME";
pub const WEBSHARE_PASSWORD: &str = "WEBSHARE_PASSWORD";
pub const WEBSHARE_ENDPOINT: &str = "WEBSHARE_ENDPOINT";
pub const WEBSHARE_COUNTRIES: &str = "WEBSHARE_COUNTRIES";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LANGUAGES: [&str; 3] = ["en", "en-US", "en-GB"];

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind address
    pub host: String,
    /// Listen port, usually assigned by the platform through `PORT`
    pub port: u16,
    /// Preferred transcript languages, most preferred first
    pub languages: Vec<String>,
    /// Timeout for each outbound request
    pub request_timeout: Duration,
    /// Emit JSON logs instead of human-readable ones
    pub json_logs: bool,
    pub proxy: Option<ProxyConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            json_logs: false,
            proxy: None,
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse_num = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let languages = lookup("TRANSCRIPT_LANGUAGES")
            .map(|v| split_list(&v))
            .filter(|langs| !langs.is_empty())
            .unwrap_or(defaults.languages);

        Self {
            host: non_empty(lookup("HOST")).unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            languages,
            request_timeout: parse_num("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            json_logs: lookup("LOG_FORMAT")
                .map(|v| v.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            proxy: ProxyConfig::from_lookup(&lookup),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Webshare proxy credentials.
///
/// Either all three credential values are set or there is no proxy at all.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub username: String,
    pub password: String,
    /// `host:port`, or a full proxy URL
    pub endpoint: String,
    /// Lower-cased location codes used to filter proxy exit IPs
    pub countries: Vec<String>,
}

impl ProxyConfig {
    /// Reads the `WEBSHARE_*` keys through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = non_empty(lookup(WEBSHARE_USERNAME))?;
        let password = non_empty(lookup(WEBSHARE_PASSWORD))?;
        let endpoint = non_empty(lookup(WEBSHARE_ENDPOINT))?;

        let countries = lookup(WEBSHARE_COUNTRIES)
            .map(|v| {
                split_list(&v)
                    .into_iter()
                    .map(|c| c.to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            username,
            password,
            endpoint,
            countries,
        })
    }

    /// Proxy URL handed to the HTTP client. Bare `host:port` gets `http://`.
    pub fn proxy_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("http://{}", self.endpoint)
        }
    }

    /// Username with Webshare location suffixes, e.g. `user-US-DE`.
    pub fn proxy_username(&self) -> String {
        let mut name = self.username.clone();
        for country in &self.countries {
            name.push('-');
            name.push_str(&country.to_uppercase());
        }
        name
    }

    pub fn status(&self) -> ProxyStatus {
        ProxyStatus {
            proxy_enabled: true,
            countries: self.countries.clone(),
        }
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("countries", &self.countries)
            .finish()
    }
}

/// Public view of the proxy setup, safe to return to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProxyStatus {
    pub proxy_enabled: bool,
    pub countries: Vec<String>,
}

impl From<Option<&ProxyConfig>> for ProxyStatus {
    fn from(proxy: Option<&ProxyConfig>) -> Self {
        proxy.map(ProxyConfig::status).unwrap_or_default()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const FULL: [(&str, &str); 3] = [
        (WEBSHARE_USERNAME, "test_user"),
        (WEBSHARE_PASSWORD, "test_pass"),
        (WEBSHARE_ENDPOINT, "p.webshare.io:80"),
    ];

    #[test]
    fn test_proxy_requires_all_three_values() {
        let proxy = ProxyConfig::from_lookup(lookup_from(&FULL)).unwrap();
        assert_eq!(proxy.username, "test_user");
        assert_eq!(proxy.password, "test_pass");
        assert_eq!(proxy.endpoint, "p.webshare.io:80");
        assert!(proxy.countries.is_empty());

        for missing in 0..FULL.len() {
            let partial: Vec<_> = FULL
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != missing)
                .map(|(_, kv)| *kv)
                .collect();
            assert!(ProxyConfig::from_lookup(lookup_from(&partial)).is_none());
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let blank = [
            (WEBSHARE_USERNAME, "test_user"),
            (WEBSHARE_PASSWORD, "   "),
            (WEBSHARE_ENDPOINT, "p.webshare.io:80"),
        ];
        assert!(ProxyConfig::from_lookup(lookup_from(&blank)).is_none());
        assert!(ProxyConfig::from_lookup(lookup_from(&[])).is_none());
    }

    #[test]
    fn test_countries_are_normalised() {
        let mut pairs = FULL.to_vec();
        pairs.push((WEBSHARE_COUNTRIES, " US, de ,,"));
        let proxy = ProxyConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(proxy.countries, vec!["us", "de"]);
        assert_eq!(proxy.proxy_username(), "test_user-US-DE");
        assert_eq!(
            proxy.status(),
            ProxyStatus {
                proxy_enabled: true,
                countries: vec!["us".to_string(), "de".to_string()],
            }
        );
    }

    #[test]
    fn test_proxy_url_adds_scheme_only_when_missing() {
        let mut proxy = ProxyConfig::from_lookup(lookup_from(&FULL)).unwrap();
        assert_eq!(proxy.proxy_url(), "http://p.webshare.io:80");

        proxy.endpoint = "socks5://proxy.local:1080".to_string();
        assert_eq!(proxy.proxy_url(), "socks5://proxy.local:1080");
    }

    #[test]
    fn test_debug_hides_password() {
        let proxy = ProxyConfig::from_lookup(lookup_from(&FULL)).unwrap();
        let printed = format!("{proxy:?}");
        assert!(!printed.contains("test_pass"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.languages, vec!["en", "en-US", "en-GB"]);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.json_logs);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_app_config_overrides() {
        let mut pairs = FULL.to_vec();
        pairs.extend([
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("TRANSCRIPT_LANGUAGES", "de, fr"),
            ("REQUEST_TIMEOUT", "5"),
            ("LOG_FORMAT", "JSON"),
        ]);
        let config = AppConfig::from_lookup(lookup_from(&pairs));

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.languages, vec!["de", "fr"]);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.json_logs);
        assert!(config.proxy.is_some());
    }

    #[test]
    fn test_bad_numbers_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "eighty"),
            ("REQUEST_TIMEOUT", "-1"),
            ("TRANSCRIPT_LANGUAGES", " , "),
        ]));
        assert_eq!(config.port, 5000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.languages.len(), 3);
    }
}
