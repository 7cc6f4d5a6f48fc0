use std::time::Duration;

use chatlogs_core::types::SessionId;
use chatlogs_realtime::subscriber::DEFAULT_SUBSCRIPTION_TIMEOUT;

/// Errors from loading [`NotifierConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Notifier configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// REST API base URL serving `admin/csv`.
    pub api_endpoint: String,
    /// AppSync GraphQL URL; the realtime URL is derived from it.
    pub appsync_api_url: String,
    /// AWS region used to sign the realtime handshake.
    pub region: String,
    /// Instructor id token sent as `Authorization`.
    pub id_token: String,
    /// Session to follow.
    pub session_id: SessionId,
    /// How long to wait for a completion push.
    pub subscription_timeout: Duration,
}

impl NotifierConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `API_ENDPOINT`              | --      |
    /// | `APPSYNC_API_URL`           | --      |
    /// | `AWS_REGION`                | --      |
    /// | `ID_TOKEN`                  | --      |
    /// | `SESSION_ID`                | --      |
    /// | `SUBSCRIPTION_TIMEOUT_SECS` | `180`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let session_id =
            SessionId::parse(required("SESSION_ID")?).map_err(|e| ConfigError::Invalid {
                name: "SESSION_ID",
                reason: e.to_string(),
            })?;

        let subscription_timeout = match lookup("SUBSCRIPTION_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "SUBSCRIPTION_TIMEOUT_SECS",
                    reason: format!("'{raw}' is not a whole number of seconds"),
                })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_SUBSCRIPTION_TIMEOUT,
        };

        Ok(Self {
            api_endpoint: required("API_ENDPOINT")?,
            appsync_api_url: required("APPSYNC_API_URL")?,
            region: required("AWS_REGION")?,
            id_token: required("ID_TOKEN")?,
            session_id,
            subscription_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_env() -> HashMap<String, String> {
        vars(&[
            ("API_ENDPOINT", "https://api.example.com/prod/"),
            ("APPSYNC_API_URL", "https://abc.appsync-api.us-east-1.amazonaws.com/graphql"),
            ("AWS_REGION", "us-east-1"),
            ("ID_TOKEN", "token"),
            ("SESSION_ID", "abc"),
        ])
    }

    #[test]
    fn loads_with_default_timeout() {
        let env = complete_env();
        let config = NotifierConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.session_id.as_str(), "abc");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.subscription_timeout, Duration::from_secs(180));
    }

    #[test]
    fn timeout_can_be_overridden() {
        let mut env = complete_env();
        env.insert("SUBSCRIPTION_TIMEOUT_SECS".into(), "30".into());
        let config = NotifierConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.subscription_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_variable_is_named() {
        let mut env = complete_env();
        env.remove("APPSYNC_API_URL");
        let err = NotifierConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("APPSYNC_API_URL")));
    }

    #[test]
    fn empty_session_id_is_missing() {
        let mut env = complete_env();
        env.insert("SESSION_ID".into(), String::new());
        let err = NotifierConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SESSION_ID")));
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let mut env = complete_env();
        env.insert("SUBSCRIPTION_TIMEOUT_SECS".into(), "soon".into());
        let err = NotifierConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SUBSCRIPTION_TIMEOUT_SECS", .. }));
    }
}
