use std::env;
use std::fmt;

use crate::errors::ConfigError;

/// Static credentials used to sign requests to the logs service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Connection settings for the remote logs service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub credentials: Option<Credentials>,
}

impl ClientConfig {
    /// Loads configuration from the standard AWS variables.
    ///
    /// `AWS_DEFAULT_REGION` is used when `AWS_REGION` is unset and
    /// `ACWI_ENDPOINT` overrides the region-derived endpoint.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::from_env_with_prefix("AWS_")?;
        if config.region.is_none() {
            config.region = non_empty_var("AWS_DEFAULT_REGION");
        }
        if config.endpoint.is_none() {
            config.endpoint = non_empty_var("ACWI_ENDPOINT");
        }
        Ok(config)
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `AWS_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let region = non_empty_var(&key("REGION"));
        let endpoint = non_empty_var(&key("ENDPOINT"));

        let access_key = key("ACCESS_KEY_ID");
        let secret_key = key("SECRET_ACCESS_KEY");
        let credentials = match (non_empty_var(&access_key), non_empty_var(&secret_key)) {
            (Some(access_key_id), Some(secret_access_key)) => Some(Credentials {
                access_key_id,
                secret_access_key,
                session_token: non_empty_var(&key("SESSION_TOKEN")),
            }),
            (Some(_), None) => {
                return Err(ConfigError::IncompleteCredentials {
                    key: access_key,
                    missing: secret_key,
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteCredentials {
                    key: secret_key,
                    missing: access_key,
                })
            }
            (None, None) => None,
        };

        Ok(Self {
            region,
            endpoint,
            credentials,
        })
    }

    /// Applies explicit overrides on top of the loaded values.
    pub fn with_overrides(mut self, region: Option<String>, endpoint: Option<String>) -> Self {
        if region.is_some() {
            self.region = region;
        }
        if endpoint.is_some() {
            self.endpoint = endpoint;
        }
        self
    }

    /// Returns the endpoint URL requests are sent to.
    pub fn endpoint_url(&self) -> Result<String, ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }
        self.region
            .as_deref()
            .map(|region| format!("https://logs.{}.amazonaws.com/", region))
            .ok_or(ConfigError::NoEndpoint)
    }

    /// Region used for request signing; custom endpoints default to `us-east-1`.
    pub fn signing_region(&self) -> &str {
        self.region.as_deref().unwrap_or("us-east-1")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_prefixed_credentials() {
        env::set_var("CFGTEST_A_REGION", "eu-west-1");
        env::set_var("CFGTEST_A_ACCESS_KEY_ID", "AKIDEXAMPLE");
        env::set_var("CFGTEST_A_SECRET_ACCESS_KEY", "secret");
        let cfg = ClientConfig::from_env_with_prefix("CFGTEST_A_").expect("config should load");
        assert_eq!(cfg.region.as_deref(), Some("eu-west-1"));
        let credentials = cfg.credentials.expect("credentials");
        assert_eq!(credentials.access_key_id, "AKIDEXAMPLE");
        assert!(credentials.session_token.is_none());
        assert_eq!(
            ClientConfig::from_env_with_prefix("CFGTEST_A_")
                .unwrap()
                .endpoint_url()
                .unwrap(),
            "https://logs.eu-west-1.amazonaws.com/"
        );
    }

    #[test]
    fn rejects_half_configured_credentials() {
        env::set_var("CFGTEST_B_ACCESS_KEY_ID", "AKIDEXAMPLE");
        let err = ClientConfig::from_env_with_prefix("CFGTEST_B_").unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteCredentials { .. }));
    }

    #[test]
    fn explicit_endpoint_wins_over_region() {
        let cfg = ClientConfig::default()
            .with_overrides(Some("us-west-2".into()), Some("http://localhost:4566".into()));
        assert_eq!(cfg.endpoint_url().unwrap(), "http://localhost:4566");
        assert_eq!(cfg.signing_region(), "us-west-2");
    }

    #[test]
    fn no_region_and_no_endpoint_is_an_error() {
        let err = ClientConfig::default().endpoint_url().unwrap_err();
        assert!(matches!(err, ConfigError::NoEndpoint));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let credentials = Credentials {
            access_key_id: "AKID".into(),
            secret_access_key: "very-secret".into(),
            session_token: Some("token".into()),
        };
        let printed = format!("{:?}", credentials);
        assert!(!printed.contains("very-secret"));
        assert!(!printed.contains("\"token\""));
    }
}
