//! Settings and constants.
//!
//! Values come from the environment (a `.env` file is loaded by `main`
//! through `dotenv`) with compile-time defaults below.

use crate::azure::Cloud;
use crate::error::ConfigError;
use std::str::FromStr;

/// Pause between provisioning-state polls.
pub const SLEEP_MSEC: u64 = 2_000;

/// Number of GET polls after a create/update before giving up.
pub const POLL_MAX_ATTEMPTS: u32 = 180;

/// API version for `Microsoft.Network` calls.
pub const DEFAULT_NETWORK_API_VERSION: &str = "2017-03-01";

/// API version for `Microsoft.Resources` calls (resource groups).
pub const DEFAULT_RESOURCES_API_VERSION: &str = "2017-05-10";

/// Scenario file used when `--data` is not given.
pub const DEFAULT_SCENARIO_FILE: &str = "scenarios/pgm_core_data.json";

/// log4rs configuration read at start-up.
pub const LOG_CONFIG_FILE: &str = "log4rs.yml";

pub const ENV_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const ENV_CLOUD: &str = "AZURE_CLOUD";
pub const ENV_VPN_SHARED_KEY: &str = "AZURE_VPN_SHARED_KEY";
pub const ENV_NETWORK_API_VERSION: &str = "AZURE_NETWORK_API_VERSION";
pub const ENV_RESOURCES_API_VERSION: &str = "AZURE_RESOURCES_API_VERSION";

/// Service principal used by the REST transport.
#[derive(Clone)]
pub struct ServicePrincipal {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Runtime settings collected from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Overrides the subscription in the scenario data when set.
    pub subscription_id: Option<String>,
    pub cloud: Cloud,
    pub service_principal: Option<ServicePrincipal>,
    pub vpn_shared_key: Option<String>,
    pub network_api_version: String,
    pub resources_api_version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            subscription_id: None,
            cloud: Cloud::UsGovernment,
            service_principal: None,
            vpn_shared_key: None,
            network_api_version: DEFAULT_NETWORK_API_VERSION.to_string(),
            resources_api_version: DEFAULT_RESOURCES_API_VERSION.to_string(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment. A `cloud` given on the
    /// command line replaces AZURE_CLOUD, which is then not read at all.
    pub fn from_env(cloud: Option<Cloud>) -> Result<Settings, ConfigError> {
        Settings::from_lookup(|name| std::env::var(name).ok(), cloud)
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F, cloud: Option<Cloud>) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let cloud = match (cloud, get(ENV_CLOUD)) {
            (Some(cloud), _) => cloud,
            (None, Some(value)) => {
                Cloud::from_str(&value).map_err(|_| ConfigError::InvalidEnvVar {
                    name: ENV_CLOUD.to_string(),
                    value,
                })?
            }
            (None, None) => Cloud::UsGovernment,
        };

        // All three or nothing; a half-configured principal is a mistake.
        let sp_parts = [
            get(ENV_TENANT_ID),
            get(ENV_CLIENT_ID),
            get(ENV_CLIENT_SECRET),
        ];
        let service_principal = match sp_parts {
            [Some(tenant_id), Some(client_id), Some(client_secret)] => Some(ServicePrincipal {
                tenant_id,
                client_id,
                client_secret,
            }),
            [None, None, None] => None,
            [t, c, _] => {
                let missing = if t.is_none() {
                    ENV_TENANT_ID
                } else if c.is_none() {
                    ENV_CLIENT_ID
                } else {
                    ENV_CLIENT_SECRET
                };
                return Err(ConfigError::MissingEnvVar {
                    name: missing.to_string(),
                });
            }
        };

        Ok(Settings {
            subscription_id: get(ENV_SUBSCRIPTION_ID),
            cloud,
            service_principal,
            vpn_shared_key: get(ENV_VPN_SHARED_KEY),
            network_api_version: get(ENV_NETWORK_API_VERSION)
                .unwrap_or_else(|| DEFAULT_NETWORK_API_VERSION.to_string()),
            resources_api_version: get(ENV_RESOURCES_API_VERSION)
                .unwrap_or_else(|| DEFAULT_RESOURCES_API_VERSION.to_string()),
        })
    }

    /// The service principal, or an error naming the first missing variable.
    pub fn require_service_principal(&self) -> Result<&ServicePrincipal, ConfigError> {
        self.service_principal
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar {
                name: ENV_TENANT_ID.to_string(),
            })
    }
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
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let settings = Settings::from_lookup(lookup_from(&[]), None).expect("defaults");
        assert_eq!(settings.cloud, Cloud::UsGovernment);
        assert!(settings.service_principal.is_none());
        assert_eq!(settings.network_api_version, DEFAULT_NETWORK_API_VERSION);
        assert_eq!(settings.resources_api_version, DEFAULT_RESOURCES_API_VERSION);
    }

    #[test]
    fn test_full_service_principal() {
        let settings = Settings::from_lookup(
            lookup_from(&[
                (ENV_TENANT_ID, "tenant"),
                (ENV_CLIENT_ID, "client"),
                (ENV_CLIENT_SECRET, "secret"),
                (ENV_CLOUD, "public"),
                (ENV_SUBSCRIPTION_ID, "0000-1111"),
            ]),
            None,
        )
        .expect("settings");
        let sp = settings.require_service_principal().expect("principal");
        assert_eq!(sp.client_id, "client");
        assert_eq!(settings.cloud, Cloud::Public);
        assert_eq!(settings.subscription_id.as_deref(), Some("0000-1111"));
        assert!(!format!("{sp:?}").contains("secret\""));
    }

    #[test]
    fn test_partial_service_principal_is_rejected() {
        let err = Settings::from_lookup(
            lookup_from(&[(ENV_TENANT_ID, "tenant"), (ENV_CLIENT_SECRET, "secret")]),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: AZURE_CLIENT_ID"
        );
    }

    #[test]
    fn test_bad_cloud_name() {
        let err = Settings::from_lookup(lookup_from(&[(ENV_CLOUD, "mars")]), None).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for AZURE_CLOUD: mars");
    }

    #[test]
    fn test_cloud_argument_overrides_bad_env() {
        let settings =
            Settings::from_lookup(lookup_from(&[(ENV_CLOUD, "mars")]), Some(Cloud::Public))
                .expect("cloud argument wins");
        assert_eq!(settings.cloud, Cloud::Public);

        let settings =
            Settings::from_lookup(lookup_from(&[(ENV_CLOUD, "public")]), Some(Cloud::China))
                .expect("settings");
        assert_eq!(settings.cloud, Cloud::China);
    }
}
