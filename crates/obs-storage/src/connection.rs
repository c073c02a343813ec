//! OBS connection configuration
//!
//! Credentials shared by the connector and the batch sink (flattened) and
//! nested under `connection` in the batch source.
//!
//! # Example
//!
//! ```yaml
//! authenticationMethod: Access Credentials
//! accessKey: ${OBS_ACCESS_KEY}
//! secretKey: ${secure(obs-secret)}
//! endPoint: obs.cn-north-4.myhuaweicloud.com
//! ```

use obs_connect::{ConfigValue, FailureCollector, SensitiveString, ValidationFailure};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const NAME_ACCESS_KEY: &str = "accessKey";
pub const NAME_SECRET_KEY: &str = "secretKey";
pub const NAME_END_POINT: &str = "endPoint";
pub const NAME_AUTH_METHOD: &str = "authenticationMethod";

/// File system property carrying the access key
pub const OBS_ACCESS_KEY: &str = "fs.obs.access.key";
/// File system property carrying the secret key
pub const OBS_SECRET_KEY: &str = "fs.obs.secret.key";
/// File system property carrying the endpoint
pub const OBS_END_POINT: &str = "fs.obs.endpoint";
/// File system property selecting server-side encryption
pub const OBS_ENCRYPTION_TYPE: &str = "fs.obs.server-side-encryption-type";
/// Server-side encryption with KMS-managed keys
pub const OBS_ENCRYPTION_SSE_KMS: &str = "sse-kms";

/// How the plugins authenticate against OBS
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub enum AuthenticationMethod {
    /// Static access key, secret key and endpoint
    #[default]
    #[serde(rename = "Access Credentials")]
    AccessCredentials,
    /// Credentials resolved from the environment or instance role
    #[serde(rename = "IAM")]
    Iam,
}

impl AuthenticationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessCredentials => "Access Credentials",
            Self::Iam => "IAM",
        }
    }
}

impl fmt::Display for AuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthenticationMethod {
    type Err = String;

    /// Case-insensitive; spaces, underscores and hyphens are ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "accesscredentials" => Ok(Self::AccessCredentials),
            "iam" => Ok(Self::Iam),
            _ => Err(format!(
                "unknown authentication method '{}', expected 'Access Credentials' or 'IAM'",
                s
            )),
        }
    }
}

impl<'de> Deserialize<'de> for AuthenticationMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Credentials and endpoint of an OBS connection
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObsConnectorConfig {
    /// Access Key of the Huawei OBS instance to connect to
    #[serde(default)]
    pub access_key: ConfigValue<SensitiveString>,

    /// Secret Key of the Huawei OBS instance to connect to
    #[serde(default)]
    pub secret_key: ConfigValue<SensitiveString>,

    /// Endpoint used by the OBS client, e.g. `obs.cn-north-4.myhuaweicloud.com`
    #[serde(default)]
    pub end_point: ConfigValue<String>,

    /// Authentication method. Defaults to Access Credentials.
    #[serde(default)]
    pub authentication_method: ConfigValue<AuthenticationMethod>,
}

impl ObsConnectorConfig {
    /// Config with static credentials
    pub fn with_credentials(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        end_point: impl Into<String>,
    ) -> Self {
        Self {
            access_key: ConfigValue::present(SensitiveString::new(access_key)),
            secret_key: ConfigValue::present(SensitiveString::new(secret_key)),
            end_point: ConfigValue::present(end_point.into()),
            authentication_method: ConfigValue::Absent,
        }
    }

    /// The effective method, or `None` while it is still a macro
    pub fn authentication_method(&self) -> Option<AuthenticationMethod> {
        match &self.authentication_method {
            ConfigValue::Absent => Some(AuthenticationMethod::default()),
            ConfigValue::Deferred(_) => None,
            ConfigValue::Present(method) => Some(*method),
        }
    }

    pub fn is_access_credentials(&self) -> bool {
        self.authentication_method() == Some(AuthenticationMethod::AccessCredentials)
    }

    /// Every missing credential, one failure per field.
    ///
    /// Nothing is reported while the method is deferred or when it does not
    /// use static credentials; deferred fields are never reported.
    pub fn credential_failures(&self) -> Vec<ValidationFailure> {
        if !self.is_access_credentials() {
            return Vec::new();
        }

        let missing = [
            (self.secret_key.is_missing(), NAME_SECRET_KEY, "Secret Key"),
            (self.access_key.is_missing(), NAME_ACCESS_KEY, "Access Key"),
            (self.end_point.is_missing(), NAME_END_POINT, "End Point"),
        ];

        missing
            .into_iter()
            .filter(|(is_missing, _, _)| *is_missing)
            .map(|(_, property, label)| {
                ValidationFailure::new(
                    format!(
                        "The {} must be specified if authentication method is Access Credentials.",
                        label
                    ),
                    None,
                )
                .config_property(property)
                .config_property(NAME_AUTH_METHOD)
            })
            .collect()
    }

    /// Record missing credentials in `collector`
    pub fn validate(&self, collector: &mut FailureCollector) {
        collector.extend(self.credential_failures());
    }

    /// `fs.obs.*` credential properties from the present values.
    /// Empty unless the method uses static credentials.
    pub fn credential_properties(&self) -> BTreeMap<String, String> {
        let mut properties = BTreeMap::new();
        if !self.is_access_credentials() {
            return properties;
        }
        if let Some(access_key) = self.access_key.as_present() {
            properties.insert(
                OBS_ACCESS_KEY.to_string(),
                access_key.expose_secret().to_string(),
            );
        }
        if let Some(secret_key) = self.secret_key.as_present() {
            properties.insert(
                OBS_SECRET_KEY.to_string(),
                secret_key.expose_secret().to_string(),
            );
        }
        if let Some(end_point) = self.end_point.as_present() {
            properties.insert(OBS_END_POINT.to_string(), end_point.clone());
        }
        properties
    }

    /// Whether any credential field is still a macro
    pub fn has_deferred_credentials(&self) -> bool {
        self.access_key.is_deferred() || self.secret_key.is_deferred()
    }
}

/// A connection given as JSON text, as the host passes resolved connections
impl FromStr for ObsConnectorConfig {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}
