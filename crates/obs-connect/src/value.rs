//! Deferred configuration values
//!
//! The host lets users put macro placeholders such as `${bucket}` or
//! `${secure(obs-secret)}` in any plugin property. Those values are only
//! resolved at run time, so validation must skip them instead of treating
//! them as empty. [`ConfigValue`] makes that state explicit:
//!
//! ```text
//! missing / null        -> ConfigValue::Absent
//! "${secure(key)}"      -> ConfigValue::Deferred("${secure(key)}")
//! "AKID..." / true / 3  -> ConfigValue::Present(value)
//! ```

use crate::error::ConnectorError;
use crate::types::SensitiveString;
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Pre-compiled regex for macro placeholders
/// Pattern: ${name}, ${secure(key)}, ${logicalStartTime(yyyy-MM-dd)}
static MACRO_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\$\{[^{}]*\}").expect("macro regex pattern is invalid - this is a bug")
});

/// Whether the raw property text contains a macro placeholder
pub fn is_macro(raw: &str) -> bool {
    MACRO_REGEX.is_match(raw)
}

/// Values that can be present but still count as "not provided"
pub trait Blank {
    /// Whether the value is empty
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for SensitiveString {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// A plugin property that may be absent, deferred to a macro, or present
#[derive(Clone, PartialEq, Eq)]
pub enum ConfigValue<T> {
    /// Not configured
    Absent,
    /// Contains a macro that the host resolves later
    Deferred(String),
    /// Configured with a concrete value
    Present(T),
}

impl<T> Default for ConfigValue<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> ConfigValue<T> {
    /// Wrap a concrete value
    pub fn present(value: T) -> Self {
        Self::Present(value)
    }

    /// Defer to a macro expression
    pub fn deferred(expr: impl Into<String>) -> Self {
        Self::Deferred(expr.into())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Borrow the concrete value, if any
    pub fn as_present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Concrete value or a fallback for absent and deferred values
    pub fn present_or<'a>(&'a self, fallback: &'a T) -> &'a T {
        self.as_present().unwrap_or(fallback)
    }

    /// Map the concrete value, keeping absent/deferred as they are
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ConfigValue<U> {
        match self {
            Self::Absent => ConfigValue::Absent,
            Self::Deferred(expr) => ConfigValue::Deferred(expr),
            Self::Present(value) => ConfigValue::Present(f(value)),
        }
    }
}

impl<T: Blank> ConfigValue<T> {
    /// Absent or present-but-empty. Deferred values are never missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Deferred(_) => false,
            Self::Present(value) => value.is_blank(),
        }
    }
}

impl<T> ConfigValue<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    /// Interpret raw property text: macros are deferred, everything else is parsed
    pub fn from_text(raw: &str) -> Result<Self, String> {
        if is_macro(raw) {
            return Ok(Self::Deferred(raw.to_string()));
        }
        raw.parse::<T>()
            .map(Self::Present)
            .map_err(|e| format!("invalid value '{}': {}", raw, e))
    }
}

impl<T> FromStr for ConfigValue<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s).map_err(ConnectorError::Config)
    }
}

impl<T> From<T> for ConfigValue<T> {
    fn from(value: T) -> Self {
        Self::Present(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for ConfigValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "Absent"),
            Self::Deferred(expr) => write!(f, "Deferred({})", expr),
            Self::Present(value) => write!(f, "Present({:?})", value),
        }
    }
}

impl<T: Serialize> Serialize for ConfigValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Deferred(expr) => serializer.serialize_str(expr),
            Self::Present(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T> Deserialize<'de> for ConfigValue<T>
where
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Text goes through FromStr so macros can be spotted before parsing;
        // structured values (booleans, numbers, maps) are taken as they are.
        // Unquoted scalars that `T` rejects are read back as their text, so
        // `accessKey: 12345` still lands in a string field.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Text(String),
            Value(T),
            Bool(bool),
            Int(i64),
            Float(f64),
        }

        let text = match Option::<Raw<T>>::deserialize(deserializer)? {
            None => return Ok(Self::Absent),
            Some(Raw::Value(value)) => return Ok(Self::Present(value)),
            Some(Raw::Text(raw)) => raw,
            Some(Raw::Bool(flag)) => flag.to_string(),
            Some(Raw::Int(number)) => number.to_string(),
            Some(Raw::Float(number)) => number.to_string(),
        };
        Self::from_text(&text).map_err(D::Error::custom)
    }
}

impl<T: JsonSchema> JsonSchema for ConfigValue<T> {
    fn is_referenceable() -> bool {
        false
    }

    fn schema_name() -> String {
        format!("Nullable_{}", T::schema_name())
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        gen.subschema_for::<Option<T>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Props {
        #[serde(default)]
        name: ConfigValue<String>,
        #[serde(default)]
        flag: ConfigValue<bool>,
        #[serde(default)]
        secret: ConfigValue<SensitiveString>,
    }

    #[test]
    fn test_is_macro() {
        assert!(is_macro("${bucket}"));
        assert!(is_macro("obs://${bucket}/data"));
        assert!(is_macro("${secure(obs-secret)}"));
        assert!(!is_macro("obs://bucket/data"));
        assert!(!is_macro("$bucket"));
        assert!(!is_macro("${unclosed"));
    }

    #[test]
    fn test_deserialize_tri_state() {
        let props: Props = serde_yaml::from_str(
            r#"
name: "${name}"
flag: true
"#,
        )
        .unwrap();
        assert_eq!(props.name, ConfigValue::Deferred("${name}".to_string()));
        assert_eq!(props.flag, ConfigValue::Present(true));
        assert!(props.secret.is_absent());
    }

    #[test]
    fn test_deserialize_text_into_typed_value() {
        let props: Props = serde_json::from_str(r#"{"flag": "false", "name": null}"#).unwrap();
        assert_eq!(props.flag, ConfigValue::Present(false));
        assert!(props.name.is_absent());

        let props: Props = serde_json::from_str(r#"{"flag": "${enable}"}"#).unwrap();
        assert!(props.flag.is_deferred());
    }

    #[test]
    fn test_deserialize_unquoted_scalars_as_text() {
        let props: Props = serde_yaml::from_str(
            r#"
name: 2024
secret: 12345
flag: false
"#,
        )
        .unwrap();
        assert_eq!(props.name, ConfigValue::Present("2024".to_string()));
        assert_eq!(props.secret.as_present().unwrap().expose_secret(), "12345");
        assert_eq!(props.flag, ConfigValue::Present(false));

        let props: Props = serde_yaml::from_str("name: true\n").unwrap();
        assert_eq!(props.name, ConfigValue::Present("true".to_string()));

        let result: Result<Props, _> = serde_yaml::from_str("flag: 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rejects_unparseable_text() {
        let result: Result<Props, _> = serde_json::from_str(r#"{"flag": "maybe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_is_missing() {
        assert!(ConfigValue::<String>::Absent.is_missing());
        assert!(ConfigValue::present(String::new()).is_missing());
        assert!(!ConfigValue::<String>::deferred("${x}").is_missing());
        assert!(!ConfigValue::present("value".to_string()).is_missing());
        assert!(ConfigValue::present(SensitiveString::new("")).is_missing());
    }

    #[test]
    fn test_serialize_round_trip_keeps_macro() {
        let value: ConfigValue<String> = "${path}".parse().unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"${path}\"");
        assert_eq!(
            serde_json::to_string(&ConfigValue::<String>::Absent).unwrap(),
            "null"
        );
    }

    #[test]
    fn test_present_or_and_map() {
        let fallback = "UTF-8".to_string();
        let deferred = ConfigValue::<String>::deferred("${encoding}");
        assert_eq!(deferred.present_or(&fallback), "UTF-8");
        assert_eq!(
            ConfigValue::present(3u32).map(|v| v * 2),
            ConfigValue::Present(6)
        );
    }
}
