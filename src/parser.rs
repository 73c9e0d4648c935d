//! Parsers that move configuration between raw bytes and typed slots.
//!
//! A [`Parser`] is generic over the target type so a unit can hold it as
//! `Arc<dyn Parser<T>>` without any runtime type inspection. The built-in
//! format parsers are zero-sized and work for any serde type:
//!
//! - [`Json`] (feature `json`, enabled by default)
//! - [`Yaml`] (feature `yaml`)
//! - [`Toml`] (feature `toml`)
//! - [`Xml`] (feature `xml`)

use crate::error::Result;

#[cfg(any(feature = "json", feature = "yaml", feature = "toml", feature = "xml"))]
use crate::error::ConfigError;
#[cfg(any(feature = "json", feature = "yaml", feature = "toml", feature = "xml"))]
use serde::{Serialize, de::DeserializeOwned};

/// Encodes a typed value to bytes and decodes bytes into a typed target.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "json")]
/// # {
/// use unitconf::parser::{Json, Parser};
/// use std::collections::HashMap;
///
/// let mut target: HashMap<String, i64> = HashMap::new();
/// Json.decode(&mut target, br#"{"x": 1}"#).unwrap();
/// assert_eq!(target["x"], 1);
/// # }
/// ```
pub trait Parser<T>: Send + Sync {
    /// Encode `value` into bytes.
    fn encode(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode `buf` into `target`.
    ///
    /// On error the target may hold whatever the parser managed to write.
    fn decode(&self, target: &mut T, buf: &[u8]) -> Result<()>;
}

impl<T, P: Parser<T> + ?Sized> Parser<T> for std::sync::Arc<P> {
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        (**self).encode(value)
    }

    fn decode(&self, target: &mut T, buf: &[u8]) -> Result<()> {
        (**self).decode(target, buf)
    }
}

/// JSON parser backed by `serde_json`.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

#[cfg(feature = "json")]
impl<T> Parser<T> for Json
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| ConfigError::Encode(format!("json: {}", e)))
    }

    fn decode(&self, target: &mut T, buf: &[u8]) -> Result<()> {
        *target =
            serde_json::from_slice(buf).map_err(|e| ConfigError::Parse(format!("json: {}", e)))?;
        Ok(())
    }
}

/// YAML parser backed by `serde_yaml`.
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Yaml;

#[cfg(feature = "yaml")]
impl<T> Parser<T> for Yaml
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| ConfigError::Encode(format!("yaml: {}", e)))
    }

    fn decode(&self, target: &mut T, buf: &[u8]) -> Result<()> {
        *target =
            serde_yaml::from_slice(buf).map_err(|e| ConfigError::Parse(format!("yaml: {}", e)))?;
        Ok(())
    }
}

/// TOML parser backed by the `toml` crate.
#[cfg(feature = "toml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Toml;

#[cfg(feature = "toml")]
impl<T> Parser<T> for Toml
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        toml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| ConfigError::Encode(format!("toml: {}", e)))
    }

    fn decode(&self, target: &mut T, buf: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(buf)
            .map_err(|e| ConfigError::Parse(format!("toml: invalid utf-8: {}", e)))?;
        *target = toml::from_str(text).map_err(|e| ConfigError::Parse(format!("toml: {}", e)))?;
        Ok(())
    }
}

/// XML parser backed by `quick-xml`.
///
/// Encoding names the root element after the value's type; decoding accepts
/// any root element name.
#[cfg(feature = "xml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Xml;

#[cfg(feature = "xml")]
impl<T> Parser<T> for Xml
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        quick_xml::se::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| ConfigError::Encode(format!("xml: {}", e)))
    }

    fn decode(&self, target: &mut T, buf: &[u8]) -> Result<()> {
        *target =
            quick_xml::de::from_reader(buf).map_err(|e| ConfigError::Parse(format!("xml: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct ServerConfig {
        port: u16,
        host: String,
    }

    #[allow(dead_code)]
    fn sample() -> ServerConfig {
        ServerConfig {
            port: 8080,
            host: "localhost".to_string(),
        }
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_decode() {
        let mut target = ServerConfig::default();
        Json.decode(&mut target, br#"{"port": 8080, "host": "localhost"}"#)
            .unwrap();
        assert_eq!(target, sample());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_decode_invalid() {
        let mut target = sample();
        let err = Json.decode(&mut target, b"{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert_eq!(target, sample());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_as_trait_object() {
        let parser: std::sync::Arc<dyn Parser<ServerConfig>> = std::sync::Arc::new(Json);
        let buf = parser.encode(&sample()).unwrap();
        let mut target = ServerConfig::default();
        parser.decode(&mut target, &buf).unwrap();
        assert_eq!(target, sample());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_yaml_decode() {
        let mut target = ServerConfig::default();
        Yaml.decode(&mut target, b"port: 8080\nhost: localhost\n")
            .unwrap();
        assert_eq!(target, sample());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_decode() {
        let mut target = ServerConfig::default();
        Toml.decode(&mut target, b"port = 8080\nhost = \"localhost\"\n")
            .unwrap();
        assert_eq!(target, sample());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_rejects_invalid_utf8() {
        let mut target = ServerConfig::default();
        assert!(Toml.decode(&mut target, &[0xff, 0xfe]).is_err());
    }

    #[cfg(feature = "xml")]
    #[test]
    fn test_xml_decode() {
        let mut target = ServerConfig::default();
        Xml.decode(
            &mut target,
            b"<ServerConfig><port>8080</port><host>localhost</host></ServerConfig>",
        )
        .unwrap();
        assert_eq!(target, sample());
    }

    #[cfg(feature = "xml")]
    #[test]
    fn test_xml_decode_invalid() {
        let mut target = sample();
        let err = Xml.decode(&mut target, b"<ServerConfig><port>").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert_eq!(target, sample());
    }
}
