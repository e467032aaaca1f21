//! Connection capability for Connpool
//!
//! The pool only needs a handful of operations from the things it hands out:
//! open a session, reset it between owners, close it, and report whether it
//! is still alive. Everything else about a connection is the caller's business.

mod tcp;

pub use tcp::TcpConnection;

use crate::error::ConnectionError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A pooled, expensive-to-create session
///
/// Methods take `&self` so that one pooled `Arc<C>` can be shared between the
/// pool's bookkeeping and the owner currently holding it. Implementations use
/// interior mutability for their session state.
pub trait Connection: Send + Sync + 'static {
    /// Open a new physical session
    fn open(params: &ConnectionParams) -> Result<Self, ConnectionError>
    where
        Self: Sized;

    /// Return the session to a clean, reusable state before a new owner gets it
    fn reset(&self) -> Result<(), ConnectionError>;

    /// Release the underlying OS/network resources; must be idempotent
    fn close(&self);

    /// Whether the session is closed or otherwise unusable
    fn is_finished(&self) -> bool;
}

/// Scalar value accepted in a `[pool.connection]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    fn into_string(self) -> String {
        match self {
            ParamValue::Str(s) => s,
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::Bool(b) => b.to_string(),
        }
    }
}

/// Opaque connection-target parameters (host, credentials, database name, ...)
///
/// Forwarded verbatim to [`Connection::open`]; the pool never looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConnectionParams(BTreeMap<String, String>);

impl<'de> Deserialize<'de> for ConnectionParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = BTreeMap::<String, ParamValue>::deserialize(deserializer)?;
        Ok(ConnectionParams(
            map.into_iter().map(|(k, v)| (k, v.into_string())).collect(),
        ))
    }
}

impl ConnectionParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Get a raw parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Get a parameter that must be present
    pub fn require(&self, key: &str) -> Result<&str, ConnectionError> {
        self.get(key)
            .ok_or_else(|| ConnectionError::InvalidParams(format!("missing '{}'", key)))
    }

    /// Parse an optional parameter into `T`
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConnectionError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                ConnectionError::InvalidParams(format!("'{}' has invalid value '{}'", key, raw))
            }),
        }
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameters are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all parameters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_builder_and_get() {
        let params = ConnectionParams::new()
            .with("host", "localhost")
            .with("port", 5432);
        assert_eq!(params.get("host"), Some("localhost"));
        assert_eq!(params.get("port"), Some("5432"));
        assert_eq!(params.get("user"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_params_require_missing() {
        let params = ConnectionParams::new();
        let err = params.require("host").unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidParams(_)));
        assert!(format!("{}", err).contains("host"));
    }

    #[test]
    fn test_params_parse() {
        let params = ConnectionParams::new().with("port", "5432").with("bad", "x");
        assert_eq!(params.parse::<u16>("port").unwrap(), Some(5432));
        assert_eq!(params.parse::<u16>("missing").unwrap(), None);
        assert!(params.parse::<u16>("bad").is_err());
    }

    #[test]
    fn test_params_deserialize_scalars() {
        let params: ConnectionParams = toml::from_str(
            r#"
host = "db.internal"
port = 5432
sslmode = false
"#,
        )
        .unwrap();
        assert_eq!(params.get("host"), Some("db.internal"));
        assert_eq!(params.get("port"), Some("5432"));
        assert_eq!(params.get("sslmode"), Some("false"));
    }

    #[test]
    fn test_params_iter_is_ordered() {
        let params = ConnectionParams::new().with("user", "u").with("dbname", "d");
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["dbname", "user"]);
    }
}
