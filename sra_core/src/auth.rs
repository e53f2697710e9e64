use serde_json::{Map, Value};
use std::collections::HashMap;

/// Credential key/value pairs handed to a connector.
pub type AuthDetails = HashMap<String, String>;

/// Flatten a JSON object of secrets into [`AuthDetails`]. Strings are taken
/// verbatim, other scalars are stringified and nested values are dropped.
pub fn auth_details_from_json(secrets: Map<String, Value>) -> AuthDetails {
    secrets
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            Value::Number(_) | Value::Bool(_) => Some((k, v.to_string())),
            _ => None,
        })
        .collect()
}
