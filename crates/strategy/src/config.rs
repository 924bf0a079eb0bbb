use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::{Error, Result};

/// One selector entry of the configuration document.
///
/// Example `configs.json`:
/// ```json
/// {
///   "selectors": [
///     { "class": "RsiOversoldSelector", "alias": "RSI dip", "params": { "period": 14, "oversold": 25 } },
///     { "class": "MacdCrossSelector", "activate": false }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorConfig {
    /// Registered implementation identifier.
    #[serde(default, rename = "class", alias = "identifier")]
    pub identifier: Option<String>,
    /// Display name used in logs and reports. Defaults to the identifier.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, Value>,
    #[serde(default = "default_activate")]
    pub activate: bool,
}

fn default_activate() -> bool {
    true
}

impl SelectorConfig {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            alias: None,
            params: HashMap::new(),
            activate: true,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.activate = false;
        self
    }

    /// Alias if set, otherwise the identifier.
    pub fn display_name(&self) -> &str {
        self.alias
            .as_deref()
            .or(self.identifier.as_deref())
            .unwrap_or("<unnamed>")
    }
}

/// Load selector entries from a JSON (or `.toml`) document.
///
/// Accepts a single object, an array of objects, or an object with a
/// `selectors` array. A missing file or an empty entry list is a config error.
pub fn load_selector_configs(path: &Path) -> Result<Vec<SelectorConfig>> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "selector config {} does not exist",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;

    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
    let raw: Value = if is_toml {
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("failed to parse {}: {e}", path.display()))
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("failed to parse {}: {e}", path.display()))
        })?
    };

    parse_selector_configs(raw)
}

pub fn parse_selector_configs(raw: Value) -> Result<Vec<SelectorConfig>> {
    let entries = match raw {
        Value::Array(items) => items,
        Value::Object(mut map) if map.contains_key("selectors") => {
            match map.remove("selectors") {
                Some(Value::Array(items)) => items,
                _ => return Err(Error::Config("'selectors' must be an array".into())),
            }
        }
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(Error::Config(format!(
                "selector config must be an object or array, got {other}"
            )))
        }
    };

    if entries.is_empty() {
        return Err(Error::Config("no selectors defined".into()));
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            serde_json::from_value(entry)
                .map_err(|e| Error::Config(format!("selector entry #{i} is malformed: {e}")))
        })
        .collect()
}
