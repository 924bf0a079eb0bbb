use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

/// Constructor-time validation failure for a selector's parameters.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParamError {
    #[error("parameter '{key}' must be {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("parameter '{key}' {reason}")]
    Invalid { key: String, reason: String },
}

impl ParamError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ParamError::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Flat string-keyed parameter mapping from a selector config entry.
#[derive(Debug, Clone, Default)]
pub struct Params<'a> {
    values: Option<&'a HashMap<String, Value>>,
}

impl<'a> Params<'a> {
    pub fn new(values: &'a HashMap<String, Value>) -> Self {
        Self {
            values: Some(values),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.values.and_then(|v| v.get(key))
    }

    pub fn f64(&self, key: &str, default: f64) -> Result<f64, ParamError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v.as_f64().ok_or_else(|| wrong_type(key, "a number")),
        }
    }

    pub fn usize(&self, key: &str, default: usize) -> Result<usize, ParamError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| wrong_type(key, "a non-negative integer")),
        }
    }
}

fn wrong_type(key: &str, expected: &'static str) -> ParamError {
    ParamError::WrongType {
        key: key.to_string(),
        expected,
    }
}
