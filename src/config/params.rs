// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declared parameters, bound parameter tables and parameter sources.
//!
//! A stage type declares its parameters as `name` (essential) or
//! `name:default` (optional). Declarations from base behaviours are merged
//! once, at registration, into a single flat [`ParamSet`] in which the most
//! specific default wins. At assembly time each stage gets a [`ParamTable`]
//! holding its bound values.

use crate::config::consts::ENV_MARKER;
use crate::config::literal::{convert_literal, is_blank, value_to_text};
use crate::errors::StructuralConfigError;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// One declared parameter. `default == None` makes it essential.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub default: Option<Value>,
}

impl ParamSpec {
    /// Parses `name` or `name:default`; the default is converted as a literal.
    pub fn parse(key: &str) -> Self {
        match key.split_once(':') {
            Some((name, default)) => Self {
                name: name.trim().to_string(),
                default: Some(convert_literal(default.trim())),
            },
            None => Self {
                name: key.trim().to_string(),
                default: None,
            },
        }
    }

    pub fn is_essential(&self) -> bool {
        self.default.is_none()
    }
}

/// An ordered set of declared parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    specs: Vec<ParamSpec>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from `name[:default]` keys. Later keys merge into earlier
    /// ones with the same name.
    ///
    /// # Example
    /// ```
    /// use the_filterworks::config::params::ParamSet;
    ///
    /// let set = ParamSet::parse(&["branch_key", "comparison:equals"]);
    /// assert_eq!(set.names(), vec!["branch_key", "comparison"]);
    /// assert!(set.get("branch_key").unwrap().is_essential());
    /// ```
    pub fn parse<S: AsRef<str>>(keys: &[S]) -> Self {
        let mut set = Self::new();
        for key in keys {
            set.merge_spec(ParamSpec::parse(key.as_ref()));
        }
        set
    }

    /// Merges `other` into `self`: first position is kept, the latest
    /// default wins, and a later essential never removes an earlier default.
    pub fn merge(&mut self, other: &ParamSet) {
        for spec in &other.specs {
            self.merge_spec(spec.clone());
        }
    }

    fn merge_spec(&mut self, spec: ParamSpec) {
        match self.specs.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => {
                if spec.default.is_some() {
                    existing.default = spec.default;
                }
            }
            None => self.specs.push(spec),
        }
    }

    /// Composes sets from least to most specific.
    pub fn latest_defaults(sets: &[&ParamSet]) -> ParamSet {
        let mut merged = ParamSet::new();
        for set in sets {
            merged.merge(set);
        }
        merged
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn essentials(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.iter().filter(|s| s.is_essential())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// A reusable base behaviour that stage types compose. Its keys are merged
/// ahead of the type's own keys.
#[derive(Debug, Clone, Copy)]
pub struct Behavior {
    pub name: &'static str,
    pub keys: &'static [&'static str],
}

impl Behavior {
    pub fn params(&self) -> ParamSet {
        ParamSet::parse(self.keys)
    }
}

/// Where a bound value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSource {
    Literal(Value),
    /// Re-read from the [`Environment`] before every unit.
    Env(String),
}

impl ParamSource {
    /// In a dynamic graph `%UPPER_NAME` strings become environment references.
    pub fn classify(value: Value, dynamic: bool) -> Self {
        if dynamic {
            if let Some(variable) = env_reference(&value) {
                return ParamSource::Env(variable);
            }
        }
        ParamSource::Literal(value)
    }
}

fn env_reference(value: &Value) -> Option<String> {
    let name = value.as_str()?.strip_prefix(ENV_MARKER)?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    valid.then(|| name.to_string())
}

/// Variables that `%NAME` parameters resolve against. Owned by the graph and
/// mutable through a shared reference so drivers can change values between units.
#[derive(Debug, Default)]
pub struct Environment {
    vars: RefCell<BTreeMap<String, String>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the process environment.
    pub fn from_process() -> Self {
        Self {
            vars: RefCell::new(std::env::vars().collect()),
        }
    }

    pub fn set(&self, name: &str, value: impl Into<String>) {
        self.vars.borrow_mut().insert(name.to_string(), value.into());
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.vars.borrow_mut().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.vars.borrow().get(name).cloned()
    }

    /// The variable converted as a literal.
    pub fn resolve(&self, name: &str) -> Option<Value> {
        self.get(name).map(|text| convert_literal(&text))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: RefCell::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

/// The bound parameter values of one stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamTable {
    stage: String,
    type_name: String,
    values: BTreeMap<String, Value>,
}

impl ParamTable {
    pub fn new(stage: &str, type_name: &str) -> Self {
        Self {
            stage: stage.to_string(),
            type_name: type_name.to_string(),
            values: BTreeMap::new(),
        }
    }

    /// Builder used by tests and direct stage construction.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Unconditional write. Returns true when the stored value changed.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        match self.values.insert(key.to_string(), value.clone()) {
            Some(previous) => previous != value,
            None => true,
        }
    }

    /// Binds `key` under the re-binding rule: an identical value is fine, a
    /// blank value never overwrites, anything else different is a conflict.
    ///
    /// # Example
    /// ```
    /// use the_filterworks::config::params::ParamTable;
    /// use serde_json::Value;
    ///
    /// let mut table = ParamTable::new("wrap", "wrap");
    /// table.set_checked("data_prefix", Value::from("<")).unwrap();
    /// table.set_checked("data_prefix", Value::from("<")).unwrap();
    /// table.set_checked("data_prefix", Value::Null).unwrap();
    /// assert!(table.set_checked("data_prefix", Value::from("[")).is_err());
    /// ```
    pub fn set_checked(&mut self, key: &str, value: Value) -> Result<(), StructuralConfigError> {
        match self.values.get(key) {
            None => {
                self.values.insert(key.to_string(), value);
                Ok(())
            }
            Some(existing) if *existing == value || is_blank(&value) => Ok(()),
            Some(existing) if is_blank(existing) => {
                self.values.insert(key.to_string(), value);
                Ok(())
            }
            Some(existing) => Err(StructuralConfigError::ConflictingValue {
                stage: self.stage.clone(),
                parameter: key.to_string(),
                existing: existing.to_string(),
                attempted: value.to_string(),
            }),
        }
    }

    /// Binds only if nothing is bound yet.
    pub fn set_default(&mut self, key: &str, value: Value) {
        self.values.entry(key.to_string()).or_insert(value);
    }

    pub fn value(&self, key: &str) -> Result<&Value, StructuralConfigError> {
        self.values
            .get(key)
            .ok_or_else(|| StructuralConfigError::MissingParameter {
                stage: self.stage.clone(),
                parameter: key.to_string(),
                type_name: self.type_name.clone(),
            })
    }

    /// The value rendered as literal text.
    pub fn text(&self, key: &str) -> Result<String, StructuralConfigError> {
        self.value(key).map(value_to_text)
    }

    pub fn int(&self, key: &str) -> Result<i64, StructuralConfigError> {
        let value = self.value(key)?;
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => convert_literal(s).as_i64(),
            _ => None,
        }
        .ok_or_else(|| self.invalid(key, format!("expected an integer, found {}", value)))
    }

    pub fn float(&self, key: &str) -> Result<f64, StructuralConfigError> {
        let value = self.value(key)?;
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => convert_literal(s).as_f64(),
            _ => None,
        }
        .ok_or_else(|| self.invalid(key, format!("expected a number, found {}", value)))
    }

    pub fn flag(&self, key: &str) -> Result<bool, StructuralConfigError> {
        let value = self.value(key)?;
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => convert_literal(s).as_bool(),
            _ => None,
        }
        .ok_or_else(|| self.invalid(key, format!("expected a boolean, found {}", value)))
    }

    pub fn invalid(&self, key: &str, reason: impl Into<String>) -> StructuralConfigError {
        StructuralConfigError::InvalidValue {
            stage: self.stage.clone(),
            parameter: key.to_string(),
            reason: reason.into(),
        }
    }
}
