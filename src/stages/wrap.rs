// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::literal::value_to_text;
use crate::config::params::ParamTable;
use crate::engine::Link;
use crate::errors::{EngineResult, StructuralConfigError};
use crate::packet::{Edge, Unit};
use crate::traits::Stage;
use serde_json::Value;

/// Wraps the payload with `data_prefix` and `data_suffix`.
#[derive(Debug, Default)]
pub struct Wrap {
    prefix: Vec<u8>,
    suffix: Vec<u8>,
}

impl Wrap {
    pub fn with_prefix_and_suffix(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.as_bytes().to_vec(),
            suffix: suffix.as_bytes().to_vec(),
        }
    }
}

/// A null binding wraps with nothing.
fn affix(params: &ParamTable, key: &str) -> Result<Vec<u8>, StructuralConfigError> {
    Ok(match params.value(key)? {
        Value::Null => Vec::new(),
        value => value_to_text(value).into_bytes(),
    })
}

impl Stage for Wrap {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        let data = unit.data();
        let mut wrapped = Vec::with_capacity(self.prefix.len() + data.len() + self.suffix.len());
        wrapped.extend_from_slice(&self.prefix);
        wrapped.extend_from_slice(&data);
        wrapped.extend_from_slice(&self.suffix);
        unit.set_data(wrapped);
        link.forward(unit, Edge::Main)
    }

    fn configure(&mut self, params: &ParamTable) -> Result<(), StructuralConfigError> {
        self.prefix = affix(params, "data_prefix")?;
        self.suffix = affix(params, "data_suffix")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_reads_both_affixes() {
        let mut wrap = Wrap::default();
        wrap.configure(
            &ParamTable::new("wrap", "wrap")
                .with("data_prefix", "<<")
                .with("data_suffix", Value::Null),
        )
        .unwrap();
        assert_eq!(wrap.prefix, b"<<".to_vec());
        assert!(wrap.suffix.is_empty());
    }

    #[test]
    fn test_numbers_wrap_as_literal_text() {
        let mut wrap = Wrap::with_prefix_and_suffix("", "");
        wrap.configure(
            &ParamTable::new("wrap", "wrap")
                .with("data_prefix", 7)
                .with("data_suffix", " "),
        )
        .unwrap();
        assert_eq!(wrap.prefix, b"7".to_vec());
        assert_eq!(wrap.suffix, b" ".to_vec());
    }
}
