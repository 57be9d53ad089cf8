// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Which successor edge a unit should take when it reaches a fan-out node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    #[default]
    Main,
    Branch,
}

#[derive(Debug, Default, Clone)]
struct UnitBody {
    data: Vec<u8>,
    attrs: BTreeMap<String, Value>,
    fork: Edge,
    origin: Option<String>,
    seq_num: Option<i64>,
}

/// A data unit: an opaque byte payload plus a named-attribute bag.
///
/// Units are not `Clone`. Copying is explicit:
/// * [`Unit::duplicate`] makes an independent deep copy (normal fan-out).
/// * [`Unit::alias`] returns a second handle onto the same unit, so a change
///   made through one handle is visible through the other.
///
/// # Example
/// ```
/// use the_filterworks::packet::Unit;
///
/// let unit = Unit::from_text("hello").with_attr("x", 5);
/// let copy = unit.duplicate();
/// let alias = unit.alias();
///
/// unit.set_attr("x", 6);
/// assert_eq!(copy.attr("x"), Some(5.into()));
/// assert_eq!(alias.attr("x"), Some(6.into()));
/// ```
#[derive(Debug, Default)]
pub struct Unit {
    body: Rc<RefCell<UnitBody>>,
}

impl Unit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let unit = Self::new();
        unit.body.borrow_mut().data = data.into();
        unit
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes().to_vec())
    }

    pub fn with_attr(self, key: &str, value: impl Into<Value>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn data(&self) -> Vec<u8> {
        self.body.borrow().data.clone()
    }

    pub fn set_data(&self, data: impl Into<Vec<u8>>) {
        self.body.borrow_mut().data = data.into();
    }

    /// Payload decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body.borrow().data).into_owned()
    }

    pub fn attr(&self, key: &str) -> Option<Value> {
        self.body.borrow().attrs.get(key).cloned()
    }

    pub fn set_attr(&self, key: &str, value: impl Into<Value>) {
        self.body
            .borrow_mut()
            .attrs
            .insert(key.to_string(), value.into());
    }

    pub fn remove_attr(&self, key: &str) -> Option<Value> {
        self.body.borrow_mut().attrs.remove(key)
    }

    pub fn attrs(&self) -> BTreeMap<String, Value> {
        self.body.borrow().attrs.clone()
    }

    pub fn fork(&self) -> Edge {
        self.body.borrow().fork
    }

    pub fn set_fork(&self, edge: Edge) {
        self.body.borrow_mut().fork = edge;
    }

    /// Returns the routing selector and resets it to [`Edge::Main`].
    pub fn take_fork(&self) -> Edge {
        std::mem::take(&mut self.body.borrow_mut().fork)
    }

    /// Name of the stage that last forwarded this unit.
    pub fn origin(&self) -> Option<String> {
        self.body.borrow().origin.clone()
    }

    pub fn set_origin(&self, origin: &str) {
        self.body.borrow_mut().origin = Some(origin.to_string());
    }

    pub fn seq_num(&self) -> Option<i64> {
        self.body.borrow().seq_num
    }

    pub fn set_seq_num(&self, seq_num: i64) {
        self.body.borrow_mut().seq_num = Some(seq_num);
    }

    pub fn duplicate(&self) -> Unit {
        Unit {
            body: Rc::new(RefCell::new(self.body.borrow().clone())),
        }
    }

    pub fn alias(&self) -> Unit {
        Unit {
            body: Rc::clone(&self.body),
        }
    }

    /// True when both handles refer to the same underlying unit.
    pub fn same_unit(&self, other: &Unit) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_independent() {
        let unit = Unit::from_text("abc").with_attr("k", "v");
        let copy = unit.duplicate();

        copy.set_data("xyz");
        copy.set_attr("k", "changed");

        assert_eq!(unit.text(), "abc");
        assert_eq!(unit.attr("k"), Some(Value::from("v")));
        assert!(!unit.same_unit(&copy));
    }

    #[test]
    fn test_alias_shares_changes() {
        let unit = Unit::from_text("abc");
        let alias = unit.alias();

        alias.set_data("cba");
        alias.set_seq_num(7);

        assert_eq!(unit.text(), "cba");
        assert_eq!(unit.seq_num(), Some(7));
        assert!(unit.same_unit(&alias));
    }

    #[test]
    fn test_take_fork_resets_to_main() {
        let unit = Unit::new();
        unit.set_fork(Edge::Branch);

        assert_eq!(unit.take_fork(), Edge::Branch);
        assert_eq!(unit.fork(), Edge::Main);
    }
}
