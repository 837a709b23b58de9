//! Post-parse transformation hooks, the drop-in analogues of a strict
//! decoder's `parse_int` / `parse_float` / `object_hook` family.
//!
//! Hooks run in a single bottom-up pass after the parse completes; the
//! parser never calls back into user code mid-parse.

use crate::value::{Map, Value};

/// Optional value transformations applied bottom-up after parsing.
///
/// `object_pairs_hook` receives each object's ordered key/value list and
/// takes precedence over `object_hook` when both are set. Non-finite floats
/// reach `parse_constant` as `"Infinity"`, `"-Infinity"` or `"NaN"`.
#[derive(Default)]
pub struct Hooks<'h> {
    pub parse_int: Option<&'h dyn Fn(i64) -> Value>,
    pub parse_float: Option<&'h dyn Fn(f64) -> Value>,
    pub parse_constant: Option<&'h dyn Fn(&str) -> Value>,
    pub object_hook: Option<&'h dyn Fn(Map) -> Value>,
    pub object_pairs_hook: Option<&'h dyn Fn(Vec<(String, Value)>) -> Value>,
}

impl<'h> Hooks<'h> {
    pub fn is_empty(&self) -> bool {
        self.parse_int.is_none()
            && self.parse_float.is_none()
            && self.parse_constant.is_none()
            && self.object_hook.is_none()
            && self.object_pairs_hook.is_none()
    }

    /// Fold the hooks over the tree, children before parents. A hook may
    /// replace any node with an arbitrary value.
    pub fn apply(&self, value: Value) -> Value {
        if self.is_empty() {
            return value;
        }
        self.apply_inner(value)
    }

    fn apply_inner(&self, value: Value) -> Value {
        match value {
            Value::Integer(n) => match self.parse_int {
                Some(hook) => hook(n),
                None => Value::Integer(n),
            },
            Value::Float(x) => {
                if !x.is_finite() {
                    if let Some(hook) = self.parse_constant {
                        let name = if x.is_nan() {
                            "NaN"
                        } else if x > 0.0 {
                            "Infinity"
                        } else {
                            "-Infinity"
                        };
                        return hook(name);
                    }
                }
                match self.parse_float {
                    Some(hook) => hook(x),
                    None => Value::Float(x),
                }
            }
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.apply_inner(v)).collect())
            }
            Value::Object(map) => {
                let pairs: Vec<(String, Value)> = map
                    .into_pairs()
                    .into_iter()
                    .map(|(k, v)| (k, self.apply_inner(v)))
                    .collect();
                if let Some(hook) = self.object_pairs_hook {
                    return hook(pairs);
                }
                let rebuilt: Map = pairs.into_iter().collect();
                match self.object_hook {
                    Some(hook) => hook(rebuilt),
                    None => Value::Object(rebuilt),
                }
            }
            other => other,
        }
    }
}
