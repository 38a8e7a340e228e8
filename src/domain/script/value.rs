//! Runtime values and the per-execution environment.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable series. Cloning the handle aliases the same buffer.
pub type SeriesRef = Rc<RefCell<Vec<f64>>>;

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Num(f64),
    Series(SeriesRef),
}

impl Value {
    /// Wrap an owned vector in a fresh handle.
    pub fn series(values: Vec<f64>) -> Self {
        Value::Series(Rc::new(RefCell::new(values)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Num(_) => "f64",
            Value::Series(_) => "series",
        }
    }

    /// Numeric view of a scalar. `None` for series.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Num(v) => Some(*v),
            Value::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&SeriesRef> {
        match self {
            Value::Series(handle) => Some(handle),
            _ => None,
        }
    }

    /// Type name plus length for series, used in shape mismatch messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Series(handle) => format!("series of length {}", handle.borrow().len()),
            other => other.type_name().to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Series(a), Value::Series(b)) => *a.borrow() == *b.borrow(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Num(v) => write!(f, "{v}"),
            Value::Series(handle) => write!(f, "{:?}", handle.borrow()),
        }
    }
}

/// Name to value bindings, iterated in first-binding order.
#[derive(Debug, Default)]
pub struct Environment {
    order: Vec<String>,
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Bind or rebind `name`. Rebinding keeps the original position.
    pub fn set(&mut self, name: &str, value: Value) {
        if self.values.insert(name.to_string(), value).is_none() {
            self.order.push(name.to_string());
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let value = self.values.remove(name)?;
        self.order.retain(|n| n != name);
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order
            .iter()
            .filter_map(|name| self.values.get(name).map(|v| (name.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
