//! Runtime value representation
//!
//! The `Value` type and the key/function types that flow through traps and hooks.

use crate::error::MetaError;
use crate::object::VirtualObject;
use crate::prelude::{Rc, fmt};
use crate::resolver::Activator;

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// Makes it explicit at call sites when a clone is only a reference count
/// increment, e.g. `VirtualObject`, `Store`, `MetaString` and `Function`.
pub trait CheapClone: Clone {
    /// Create a cheap (reference-counted) clone of this value.
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}

/// A runtime value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(MetaString),
    /// Immutable argument list, as handed to the missing-method hook
    List(Rc<[Value]>),
    Object(VirtualObject),
    Function(Function),
    Activator(Activator),
}

impl Value {
    /// Check if this value can be invoked
    pub fn is_callable(&self) -> bool {
        match self {
            Value::Function(_) | Value::Activator(_) => true,
            Value::Object(obj) => obj.is_callable(),
            _ => false,
        }
    }

    /// Get the typeof result for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "object",
            Value::Function(_) | Value::Activator(_) => "function",
            Value::Object(obj) => {
                if obj.is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&VirtualObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_activator(&self) -> Option<&Activator> {
        match self {
            Value::Activator(a) => Some(a),
            _ => None,
        }
    }

    /// Build a list value from call arguments
    pub fn list(items: &[Value]) -> Self {
        Value::List(Rc::from(items))
    }

    /// Strict equality (===); reference types compare by identity
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN !== NaN falls out of f64 comparison
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Activator(a), Value::Activator(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Invoke this value as a function with the given receiver.
    ///
    /// `name` is only used to report a non-callable target.
    pub fn call(&self, this: &Value, args: &[Value], name: &str) -> Result<Value, MetaError> {
        match self {
            Value::Function(f) => f.call(this, args),
            Value::Activator(activator) => activator.invoke(this, args),
            Value::Object(obj) if obj.is_callable() => obj.call(args),
            _ => Err(MetaError::not_callable(name)),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s.as_str()),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(_) => write!(f, "{{...}}"),
            Value::Function(func) => write!(f, "[Function: {}]", func.name()),
            Value::Activator(_) => write!(f, "[Function: activator]"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

// Conversions from Rust types

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(MetaString::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(MetaString::from(s))
    }
}

impl From<MetaString> for Value {
    fn from(s: MetaString) -> Self {
        Value::String(s)
    }
}

impl From<VirtualObject> for Value {
    fn from(obj: VirtualObject) -> Self {
        Value::Object(obj)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<&PropertyKey> for Value {
    fn from(key: &PropertyKey) -> Self {
        match key {
            PropertyKey::String(s) => Value::String(s.cheap_clone()),
            PropertyKey::Index(i) => Value::Number(*i as f64),
        }
    }
}

/// Reference-counted string
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetaString(Rc<str>);

// MetaString wraps Rc<str>, so clone is cheap (just reference count increment)
impl CheapClone for MetaString {}

impl MetaString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<str> for MetaString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for MetaString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MetaString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for MetaString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for MetaString {
    fn from(s: &str) -> Self {
        MetaString(s.into())
    }
}

impl From<String> for MetaString {
    fn from(s: String) -> Self {
        MetaString(s.into())
    }
}

impl fmt::Debug for MetaString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for MetaString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Property key (string or canonical array index)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(MetaString),
    Index(u32),
}

impl PropertyKey {
    /// Check if this key equals a string literal (avoids allocation)
    #[inline]
    pub fn eq_str(&self, s: &str) -> bool {
        match self {
            PropertyKey::String(name) => name.as_str() == s,
            PropertyKey::Index(_) => false,
        }
    }

    /// The string form of a named key
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyKey::String(name) => Some(name.as_str()),
            PropertyKey::Index(_) => None,
        }
    }
}

impl From<&str> for PropertyKey {
    #[inline]
    fn from(s: &str) -> Self {
        // Fast path: check first char is a digit before parsing
        if let Some(first) = s.bytes().next()
            && first.is_ascii_digit()
            && let Ok(idx) = s.parse::<u32>()
            // Canonical form only (no leading zeros except "0")
            && idx.to_string() == s
        {
            return PropertyKey::Index(idx);
        }
        PropertyKey::String(MetaString::from(s))
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::from(s.as_str())
    }
}

impl From<MetaString> for PropertyKey {
    fn from(s: MetaString) -> Self {
        PropertyKey::from(s.as_str())
    }
}

impl From<&PropertyKey> for PropertyKey {
    fn from(key: &PropertyKey) -> Self {
        key.clone()
    }
}

impl From<u32> for PropertyKey {
    fn from(idx: u32) -> Self {
        PropertyKey::Index(idx)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Native function signature: `(this, args) -> result`
pub type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, MetaError>;

/// A callable host function.
///
/// Functions compare by identity, so the same `Function` stored in two places
/// is `===` to itself.
#[derive(Clone)]
pub struct Function(Rc<FunctionData>);

struct FunctionData {
    name: MetaString,
    func: Box<NativeFn>,
}

impl CheapClone for Function {}

impl Function {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, MetaError> + 'static,
    {
        Function(Rc::new(FunctionData {
            name: MetaString::from(name),
            func: Box::new(func),
        }))
    }

    pub fn name(&self) -> &str {
        self.0.name.as_str()
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, MetaError> {
        (self.0.func)(this, args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.0.name)
            .finish()
    }
}
