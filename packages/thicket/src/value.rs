//! Loosely-typed values backing the generic helpers.
//!
//! `assign`, `is_function` and `is_numeric` operate on host scripting
//! values rather than on DOM nodes. [`Value`] models the runtime types
//! those helpers distinguish; [`Object`] is an ordered property map with
//! per-property enumerability and an optional prototype reference.

use std::cell::RefCell;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use thicket_traits::EventCallback;

/// A dynamically typed value
#[derive(Clone, Debug)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// A node id in a host document
    Element(usize),
    Object(ObjectRef),
    Function(EventCallback),
}

/// A shared handle to an [`Object`]
pub type ObjectRef = Rc<RefCell<Object>>;

impl Value {
    /// The runtime type tag, as the host language's `typeof` reports it
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Element(_) => "object",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Element(a), Value::Element(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => EventCallback::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

/// An ordered property map with per-property enumerability and an optional
/// prototype reference
#[derive(Debug, Default)]
pub struct Object {
    properties: Vec<OwnProperty>,
    prototype: Option<ObjectRef>,
}

/// A property held directly by an object
#[derive(Debug, Clone)]
pub struct OwnProperty {
    pub key: String,
    pub value: Value,
    pub enumerable: bool,
}

impl Object {
    pub fn new() -> ObjectRef {
        Rc::new(RefCell::new(Object::default()))
    }

    pub fn with_prototype(prototype: &ObjectRef) -> ObjectRef {
        Rc::new(RefCell::new(Object {
            properties: Vec::new(),
            prototype: Some(prototype.clone()),
        }))
    }

    /// Plain assignment: updates an existing own property in place, keeping
    /// its enumerability, or appends a new enumerable one.
    pub fn set(&mut self, key: &str, value: Value) {
        match self.properties.iter_mut().find(|p| p.key == key) {
            Some(property) => property.value = value,
            None => self.properties.push(OwnProperty {
                key: key.to_string(),
                value,
                enumerable: true,
            }),
        }
    }

    /// Defines a property with an explicit enumerability, overriding any
    /// existing flag.
    pub fn define(&mut self, key: &str, value: Value, enumerable: bool) {
        match self.properties.iter_mut().find(|p| p.key == key) {
            Some(property) => {
                property.value = value;
                property.enumerable = enumerable;
            }
            None => self.properties.push(OwnProperty {
                key: key.to_string(),
                value,
                enumerable,
            }),
        }
    }

    pub fn get_own(&self, key: &str) -> Option<&OwnProperty> {
        self.properties.iter().find(|p| p.key == key)
    }

    /// Property lookup through the prototype chain
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(own) = self.get_own(key) {
            return Some(own.value.clone());
        }

        let mut cursor = self.prototype.clone();
        while let Some(link) = cursor {
            let object = link.borrow();
            if let Some(own) = object.get_own(key) {
                return Some(own.value.clone());
            }
            cursor = object.prototype.clone();
        }
        None
    }

    /// Snapshot of the own enumerable properties, in definition order
    pub fn own_enumerable(&self) -> Vec<(String, Value)> {
        self.properties
            .iter()
            .filter(|p| p.enumerable)
            .map(|p| (p.key.clone(), p.value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// The failure raised when [`assign`] is given an absent target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError {
    message: &'static str,
}

impl TypeError {
    fn new(message: &'static str) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &str {
        self.message
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeError: {}", self.message)
    }
}

impl Error for TypeError {}

/// Copies each source's own enumerable properties into `target`, in order,
/// later sources overriding earlier ones.
///
/// Absent sources are skipped; string sources contribute their characters
/// as indexed properties; other non-object sources contribute nothing. An
/// absent target is a [`TypeError`]. A non-object target has nowhere to
/// put properties and is returned unchanged. Returns the (mutated) target.
pub fn assign(target: &Value, sources: &[Value]) -> Result<Value, TypeError> {
    let object = match target {
        Value::Undefined | Value::Null => {
            return Err(TypeError::new("Cannot convert first argument to object"));
        }
        Value::Object(object) => object,
        other => return Ok(other.clone()),
    };

    for source in sources {
        let snapshot: Vec<(String, Value)> = match source {
            Value::Undefined | Value::Null => continue,
            Value::Object(source_object) => source_object.borrow().own_enumerable(),
            Value::String(s) => s
                .chars()
                .enumerate()
                .map(|(idx, c)| (idx.to_string(), Value::String(c.to_string())))
                .collect(),
            _ => continue,
        };

        let mut target_object = object.borrow_mut();
        for (key, value) in snapshot {
            target_object.set(&key, value);
        }
    }

    Ok(target.clone())
}

/// Whether the value is callable
pub fn is_function(value: &Value) -> bool {
    value.type_of() == "function"
}

/// Whether the value reads as a finite number: its string form must start
/// with a numeric prefix and its full numeric conversion must be finite.
/// `"42"` and `"3.14"` qualify; `""`, `"abc"`, `"3px"`, NaN and the
/// infinities do not.
pub fn is_numeric(value: &Value) -> bool {
    parse_float(&to_string_value(value)).is_some() && to_number(value).is_finite()
}

/// The value's string form, as the host language's string conversion
/// produces it
pub fn to_string_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(*n),
        Value::String(s) => s.clone(),
        Value::Element(_) => "[object Element]".to_string(),
        Value::Object(_) => "[object Object]".to_string(),
        Value::Function(_) => "function".to_string(),
    }
}

fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// The value's numeric form, as the host language's number conversion
/// produces it: absent and uncoercible values become NaN, except `Null`
/// which becomes 0.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => string_to_number(s),
        Value::Element(_) | Value::Object(_) | Value::Function(_) => f64::NAN,
    }
}

/// Full-string numeric conversion: the whole trimmed string must be one
/// number literal. Distinct from the leading-prefix [`parse_float`].
fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if let Some(digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return radix_to_number(digits, 16);
    }
    if let Some(digits) = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
    {
        return radix_to_number(digits, 8);
    }
    if let Some(digits) = trimmed
        .strip_prefix("0b")
        .or_else(|| trimmed.strip_prefix("0B"))
    {
        return radix_to_number(digits, 2);
    }

    // Rust's float grammar accepts spellings ("inf", "nan") that the host
    // language's conversion rejects
    let lower = trimmed.to_ascii_lowercase();
    if lower.contains("inf") || lower.contains("nan") {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn radix_to_number(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    let mut value = 0.0f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(digit) => value = value * radix as f64 + digit as f64,
            None => return f64::NAN,
        }
    }
    value
}

/// Leading-prefix float parse: trims leading whitespace, then reads the
/// longest numeric prefix (sign, decimal digits, fraction, well-formed
/// exponent, or an `Infinity` keyword). `None` when no prefix parses;
/// never `Some(NaN)`.
pub fn parse_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0usize;

    let negative = match bytes.first() {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    if s[i..].starts_with("Infinity") {
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    let mut frac_digits = 0usize;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        frac_digits = j - frac_start;
        if int_digits > 0 || frac_digits > 0 {
            i = j;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    // An exponent only counts if at least one digit follows
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    s[..i].parse::<f64>().ok()
}

/// Leading-prefix integer parse with `0x` hex detection, as used for
/// reading pixel margins: `" 12px"` is 12, `"-4px"` is -4, `"auto"` is
/// `None`.
pub fn parse_int(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0usize;

    let negative = match bytes.first() {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let radix: u32 = if s[i..].starts_with("0x") || s[i..].starts_with("0X") {
        i += 2;
        16
    } else {
        10
    };

    let mut value: Option<f64> = None;
    while i < bytes.len() {
        let Some(digit) = (bytes[i] as char).to_digit(radix) else {
            break;
        };
        value = Some(value.unwrap_or(0.0) * radix as f64 + digit as f64);
        i += 1;
    }

    value.map(|v| if negative { -v } else { v })
}
