//! Runtime values and their coercion rules.
//!
//! Conversions follow the loose typing template authors expect from browser
//! scripting: `+` concatenates when either side is a string, `==` coerces
//! between numbers and strings, and `null`/`undefined` print as nothing when
//! appended to output.
//!
//! Strings are measured and indexed in `char`s: `length`, `s[i]`, `for … in`
//! keys and the string methods all agree, so an emoji counts as one.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::ExecError;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Rc<Vec<Value>>),
    Object(Rc<BTreeMap<String, Value>>),
}

impl Value {
    pub fn empty_object() -> Self {
        Value::Object(Rc::new(BTreeMap::new()))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// The `typeof` result.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Arrays and objects collapse to their string form; everything else is
    /// already primitive.
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) | Value::Object(_) => Value::String(self.to_display()),
            other => other.clone(),
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(_) | Value::Object(_) => self.to_primitive().to_number(),
        }
    }

    /// String conversion as used by concatenation and `toString()`.
    pub fn to_display(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => join(items, ","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    /// String appended to template output; `null` and `undefined` vanish.
    pub fn to_output(&self) -> String {
        if self.is_nullish() {
            String::new()
        } else {
            self.to_display()
        }
    }

    /// `===`: no coercion, arrays and objects compare by identity.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => a.strict_eq(b),
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
                *n == parse_number(s)
            }
            (Value::Bool(b), other) | (other, Value::Bool(b)) => {
                Value::Number(f64::from(u8::from(*b))).loose_eq(other)
            }
            (obj @ (Value::Array(_) | Value::Object(_)), prim)
            | (prim, obj @ (Value::Array(_) | Value::Object(_))) => {
                obj.to_primitive().loose_eq(prim)
            }
            _ => false,
        }
    }

    /// Ordering for `<`, `<=`, `>` and `>=`. Two strings compare
    /// lexicographically; anything else numerically. `None` when either side
    /// is `NaN`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self.to_primitive(), other.to_primitive()) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(&b)),
            (a, b) => a.to_number().partial_cmp(&b.to_number()),
        }
    }

    /// `+`: concatenation when either primitive operand is a string.
    pub fn add(&self, other: &Value) -> Value {
        let (a, b) = (self.to_primitive(), other.to_primitive());
        if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
            let mut s = a.to_display();
            s.push_str(&b.to_display());
            Value::String(s)
        } else {
            Value::Number(a.to_number() + b.to_number())
        }
    }

    /// `obj.name`. Missing properties are `undefined`; reading anything off
    /// `null` or `undefined` is an error.
    pub fn get_property(&self, name: &str) -> Result<Value, ExecError> {
        let value = match self {
            Value::Undefined | Value::Null => {
                return Err(ExecError::NullAccess {
                    base: if matches!(self, Value::Null) {
                        "null"
                    } else {
                        "undefined"
                    },
                    property: name.to_string(),
                })
            }
            Value::String(s) => match name {
                "length" => Value::Number(s.chars().count() as f64),
                _ => array_index(name)
                    .and_then(|i| s.chars().nth(i))
                    .map_or(Value::Undefined, |c| Value::String(c.to_string())),
            },
            Value::Array(items) => match name {
                "length" => Value::Number(items.len() as f64),
                _ => array_index(name)
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default(),
            },
            Value::Object(map) => map.get(name).cloned().unwrap_or_default(),
            Value::Bool(_) | Value::Number(_) => Value::Undefined,
        };
        Ok(value)
    }

    /// `obj[key]`.
    pub fn get_index(&self, key: &Value) -> Result<Value, ExecError> {
        self.get_property(&key.to_display())
    }

    /// Whether `name` resolves on this value without falling back to
    /// `undefined`.
    pub fn has_property(&self, name: &str) -> bool {
        match self {
            Value::Object(map) => map.contains_key(name),
            Value::Array(items) => {
                name == "length" || array_index(name).is_some_and(|i| i < items.len())
            }
            Value::String(s) => {
                name == "length" || array_index(name).is_some_and(|i| i < s.chars().count())
            }
            _ => false,
        }
    }

    /// Keys visited by `for (k in value)`.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Value::Object(map) => map.keys().cloned().collect(),
            Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            Value::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    /// Built-in methods: `value.name(args…)`.
    pub fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, ExecError> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
        let result = match (self, name) {
            (Value::Undefined | Value::Null, _) => return self.get_property(name),
            (_, "toString") => Value::String(self.to_display()),

            (Value::String(s), "toUpperCase") => Value::String(s.to_uppercase()),
            (Value::String(s), "toLowerCase") => Value::String(s.to_lowercase()),
            (Value::String(s), "trim") => Value::String(s.trim().to_string()),
            (Value::String(s), "charAt") => {
                let i = to_integer(&arg(0));
                let c = if i < 0.0 { None } else { s.chars().nth(i as usize) };
                Value::String(c.map(String::from).unwrap_or_default())
            }
            (Value::String(s), "indexOf") => {
                let needle = arg(0).to_display();
                let from = clamp_index(&arg(1), 0, s.chars().count());
                let offset = byte_offset(s, from);
                Value::Number(s[offset..].find(&needle).map_or(-1.0, |b| {
                    (from + s[offset..offset + b].chars().count()) as f64
                }))
            }
            (Value::String(s), "slice") => {
                let chars: Vec<char> = s.chars().collect();
                let (start, end) = slice_bounds(args, chars.len());
                Value::String(chars[start..end].iter().collect())
            }
            (Value::String(s), "split") => {
                let parts: Vec<Value> = match arg(0) {
                    Value::Undefined => vec![Value::String(s.clone())],
                    sep => {
                        let sep = sep.to_display();
                        if sep.is_empty() {
                            s.chars().map(|c| Value::String(c.to_string())).collect()
                        } else {
                            s.split(sep.as_str())
                                .map(|p| Value::String(p.to_string()))
                                .collect()
                        }
                    }
                };
                Value::Array(Rc::new(parts))
            }

            (Value::Array(items), "join") => {
                let sep = match arg(0) {
                    Value::Undefined => ",".to_string(),
                    sep => sep.to_display(),
                };
                Value::String(join(items, &sep))
            }
            (Value::Array(items), "indexOf") => {
                let needle = arg(0);
                let from = clamp_index(&arg(1), 0, items.len());
                Value::Number(
                    items[from..]
                        .iter()
                        .position(|v| v.strict_eq(&needle))
                        .map_or(-1.0, |i| (from + i) as f64),
                )
            }
            (Value::Array(items), "slice") => {
                let (start, end) = slice_bounds(args, items.len());
                Value::Array(Rc::new(items[start..end].to_vec()))
            }

            (Value::Number(n), "toFixed") => {
                let digits = to_integer(&arg(0));
                if !(0.0..=100.0).contains(&digits) {
                    return Err(ExecError::Range(
                        "toFixed() digits argument must be between 0 and 100".to_string(),
                    ));
                }
                if !n.is_finite() || n.abs() >= 1e21 {
                    Value::String(format_number(*n))
                } else {
                    Value::String(format!("{:.*}", digits as usize, n))
                }
            }

            _ => {
                return Err(ExecError::NotAFunction {
                    callee: format!("{}.{name}", self.type_of()),
                })
            }
        };
        Ok(result)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(Rc::new(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(map) => Value::Object(Rc::new(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }
}

/// Shortest round-trip form of `n`: integers have no fraction, very large and
/// very small magnitudes use exponent notation with an explicit sign.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return n.to_string();
    }
    let formatted = format!("{n:e}");
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => formatted,
    }
}

/// Numeric value of a string: surrounding whitespace is ignored, the empty
/// string is zero, and anything that is not a complete number is `NaN`.
pub fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

fn join(items: &[Value], sep: &str) -> String {
    items
        .iter()
        .map(Value::to_output)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Canonical array index: `"3"` but not `"03"` or `"3.0"`.
fn array_index(name: &str) -> Option<usize> {
    let index: usize = name.parse().ok()?;
    (index.to_string() == name).then_some(index)
}

fn to_integer(value: &Value) -> f64 {
    let n = value.to_number();
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// Resolve a possibly negative position argument against `len`.
fn clamp_index(value: &Value, default: usize, len: usize) -> usize {
    if matches!(value, Value::Undefined) {
        return default.min(len);
    }
    let n = to_integer(value);
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn slice_bounds(args: &[Value], len: usize) -> (usize, usize) {
    let undefined = Value::Undefined;
    let start = clamp_index(args.first().unwrap_or(&undefined), 0, len);
    let end = clamp_index(args.get(1).unwrap_or(&undefined), len, len);
    (start, end.max(start))
}

fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(b, _)| b)
}
