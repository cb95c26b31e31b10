//! The run-time value model (SPEC_FULL §3).

use crate::ast::SharedFunctionDef;
use crate::error::EvalError;
use indexmap::IndexMap;
use smartstring::{LazyCompact, SmartString};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Either an integer or a floating-point scalar. The distinction survives
/// arithmetic: integer+integer stays integer, any float operand promotes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Float(n) => n,
        }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        match self {
            Self::Int(n) => n == 0,
            Self::Float(n) => n == 0.0,
        }
    }

    /// Apply a binary arithmetic rule, promoting to float if either operand
    /// is a float (SPEC_FULL §3's Number rule).
    pub fn apply(
        self,
        rhs: Self,
        int_op: impl Fn(i64, i64) -> Option<i64>,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, EvalError> {
        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => {
                int_op(a, b).map(Self::Int).ok_or(EvalError::DivisionByZero)
            }
            (a, b) => Ok(Self::Float(float_op(a.as_f64(), b.as_f64()))),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
        }
    }
}

/// A host-provided callable, opaque to the evaluator beyond its arity and
/// the fact that it can be invoked (SPEC_FULL §4.G).
pub type BuiltinFn = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

#[derive(Clone)]
pub enum Callable {
    User(SharedFunctionDef),
    Builtin(Rc<str>, BuiltinFn),
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(def) => write!(f, "Callable::User({})", def.name),
            Self::Builtin(name, _) => write!(f, "Callable::Builtin({name})"),
        }
    }
}

pub type Text = SmartString<LazyCompact>;
pub type List = Rc<RefCell<Vec<Value>>>;
pub type Object = Rc<RefCell<IndexMap<Text, Value>>>;

/// The tagged run-time value (SPEC_FULL §3). Lists and Objects share their
/// backing storage through `Rc<RefCell<_>>`, so aliasing through one
/// binding is observable through another, as spec.md §3 requires.
#[derive(Debug, Clone)]
pub enum Value {
    Number(Number),
    Text(Text),
    Boolean(bool),
    Null,
    List(List),
    Object(Object),
    Function(Callable),
}

impl Value {
    #[must_use]
    pub fn int(n: i64) -> Self {
        Self::Number(Number::Int(n))
    }
    #[must_use]
    pub fn float(n: f64) -> Self {
        Self::Number(Number::Float(n))
    }
    #[must_use]
    pub fn text(s: impl Into<Text>) -> Self {
        Self::Text(s.into())
    }
    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Rc::new(RefCell::new(items)))
    }
    #[must_use]
    pub fn object(entries: IndexMap<Text, Value>) -> Self {
        Self::Object(Rc::new(RefCell::new(entries)))
    }

    /// Truthiness per spec.md §3: null and boolean-false are falsy,
    /// everything else - including zero, empty text, empty list/object -
    /// is truthy. Short-circuit operators rely on exactly this rule.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Null | Self::Boolean(false))
    }

    /// The type name used by `type-of` and in type-mismatch diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(Number::Int(_)) => "رقم_صحيح",
            Self::Number(Number::Float(_)) => "رقم_عشري",
            Self::Text(_) => "نص",
            Self::Boolean(_) => "منطقي",
            Self::Null => "عدم",
            Self::List(_) => "قائمة",
            Self::Object(_) => "كائن",
            Self::Function(_) => "دالة",
        }
    }

    /// Render the value the way `print`/`print-line` format it
    /// (SPEC_FULL §6's output-formatting contract).
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.to_string(),
            Self::Boolean(true) => "صحيح".to_string(),
            Self::Boolean(false) => "خطأ".to_string(),
            Self::Null => "عدم".to_string(),
            Self::List(items) => {
                let items = items.borrow();
                let rendered: Vec<String> = items.iter().map(Value::display_nested).collect();
                format!("[{}]", rendered.join(", "))
            }
            Self::Object(map) => {
                let map = map.borrow();
                let rendered: Vec<String> =
                    map.iter().map(|(k, v)| format!("{k}: {}", v.display_nested())).collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Self::Function(Callable::User(def)) => format!("<دالة {}>", def.name),
            Self::Function(Callable::Builtin(name, _)) => format!("<دالة داخلية {name}>"),
        }
    }

    /// Text values are quoted when nested inside a List/Object rendering,
    /// so `["a", 1]` doesn't print as `[a, 1]`.
    fn display_nested(&self) -> String {
        match self {
            Self::Text(s) => format!("{s:?}"),
            other => other.display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_is_python_leaning() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::int(0).is_truthy());
        assert!(Value::text("").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
    }

    #[test]
    fn display_formats_match_spec() {
        assert_eq!(Value::Boolean(true).display(), "صحيح");
        assert_eq!(Value::Boolean(false).display(), "خطأ");
        assert_eq!(Value::Null.display(), "عدم");
        assert_eq!(Value::int(3).display(), "3");
        assert_eq!(Value::float(3.5).display(), "3.5");
    }

    #[test]
    fn number_promotion() {
        let sum = Number::Int(2).apply(Number::Int(3), |a, b| Some(a + b), |a, b| a + b).unwrap();
        assert_eq!(sum, Number::Int(5));
        let sum =
            Number::Int(2).apply(Number::Float(3.0), |a, b| Some(a + b), |a, b| a + b).unwrap();
        assert_eq!(sum, Number::Float(5.0));
    }
}
