//! The built-in library surface (SPEC_FULL §4.G): a flat, read-only
//! name-to-callable table installed into every fresh [`crate::engine::Engine`].
//!
//! Grounded on the teacher's `packages::*` modules - one function family
//! per module, registered into a single table by the engine at startup
//! (`rhai::packages::mod.rs`'s `StandardPackage` registration pattern).

use crate::error::EvalError;
use crate::value::{BuiltinFn, Callable, Number, Value};
use indexmap::IndexMap;
use std::rc::Rc;

fn expect_number(value: &Value, context: &str) -> Result<Number, EvalError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(EvalError::TypeMismatch {
            op: context.to_string(),
            lhs: other.type_name().to_string(),
            rhs: "رقم".to_string(),
        }),
    }
}

fn builtin(name: &'static str, f: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static) -> (&'static str, Callable) {
    let f: BuiltinFn = Rc::new(f);
    (name, Callable::Builtin(Rc::from(name), f))
}

/// One entry per name in SPEC_FULL §4.G's "core, fully-implemented
/// builtins" list. Hosted facades (web/db/http/json/datetime) are
/// registered separately by [`host_facades`].
#[must_use]
pub fn core_library() -> Vec<(&'static str, Callable)> {
    vec![
        builtin("الطول", |args| {
            let value = args.first().ok_or_else(|| arity_error("الطول"))?;
            let len = match value {
                Value::Text(s) => s.chars().count(),
                Value::List(items) => items.borrow().len(),
                Value::Object(map) => map.borrow().len(),
                other => {
                    return Err(EvalError::NotIndexable(other.type_name().to_string()));
                }
            };
            Ok(Value::int(len as i64))
        }),
        builtin("الى_نص", |args| {
            let value = args.first().ok_or_else(|| arity_error("الى_نص"))?;
            Ok(Value::text(value.display()))
        }),
        builtin("الى_رقم", |args| {
            let value = args.first().ok_or_else(|| arity_error("الى_رقم"))?;
            match value {
                Value::Number(n) => Ok(Value::Number(*n)),
                Value::Text(s) => {
                    let trimmed = s.trim();
                    if let Ok(i) = trimmed.parse::<i64>() {
                        Ok(Value::int(i))
                    } else if let Ok(f) = trimmed.parse::<f64>() {
                        Ok(Value::float(f))
                    } else {
                        Err(EvalError::TypeMismatch {
                            op: "الى_رقم".to_string(),
                            lhs: "نص".to_string(),
                            rhs: "رقم".to_string(),
                        })
                    }
                }
                other => Err(EvalError::TypeMismatch {
                    op: "الى_رقم".to_string(),
                    lhs: other.type_name().to_string(),
                    rhs: "رقم".to_string(),
                }),
            }
        }),
        builtin("النوع", |args| {
            let value = args.first().ok_or_else(|| arity_error("النوع"))?;
            Ok(Value::text(value.type_name()))
        }),
        builtin("مدى", |args| {
            let n = expect_number(args.first().ok_or_else(|| arity_error("مدى"))?, "مدى")?;
            let n = match n {
                Number::Int(n) => n,
                Number::Float(f) => f as i64,
            };
            let items = (0..n.max(0)).map(Value::int).collect();
            Ok(Value::list(items))
        }),
        builtin("مطلق", |args| {
            let n = expect_number(args.first().ok_or_else(|| arity_error("مطلق"))?, "مطلق")?;
            Ok(match n {
                Number::Int(n) => Value::int(n.abs()),
                Number::Float(f) => Value::float(f.abs()),
            })
        }),
        builtin("تقريب", |args| {
            let n = expect_number(args.first().ok_or_else(|| arity_error("تقريب"))?, "تقريب")?;
            Ok(Value::int(n.as_f64().round() as i64))
        }),
        builtin("الأكبر", |args| reduce_numbers(args, "الأكبر", f64::max, i64::max)),
        builtin("الأصغر", |args| reduce_numbers(args, "الأصغر", f64::min, i64::min)),
        builtin("المجموع", |args| {
            let list = expect_list(args.first().ok_or_else(|| arity_error("المجموع"))?, "المجموع")?;
            let items = list.borrow();
            let mut acc = Number::Int(0);
            for item in items.iter() {
                let n = expect_number(item, "المجموع")?;
                acc = acc.apply(n, |a, b| a.checked_add(b), |a, b| a + b)?;
            }
            Ok(Value::Number(acc))
        }),
        builtin("رتب", |args| {
            let list = expect_list(args.first().ok_or_else(|| arity_error("رتب"))?, "رتب")?;
            let mut items = list.borrow().clone();
            items.sort_by(|a, b| {
                let (a, b) = (expect_number(a, "رتب"), expect_number(b, "رتب"));
                match (a, b) {
                    (Ok(a), Ok(b)) => a.as_f64().partial_cmp(&b.as_f64()).unwrap_or(std::cmp::Ordering::Equal),
                    _ => std::cmp::Ordering::Equal,
                }
            });
            Ok(Value::list(items))
        }),
        builtin("اعكس", |args| {
            let list = expect_list(args.first().ok_or_else(|| arity_error("اعكس"))?, "اعكس")?;
            let mut items = list.borrow().clone();
            items.reverse();
            Ok(Value::list(items))
        }),
        builtin("اقرأ", |_args| {
            let mut line = String::new();
            match std::io::stdin().read_line(&mut line) {
                Ok(0) => Ok(Value::Null),
                Ok(_) => Ok(Value::text(line.trim_end_matches(['\n', '\r']))),
                Err(_) => Ok(Value::Null),
            }
        }),
    ]
}

fn arity_error(name: &str) -> EvalError {
    EvalError::TypeMismatch { op: name.to_string(), lhs: "عدم".to_string(), rhs: "قيمة".to_string() }
}

fn expect_list(value: &Value, context: &str) -> Result<crate::value::List, EvalError> {
    match value {
        Value::List(items) => Ok(items.clone()),
        other => Err(EvalError::TypeMismatch {
            op: context.to_string(),
            lhs: other.type_name().to_string(),
            rhs: "قائمة".to_string(),
        }),
    }
}

fn reduce_numbers(
    args: &[Value],
    name: &str,
    float_op: impl Fn(f64, f64) -> f64,
    int_op: impl Fn(i64, i64) -> i64,
) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(arity_error(name));
    }
    let mut acc = expect_number(&args[0], name)?;
    for arg in &args[1..] {
        let n = expect_number(arg, name)?;
        acc = acc.apply(n, |a, b| Some(int_op(a, b)), float_op)?;
    }
    Ok(Value::Number(acc))
}

/// Hosted façade constructors named in spec.md §4.G. Each returns an opaque
/// `Value::Object` tagged `__host__`; property access on the result is
/// intercepted by the evaluator and reported as `EvalError::HostUnavailable`
/// rather than performing real I/O - these are named external collaborators
/// (spec.md §1), not reimplemented network/database clients.
#[must_use]
pub fn host_facades() -> Vec<(&'static str, Callable)> {
    const NAMES: &[&str] = &[
        "خادم_ويب",      // web server handle
        "قاعدة_بيانات_اتصال", // database connection handle
        "ملف",           // file I/O
        "طلب_http",      // HTTP client
        "تجزئة",         // hashing
        "json_رمز",      // JSON codec
        "الوقت_الحالي",  // date/time
    ];
    NAMES
        .iter()
        .map(|&name| {
            builtin(name, move |_args| {
                let mut entries = IndexMap::new();
                entries.insert("__host__".into(), Value::text(name));
                Ok(Value::object(entries))
            })
        })
        .collect()
}

/// `true` if an Object is a host-facade marker, used by the evaluator's
/// Property-access rule to produce `HostUnavailable` instead of `Null`.
#[must_use]
pub fn host_tag(map: &IndexMap<crate::value::Text, Value>) -> Option<String> {
    match map.get("__host__") {
        Some(Value::Text(name)) => Some(name.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(table: &[(&'static str, Callable)], name: &str, args: &[Value]) -> Value {
        let (_, callable) = table.iter().find(|(n, _)| *n == name).unwrap();
        match callable {
            Callable::Builtin(_, f) => f(args).unwrap(),
            Callable::User(_) => unreachable!(),
        }
    }

    #[test]
    fn length_of_list_and_text() {
        let lib = core_library();
        assert!(matches!(call(&lib, "الطول", &[Value::text("abc")]), Value::Number(Number::Int(3))));
        assert!(matches!(
            call(&lib, "الطول", &[Value::list(vec![Value::int(1), Value::int(2)])]),
            Value::Number(Number::Int(2))
        ));
    }

    #[test]
    fn sum_promotes_on_float() {
        let lib = core_library();
        let list = Value::list(vec![Value::int(1), Value::float(2.5)]);
        match call(&lib, "المجموع", &[list]) {
            Value::Number(Number::Float(f)) => assert!((f - 3.5).abs() < f64::EPSILON),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn range_builds_list_of_ints() {
        let lib = core_library();
        let Value::List(items) = call(&lib, "مدى", &[Value::int(3)]) else { panic!() };
        assert_eq!(items.borrow().len(), 3);
    }
}
