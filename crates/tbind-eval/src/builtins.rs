//! Native functions: the globals a test program can reach and the methods
//! of arrays, strings, numbers and functions.
//!
//! Methods are looked up on the receiver's kind and called with the
//! receiver as `this`, so `arr.map` read without a call loses its array
//! just as it would in the host language.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use tbind_common::span::Span;

use crate::env::Env;
use crate::error::{EvalError, Result};
use crate::interp::Interpreter;
use crate::value::{Object, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    ConsoleLog,
    MathFloor,
    MathCeil,
    MathRound,
    MathAbs,
    MathSqrt,
    MathMax,
    MathMin,
    String,
    Number,
    Boolean,
    IsArray,
    ObjectKeys,
    Error,
    // Receiver methods.
    Push,
    Pop,
    Map,
    Filter,
    Reduce,
    ForEach,
    Join,
    IndexOf,
    Includes,
    Slice,
    Concat,
    Sort,
    ToUpperCase,
    ToLowerCase,
    Trim,
    Split,
    ToFixed,
    Call,
}

impl Native {
    pub fn name(self) -> &'static str {
        match self {
            Native::ConsoleLog => "log",
            Native::MathFloor => "floor",
            Native::MathCeil => "ceil",
            Native::MathRound => "round",
            Native::MathAbs => "abs",
            Native::MathSqrt => "sqrt",
            Native::MathMax => "max",
            Native::MathMin => "min",
            Native::String => "String",
            Native::Number => "Number",
            Native::Boolean => "Boolean",
            Native::IsArray => "isArray",
            Native::ObjectKeys => "keys",
            Native::Error => "Error",
            Native::Push => "push",
            Native::Pop => "pop",
            Native::Map => "map",
            Native::Filter => "filter",
            Native::Reduce => "reduce",
            Native::ForEach => "forEach",
            Native::Join => "join",
            Native::IndexOf => "indexOf",
            Native::Includes => "includes",
            Native::Slice => "slice",
            Native::Concat => "concat",
            Native::Sort => "sort",
            Native::ToUpperCase => "toUpperCase",
            Native::ToLowerCase => "toLowerCase",
            Native::Trim => "trim",
            Native::Split => "split",
            Native::ToFixed => "toFixed",
            Native::Call => "call",
        }
    }
}

fn namespace(members: &[(&str, Native)]) -> Value {
    let mut object = Object::new();
    for (name, native) in members {
        object.set(*name, Value::Native(*native));
    }
    Value::object(object)
}

/// Bind the global names in `env`.
pub(crate) fn install(env: &Env) {
    env.declare("undefined", Value::Undefined, false);
    env.declare("NaN", Value::Number(f64::NAN), false);
    env.declare("Infinity", Value::Number(f64::INFINITY), false);
    env.declare("console", namespace(&[("log", Native::ConsoleLog)]), false);
    env.declare(
        "Math",
        namespace(&[
            ("floor", Native::MathFloor),
            ("ceil", Native::MathCeil),
            ("round", Native::MathRound),
            ("abs", Native::MathAbs),
            ("sqrt", Native::MathSqrt),
            ("max", Native::MathMax),
            ("min", Native::MathMin),
        ]),
        false,
    );
    env.declare("Array", namespace(&[("isArray", Native::IsArray)]), false);
    env.declare("Object", namespace(&[("keys", Native::ObjectKeys)]), false);
    for native in [Native::String, Native::Number, Native::Boolean, Native::Error] {
        env.declare(native.name(), Value::Native(native), false);
    }
}

pub(crate) fn array_method(name: &str) -> Option<Native> {
    let native = match name {
        "push" => Native::Push,
        "pop" => Native::Pop,
        "map" => Native::Map,
        "filter" => Native::Filter,
        "reduce" => Native::Reduce,
        "forEach" => Native::ForEach,
        "join" => Native::Join,
        "indexOf" => Native::IndexOf,
        "includes" => Native::Includes,
        "slice" => Native::Slice,
        "concat" => Native::Concat,
        "sort" => Native::Sort,
        _ => return None,
    };
    Some(native)
}

pub(crate) fn string_method(name: &str) -> Option<Native> {
    let native = match name {
        "toUpperCase" => Native::ToUpperCase,
        "toLowerCase" => Native::ToLowerCase,
        "trim" => Native::Trim,
        "split" => Native::Split,
        "indexOf" => Native::IndexOf,
        "includes" => Native::Includes,
        "slice" => Native::Slice,
        "concat" => Native::Concat,
        _ => return None,
    };
    Some(native)
}

/// An object built by `Error(message)`.
pub(crate) fn make_error(message: &Value) -> Value {
    let mut object = Object::new();
    object.set("name", Value::str("Error"));
    let message = match message {
        Value::Undefined => String::new(),
        other => other.to_js_string(),
    };
    object.set("message", Value::str(&message));
    Value::object(object)
}

pub(crate) fn is_error(value: &Value) -> bool {
    match value {
        Value::Object(object) => {
            let object = object.borrow();
            matches!(object.get("name"), Some(Value::Str(name)) if &**name == "Error")
                && object.get("message").is_some()
        }
        _ => false,
    }
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

/// Resolve a relative `slice` bound against `len`.
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if matches!(value, Value::Undefined) {
        return default;
    }
    let n = value.to_number();
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let len_f = len as f64;
    let resolved = if n < 0.0 { (len_f + n).max(0.0) } else { n.min(len_f) };
    resolved as usize
}

fn receiver_error(native: Native, this: &Value, span: Span) -> EvalError {
    EvalError::type_error(
        format!("{} called on {}", native.name(), this.type_of()),
        span,
    )
}

pub(crate) fn call(
    interp: &mut Interpreter<'_>,
    native: Native,
    this: Value,
    args: Vec<Value>,
    span: Span,
) -> Result<Value> {
    let n = arg(&args, 0).to_number();
    let value = match native {
        Native::ConsoleLog => {
            let line: Vec<String> = args.iter().map(Value::display).collect();
            interp.print(line.join(" "));
            Value::Undefined
        }
        Native::MathFloor => Value::Number(n.floor()),
        Native::MathCeil => Value::Number(n.ceil()),
        Native::MathRound => Value::Number((n + 0.5).floor()),
        Native::MathAbs => Value::Number(n.abs()),
        Native::MathSqrt => Value::Number(n.sqrt()),
        Native::MathMax | Native::MathMin => {
            let max = native == Native::MathMax;
            let mut acc = if max { f64::NEG_INFINITY } else { f64::INFINITY };
            for n in args.iter().map(Value::to_number) {
                if n.is_nan() {
                    return Ok(Value::Number(f64::NAN));
                }
                acc = if max { acc.max(n) } else { acc.min(n) };
            }
            Value::Number(acc)
        }
        Native::String => Value::str(&match args.first() {
            Some(v) => v.to_js_string(),
            None => String::new(),
        }),
        Native::Number => Value::Number(args.first().map_or(0.0, Value::to_number)),
        Native::Boolean => Value::Bool(arg(&args, 0).is_truthy()),
        Native::IsArray => Value::Bool(matches!(arg(&args, 0), Value::Array(_))),
        Native::ObjectKeys => match arg(&args, 0) {
            Value::Object(object) => Value::array(
                object
                    .borrow()
                    .entries()
                    .map(|(k, _)| Value::str(k))
                    .collect(),
            ),
            Value::Array(items) => Value::array(
                (0..items.borrow().len())
                    .map(|i| Value::str(&i.to_string()))
                    .collect(),
            ),
            _ => Value::array(Vec::new()),
        },
        Native::Error => make_error(&arg(&args, 0)),
        Native::Call => {
            let this_arg = arg(&args, 0);
            let rest = args.into_iter().skip(1).collect();
            return interp.call_value(&this, this_arg, rest, span);
        }
        Native::ToFixed => match this {
            Value::Number(n) => {
                let digits = arg(&args, 0).to_number();
                let digits = if digits.is_nan() { 0 } else { digits as usize };
                Value::str(&format!("{n:.digits$}"))
            }
            other => return Err(receiver_error(native, &other, span)),
        },
        _ => return method(interp, native, this, args, span),
    };
    Ok(value)
}

fn method(
    interp: &mut Interpreter<'_>,
    native: Native,
    this: Value,
    args: Vec<Value>,
    span: Span,
) -> Result<Value> {
    match &this {
        Value::Array(items) => array_call(interp, native, items, &this, args, span),
        Value::Str(s) => string_call(native, s, args, span),
        other => Err(receiver_error(native, other, span)),
    }
}

fn array_call(
    interp: &mut Interpreter<'_>,
    native: Native,
    items: &Rc<RefCell<Vec<Value>>>,
    this: &Value,
    args: Vec<Value>,
    span: Span,
) -> Result<Value> {
    // Callbacks may mutate the array, so they run over a snapshot.
    let snapshot = items.borrow().clone();
    let value = match native {
        Native::Push => {
            let mut items = items.borrow_mut();
            items.extend(args);
            Value::Number(items.len() as f64)
        }
        Native::Pop => items.borrow_mut().pop().unwrap_or(Value::Undefined),
        Native::Map | Native::Filter | Native::ForEach => {
            let callback = arg(&args, 0);
            let mut out = Vec::new();
            for (i, item) in snapshot.into_iter().enumerate() {
                let result = interp.call_value(
                    &callback,
                    Value::Undefined,
                    vec![item.clone(), Value::Number(i as f64), this.clone()],
                    span,
                )?;
                match native {
                    Native::Map => out.push(result),
                    Native::Filter if result.is_truthy() => out.push(item),
                    _ => {}
                }
            }
            if native == Native::ForEach {
                Value::Undefined
            } else {
                Value::array(out)
            }
        }
        Native::Reduce => {
            let callback = arg(&args, 0);
            let mut iter = snapshot.into_iter().enumerate();
            let mut acc = match args.get(1) {
                Some(initial) => initial.clone(),
                None => match iter.next() {
                    Some((_, first)) => first,
                    None => {
                        return Err(EvalError::type_error(
                            "reduce of empty array with no initial value",
                            span,
                        ))
                    }
                },
            };
            for (i, item) in iter {
                acc = interp.call_value(
                    &callback,
                    Value::Undefined,
                    vec![acc, item, Value::Number(i as f64), this.clone()],
                    span,
                )?;
            }
            acc
        }
        Native::Join => {
            let sep = match arg(&args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_js_string(),
            };
            let parts: Vec<String> = snapshot
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_js_string() })
                .collect();
            Value::str(&parts.join(&sep))
        }
        Native::IndexOf | Native::Includes => {
            let needle = arg(&args, 0);
            let found = snapshot.iter().position(|v| v.strict_equals(&needle));
            if native == Native::Includes {
                Value::Bool(found.is_some())
            } else {
                Value::Number(found.map_or(-1.0, |i| i as f64))
            }
        }
        Native::Slice => {
            let len = snapshot.len();
            let start = relative_index(&arg(&args, 0), len, 0);
            let end = relative_index(&arg(&args, 1), len, len);
            Value::array(snapshot.get(start..end.max(start)).unwrap_or(&[]).to_vec())
        }
        Native::Concat => {
            let mut out = snapshot;
            for value in args {
                match value {
                    Value::Array(more) => out.extend(more.borrow().iter().cloned()),
                    other => out.push(other),
                }
            }
            Value::array(out)
        }
        Native::Sort => {
            let compare = arg(&args, 0);
            let mut sorted = snapshot;
            let mut failure = None;
            sorted.sort_by(|a, b| {
                if failure.is_some() {
                    return Ordering::Equal;
                }
                if compare.is_nullish() {
                    return a.to_js_string().cmp(&b.to_js_string());
                }
                let result = interp.call_value(
                    &compare,
                    Value::Undefined,
                    vec![a.clone(), b.clone()],
                    span,
                );
                match result {
                    Ok(result) => result
                        .to_number()
                        .partial_cmp(&0.0)
                        .unwrap_or(Ordering::Equal),
                    Err(err) => {
                        failure = Some(err);
                        Ordering::Equal
                    }
                }
            });
            if let Some(err) = failure {
                return Err(err);
            }
            *items.borrow_mut() = sorted;
            this.clone()
        }
        _ => return Err(receiver_error(native, this, span)),
    };
    Ok(value)
}

fn string_call(native: Native, s: &str, args: Vec<Value>, span: Span) -> Result<Value> {
    let value = match native {
        Native::ToUpperCase => Value::str(&s.to_uppercase()),
        Native::ToLowerCase => Value::str(&s.to_lowercase()),
        Native::Trim => Value::str(s.trim()),
        Native::Split => match arg(&args, 0) {
            Value::Undefined => Value::array(vec![Value::str(s)]),
            sep => {
                let sep = sep.to_js_string();
                let parts: Vec<Value> = if sep.is_empty() {
                    s.chars().map(|c| Value::str(&c.to_string())).collect()
                } else {
                    s.split(sep.as_str()).map(Value::str).collect()
                };
                Value::array(parts)
            }
        },
        Native::IndexOf | Native::Includes => {
            let needle = arg(&args, 0).to_js_string();
            let found = s.find(&needle).map(|byte| s[..byte].chars().count());
            if native == Native::Includes {
                Value::Bool(found.is_some())
            } else {
                Value::Number(found.map_or(-1.0, |i| i as f64))
            }
        }
        Native::Slice => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len();
            let start = relative_index(&arg(&args, 0), len, 0);
            let end = relative_index(&arg(&args, 1), len, len);
            let sliced: String = chars
                .get(start..end.max(start))
                .unwrap_or(&[])
                .iter()
                .collect();
            Value::str(&sliced)
        }
        Native::Concat => {
            let mut out = s.to_string();
            for value in &args {
                out.push_str(&value.to_js_string());
            }
            Value::str(&out)
        }
        _ => {
            return Err(EvalError::type_error(
                format!("{} called on string", native.name()),
                span,
            ))
        }
    };
    Ok(value)
}
