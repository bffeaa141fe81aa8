//! Text rendering of values: `repr` and the float formatting rules.

use pyx_stack::ensure_sufficient_stack;

use crate::value::{Heap, Value};

/// `repr(value)`. Self-containing containers render as `[...]`/`{...}`.
pub fn repr(value: &Value) -> String {
    let mut out = String::new();
    let mut active = Vec::new();
    write_repr(value, &mut out, &mut active);
    out
}

fn write_repr(value: &Value, out: &mut String, active: &mut Vec<usize>) {
    ensure_sufficient_stack(|| match value {
        Value::None => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Float(x) => out.push_str(&float_repr(*x)),
        Value::Str(s) => out.push_str(&repr_str(s)),
        Value::List(items) => {
            let addr = Heap::addr(items);
            if active.contains(&addr) {
                out.push_str("[...]");
                return;
            }
            let items = items.read().clone();
            active.push(addr);
            write_seq(&items, "[", "]", out, active);
            active.pop();
        }
        Value::Tuple(items) => {
            if items.len() == 1 {
                out.push('(');
                write_repr(&items[0], out, active);
                out.push_str(",)");
            } else {
                write_seq(items, "(", ")", out, active);
            }
        }
        Value::Dict(dict) => {
            let addr = Heap::addr(dict);
            if active.contains(&addr) {
                out.push_str("{...}");
                return;
            }
            let items = dict.read().items();
            active.push(addr);
            out.push('{');
            for (i, (k, v)) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(k, out, active);
                out.push_str(": ");
                write_repr(v, out, active);
            }
            out.push('}');
            active.pop();
        }
        Value::Set(set) => {
            let items = set.read().values();
            if items.is_empty() {
                out.push_str("set()");
            } else {
                write_seq(&items, "{", "}", out, active);
            }
        }
        Value::Range(r) => {
            if r.step == 1 {
                out.push_str(&format!("range({}, {})", r.start, r.stop));
            } else {
                out.push_str(&format!("range({}, {}, {})", r.start, r.stop, r.step));
            }
        }
        Value::Function(f) => {
            out.push_str(&format!("<function {} at {:#x}>", f.def.name, Heap::addr(f)));
        }
        Value::Builtin(f) => out.push_str(&format!("<built-in function {}>", f.name)),
        Value::BoundMethod(m) => out.push_str(&format!(
            "<built-in method {} of {} object>",
            m.name,
            m.receiver.type_name()
        )),
        Value::Module(m) => out.push_str(&format!("<module '{}'>", m.name)),
        Value::Type(kind) => out.push_str(&format!("<class '{}'>", kind.name())),
        Value::ExceptionType(kind) => out.push_str(&format!("<class '{}'>", kind.name())),
        Value::Exception(exc) => out.push_str(&exc.repr()),
    });
}

fn write_seq(items: &[Value], open: &str, close: &str, out: &mut String, active: &mut Vec<usize>) {
    out.push_str(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_repr(item, out, active);
    }
    out.push_str(close);
}

/// Quote a string the way `repr` does: single quotes unless the text
/// contains a single quote and no double quote.
pub fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Shortest round-trip float text: positional for exponents in
/// `-4..16`, scientific (`1e+16`, `1.5e-07`) otherwise.
pub fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let sci = format!("{x:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..16).contains(&exponent) {
        let mut text = format!("{x}");
        if !text.contains('.') {
            text.push_str(".0");
        }
        text
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}
