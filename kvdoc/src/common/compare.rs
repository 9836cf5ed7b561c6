use crate::common::Value;
use std::cmp::Ordering;

// Ordering of value classes. Numbers include booleans.
const RANK_NULL: u8 = 0;
const RANK_NUMERIC: u8 = 1;
const RANK_ARRAY: u8 = 2;
const RANK_OBJECT: u8 = 3;
const RANK_STRING: u8 = 4;

// 2^127 as f64, the first float outside the i128 range.
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

/// Compares two field values with the engine's total order.
///
/// The order is the one used for `lt`/`gt` filters and for sorting:
///
/// * `Null` sorts before everything else.
/// * Booleans, integers and floats compare numerically after coercion
///   (`false` = 0, `true` = 1). Integer/float comparisons are exact, even for
///   integers outside the `f64` mantissa. `NaN` sorts after every number and is
///   equal to itself.
/// * Arrays, then objects, sort after numbers. Both compare element by element and
///   then by length.
/// * Strings sort lexicographically and after every non-string value. A string is
///   never equal to a number, even when its text spells that number.
///
/// # Arguments
/// * `a` - Left operand.
/// * `b` - Right operand.
///
/// # Returns
/// The [Ordering] of `a` relative to `b`.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    let (rank_a, rank_b) = (rank(a), rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => compare_seq(x.iter(), y.iter(), x.len(), y.len()),
        (Value::Object(x), Value::Object(y)) => {
            for ((ka, va), (kb, vb)) in x.iter().zip(y.iter()) {
                let ord = ka.cmp(kb).then_with(|| compare(va, vb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => compare_numeric(x, y),
            // same rank means both are numeric at this point
            _ => Ordering::Equal,
        },
    }
}

/// Returns true when [compare] reports the two values as equal.
#[inline]
pub fn equals(a: &Value, b: &Value) -> bool {
    compare(a, b) == Ordering::Equal
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => RANK_NULL,
        Value::Bool(_) | Value::I64(_) | Value::U64(_) | Value::F64(_) => RANK_NUMERIC,
        Value::Array(_) => RANK_ARRAY,
        Value::Object(_) => RANK_OBJECT,
        Value::String(_) => RANK_STRING,
    }
}

#[derive(Clone, Copy)]
enum Numeric {
    Int(i128),
    Float(f64),
}

fn numeric(value: &Value) -> Option<Numeric> {
    match value {
        Value::Bool(b) => Some(Numeric::Int(i128::from(*b))),
        Value::I64(v) => Some(Numeric::Int(i128::from(*v))),
        Value::U64(v) => Some(Numeric::Int(i128::from(*v))),
        Value::F64(v) => Some(Numeric::Float(*v)),
        _ => None,
    }
}

fn compare_numeric(a: Numeric, b: Numeric) -> Ordering {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => x.cmp(&y),
        (Numeric::Float(x), Numeric::Float(y)) => compare_floats(x, y),
        (Numeric::Int(x), Numeric::Float(y)) => compare_int_float(x, y),
        (Numeric::Float(x), Numeric::Int(y)) => compare_int_float(y, x).reverse(),
    }
}

fn compare_floats(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

fn compare_int_float(i: i128, f: f64) -> Ordering {
    if f.is_nan() {
        return Ordering::Less;
    }
    if f >= I128_BOUND {
        return Ordering::Less;
    }
    if f < -I128_BOUND {
        return Ordering::Greater;
    }

    let whole = f.trunc();
    match i.cmp(&(whole as i128)) {
        Ordering::Equal => {
            let fract = f - whole;
            if fract > 0.0 {
                Ordering::Less
            } else if fract < 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        ord => ord,
    }
}

fn compare_seq<'a>(
    a: impl Iterator<Item = &'a Value>,
    b: impl Iterator<Item = &'a Value>,
    len_a: usize,
    len_b: usize,
) -> Ordering {
    for (x, y) in a.zip(b) {
        let ord = compare(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    len_a.cmp(&len_b)
}
