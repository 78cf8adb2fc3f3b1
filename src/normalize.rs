//! Canonical ordering of top-level payload keys.
use core::cmp::Ordering;

use alloc::{borrow::Cow, string::ToString};

use payload_msgpack::{Key, Value};

/// Return `value` with its top-level map keys in natural order.
///
/// Only the outermost map is sorted. Nested collections, arrays and scalars
/// are returned unchanged.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Map(map) => {
            let mut map = map.clone();
            map.sort_keys_by(compare_keys);
            Value::Map(map)
        }
        value => value.clone()
    }
}

/// Total order of map keys.
///
/// Integer keys compare by their decimal text. Keys equal under
/// [`compare_natural`], such as `"a01"` and `"a1"`, fall back to their bytes,
/// then an integer precedes an equal string.
pub fn compare_keys(a: &Key, b: &Key) -> Ordering {
    let (text_a, text_b) = (key_text(a), key_text(b));
    compare_natural(&text_a, &text_b)
        .then_with(|| text_a.cmp(&text_b))
        .then_with(|| b.is_int().cmp(&a.is_int()))
}

fn key_text(key: &Key) -> Cow<'_, [u8]> {
    match key {
        Key::Int(n) => Cow::Owned(n.to_string().into_bytes()),
        Key::Bytes(b) => Cow::Borrowed(b)
    }
}

/// Compare byte strings in natural order.
///
/// Runs of ASCII digits compare by numeric value, so `"a2" < "a10"`.
/// Everything else compares byte by byte.
pub fn compare_natural(mut a: &[u8], mut b: &[u8]) -> Ordering {
    loop {
        match (a.split_first(), b.split_first()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((x, _)), Some((y, _))) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let (digits_a, rest_a) = split_digits(a);
                let (digits_b, rest_b) = split_digits(b);
                match compare_digits(digits_a, digits_b) {
                    Ordering::Equal => {
                        a = rest_a;
                        b = rest_b;
                    }
                    ord => return ord
                }
            }
            (Some((x, rest_a)), Some((y, rest_b))) => match x.cmp(y) {
                Ordering::Equal => {
                    a = rest_a;
                    b = rest_b;
                }
                ord => return ord
            }
        }
    }
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let len = s.iter().take_while(|c| c.is_ascii_digit()).count();
    s.split_at(len)
}

// arbitrarily long digit runs compare without overflow
fn compare_digits(a: &[u8], b: &[u8]) -> Ordering {
    let a = trim_zeros(a);
    let b = trim_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn trim_zeros(s: &[u8]) -> &[u8] {
    let zeros = s.iter().take_while(|&&c| c == b'0').count();
    &s[zeros..]
}
