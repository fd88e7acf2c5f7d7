//! snake_case → camelCase key translation for outgoing JSON.
//!
//! Responses are built from snake_case structs and translated at the edge so
//! clients see `eventType`, `userId`, `totalEvents`.

use serde_json::{Map, Value};

/// Rewrite a snake_case identifier to camelCase.
///
/// Every `_` directly followed by an ASCII letter is dropped and the letter
/// uppercased. Any other character is kept as is, so `a__b` becomes `a_B`
/// and `user_id_2` becomes `userId_2`.
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_alphabetic() {
                    out.push(next.to_ascii_uppercase());
                    let _ = chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Translate every object key in `value` to camelCase, recursively.
///
/// Arrays are translated element by element; scalars pass through. Key order
/// is preserved. If two keys collapse to the same camelCase name, the later
/// one wins.
pub fn camelize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, val) in map {
                let _ = out.insert(to_camel_case(&key), camelize_keys(val));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(camelize_keys).collect()),
        other => other,
    }
}
