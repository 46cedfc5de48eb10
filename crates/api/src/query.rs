//! Query string parsing with bracket notation.
//!
//! Produces the shapes the normalizer expects:
//!
//! - `a=1` → `"1"`, repeated `a=1&a=2` → `["1","2"]`
//! - `a[]=1&a[]=2` → `["1","2"]`
//! - `a[b]=1` → `{"b":"1"}`, `a[b][c]=1` → `{"b":{"c":"1"}}`
//!
//! Numeric segments (`a[0]`) are plain object keys. When shapes conflict
//! (a scalar arriving for a key that already holds an object, or a named key
//! into an array), the later pair is ignored.
//!
//! Nesting stops after [`MAX_DEPTH`] bracket segments; whatever follows is
//! kept as one literal key (`a[b][c][d][e][f][g][h]` nests `b` through `f`,
//! then `"[g][h]"`). Only the first [`MAX_PARAMETERS`] pairs are read.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Bracket segments parsed before the rest of a key is taken literally.
pub const MAX_DEPTH: usize = 5;

/// Pairs read from one query string; later pairs are dropped.
pub const MAX_PARAMETERS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Push,
}

/// Parse a raw (still percent-encoded) query string, without the leading `?`.
pub fn parse(raw: &str) -> Map<String, Value> {
    let mut root = Map::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()).take(MAX_PARAMETERS) {
        let Some((name, path)) = split_key(&key) else {
            continue;
        };
        insert(&mut root, name, &path, Value::String(value.into_owned()));
    }
    root
}

/// `a[b][]` → (`a`, [Key(b), Push]). Malformed brackets make the whole key a
/// plain name.
fn split_key(key: &str) -> Option<(String, Vec<Segment>)> {
    let plain = || (!key.is_empty()).then(|| (key.to_string(), Vec::new()));

    let open = match key.find('[') {
        Some(0) | None => return plain(),
        Some(i) => i,
    };

    let mut path = Vec::new();
    let mut rest = &key[open..];
    while path.len() < MAX_DEPTH {
        let Some(inner) = rest.strip_prefix('[') else {
            break;
        };
        let Some(close) = inner.find(']') else {
            return plain();
        };
        let segment = &inner[..close];
        path.push(if segment.is_empty() {
            Segment::Push
        } else {
            Segment::Key(segment.to_string())
        });
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        if path.len() < MAX_DEPTH {
            return plain();
        }
        path.push(Segment::Key(rest.to_string()));
    }

    Some((key[..open].to_string(), path))
}

fn insert(object: &mut Map<String, Value>, key: String, path: &[Segment], value: Value) {
    match object.get_mut(&key) {
        Some(existing) => merge(existing, path, value),
        None => {
            object.insert(key, build(path, value));
        }
    }
}

fn build(path: &[Segment], value: Value) -> Value {
    match path.split_first() {
        None => value,
        Some((Segment::Push, rest)) => Value::Array(vec![build(rest, value)]),
        Some((Segment::Key(key), rest)) => {
            let mut object = Map::new();
            object.insert(key.clone(), build(rest, value));
            Value::Object(object)
        }
    }
}

fn merge(existing: &mut Value, path: &[Segment], value: Value) {
    match path.split_first() {
        // Repeated scalar key, or a push: collect into an array.
        None | Some((Segment::Push, _)) => {
            let rest = path.get(1..).unwrap_or_default();
            let item = build(rest, value);
            match existing {
                Value::Array(items) => items.push(item),
                Value::String(_) => {
                    let previous = existing.take();
                    *existing = Value::Array(vec![previous, item]);
                }
                _ => {}
            }
        }
        Some((Segment::Key(key), rest)) => {
            if let Value::Object(object) = existing {
                insert(object, key.clone(), rest, value);
            }
        }
    }
}
