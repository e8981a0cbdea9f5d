//! Selective payload logging.
//!
//! Picks a handful of fields out of a payload for log output. This only
//! shapes what gets logged; the forwarded body is never altered.

use serde_json::{Map, Value};

/// Look up a dot-separated path such as `user.email`. Numeric segments
/// index into arrays.
pub fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(body, |cur, seg| match cur {
        Value::Object(map) => map.get(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Build an object keyed by path holding each field found in `body`.
/// Paths that do not resolve are left out.
pub fn preview(body: &Value, paths: &[String]) -> Value {
    let mut out = Map::new();
    for path in paths {
        if let Some(v) = lookup(body, path) {
            out.insert(path.clone(), v.clone());
        }
    }
    Value::Object(out)
}
