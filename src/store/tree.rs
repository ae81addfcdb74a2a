//! Path-addressed edits on a JSON tree, shared by the stores that keep JSON locally.

use serde_json::{Map, Value};

/// True for values the store treats as absent.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Follows `path` below `node`.
pub(crate) fn read_at<'a>(node: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(node, |current, segment| current.get(*segment))
}

/// Writes `value` at `path` below `node`, deleting when the value is empty.
pub(crate) fn write_at(node: &mut Value, path: &[&str], value: Value) {
    if is_empty(&value) {
        remove_at(node, path);
        return;
    }
    match path.split_first() {
        None => *node = value,
        Some((head, rest)) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry((*head).to_string()).or_insert(Value::Null);
                write_at(child, rest, value);
            }
        }
    }
}

/// Deletes the value at `path` below `node` and prunes emptied parents.
pub(crate) fn remove_at(node: &mut Value, path: &[&str]) {
    match path.split_first() {
        None => *node = Value::Object(Map::new()),
        Some((head, rest)) => {
            if let Value::Object(map) = node {
                if rest.is_empty() {
                    map.remove(*head);
                } else if let Some(child) = map.get_mut(*head) {
                    remove_at(child, rest);
                    if is_empty(child) {
                        map.remove(*head);
                    }
                }
            }
        }
    }
}
