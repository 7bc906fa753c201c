//! Deep merge of fragment values.

use serde_json::Value;

/// Deep-merge `overlay` into `base`.
///
/// Mappings merge recursively, sequences are concatenated (base items first),
/// and for every other combination the overlay value replaces the base value
/// wholesale, including when the two sides have different shapes.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, ov_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, ov_val),
                    None => ov_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (Value::Array(mut base_items), Value::Array(overlay_items)) => {
            base_items.extend(overlay_items);
            Value::Array(base_items)
        }
        (_, overlay) => overlay,
    }
}
