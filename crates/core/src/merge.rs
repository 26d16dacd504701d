//! Merge-on-write reconciliation
//!
//! The tree service's update endpoints replace the full resource. To make
//! updates behave like a patch, the dispatcher fetches the current
//! representation and reconciles it with the caller-supplied fields before
//! sending the write. Scalar fields are overwritten, untouched fields are
//! carried through, and `_list` fields are unioned append-only so that
//! repeating an update never accumulates duplicate references.

use std::collections::HashSet;

use rootline_domain::Record;
use serde_json::Value;

/// Suffix marking list-valued record fields (`event_ref_list`, `note_list`).
const LIST_FIELD_SUFFIX: &str = "_list";

/// Key identifying reference objects inside `_list` fields.
const REF_KEY: &str = "ref";

/// Reconcile a partial update against the current server representation.
///
/// Returns the full record to send to the replace endpoint:
/// - keys present only in `existing` are carried through unchanged,
/// - `_list` keys present in both are unioned (see [`merge_lists`]),
/// - every other incoming key overwrites the existing value.
#[must_use]
pub fn merge_update(existing: &Record, incoming: Record) -> Record {
    let mut merged = existing.clone();

    for (key, value) in incoming {
        let list_merge = key.ends_with(LIST_FIELD_SUFFIX)
            && value.is_array()
            && existing.get(&key).is_some_and(Value::is_array);

        if list_merge {
            let current = existing
                .get(&key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let incoming_items = match value {
                Value::Array(items) => items,
                _ => Vec::new(),
            };
            merged.insert(key, Value::Array(merge_lists(current, incoming_items)));
        } else {
            merged.insert(key, value);
        }
    }

    merged
}

/// Union two list-field values with shape-dependent deduplication.
///
/// One sample element from each side decides the strategy:
/// - both reference objects (carrying a `"ref"` key): keep every existing
///   element, append incoming objects whose `ref` is not already present;
/// - both plain strings (bare handles): same append-only semantics,
///   deduplicated by value;
/// - mixed or unrecognized shapes: plain concatenation.
///
/// An empty side always degrades to concatenation; there is nothing to
/// deduplicate against.
fn merge_lists(existing: Vec<Value>, incoming: Vec<Value>) -> Vec<Value> {
    enum Strategy {
        ByRef,
        ByValue,
        Concat,
    }

    let strategy = match (existing.first(), incoming.first()) {
        (Some(a), Some(b)) if is_ref_object(a) && is_ref_object(b) => Strategy::ByRef,
        (Some(a), Some(b)) if a.is_string() && b.is_string() => Strategy::ByValue,
        // Mixed shapes, or an empty side with nothing to deduplicate against.
        _ => Strategy::Concat,
    };

    match strategy {
        Strategy::ByRef => {
            let seen: HashSet<String> =
                existing.iter().filter_map(|v| ref_key(v).map(str::to_string)).collect();
            let mut merged = existing;
            for item in incoming {
                let keep = item.is_object()
                    && ref_key(&item).map_or(true, |r| !seen.contains(r));
                if keep {
                    merged.push(item);
                }
            }
            merged
        }
        Strategy::ByValue => {
            let seen: HashSet<String> =
                existing.iter().filter_map(Value::as_str).map(str::to_string).collect();
            let mut merged = existing;
            for item in incoming {
                let duplicate = item.as_str().is_some_and(|s| seen.contains(s));
                if !duplicate {
                    merged.push(item);
                }
            }
            merged
        }
        Strategy::Concat => {
            let mut merged = existing;
            merged.extend(incoming);
            merged
        }
    }
}

fn is_ref_object(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| obj.contains_key(REF_KEY))
}

fn ref_key(value: &Value) -> Option<&str> {
    value.as_object().and_then(|obj| obj.get(REF_KEY)).and_then(Value::as_str)
}
