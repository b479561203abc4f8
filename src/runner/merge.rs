//! Result merging
//!
//! Every task body that returns feeds its value through [`merge_result`] into
//! the context's shared result slot.

use serde_yaml::{Mapping, Value};

/// Merge a task's return value into the accumulated result.
///
/// - mapping onto mapping: shallow merge, existing keys keep their position
///   and take the new value, new keys are appended in order
/// - `Null`: no change
/// - anything else: replaces the accumulated value
pub fn merge_result(acc: &mut Value, value: Value) {
    match value {
        Value::Null => {}
        Value::Mapping(incoming) => match acc {
            Value::Mapping(current) => {
                for (key, val) in incoming {
                    current.insert(key, val);
                }
            }
            other => *other = Value::Mapping(incoming),
        },
        other => *acc = other,
    }
}

/// A fresh, empty result value
pub fn empty_result() -> Value {
    Value::Mapping(Mapping::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, i64)]) -> Value {
        let mut map = Mapping::new();
        for (k, v) in pairs {
            map.insert(Value::from(*k), Value::from(*v));
        }
        Value::Mapping(map)
    }

    fn keys(value: &Value) -> Vec<String> {
        value
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_mapping_merge_updates_in_place_and_appends() {
        let mut acc = mapping(&[("a", 1), ("b", 2)]);
        merge_result(&mut acc, mapping(&[("c", 3), ("a", 10)]));

        assert_eq!(keys(&acc), vec!["a", "b", "c"]);
        assert_eq!(acc["a"], Value::from(10));
        assert_eq!(acc["c"], Value::from(3));
    }

    #[test]
    fn test_merge_sequence_equals_left_to_right_merge() {
        let returns = vec![
            mapping(&[("a", 1)]),
            mapping(&[("b", 2), ("a", 3)]),
            mapping(&[("c", 4)]),
        ];

        let mut acc = empty_result();
        for value in returns.clone() {
            merge_result(&mut acc, value);
        }

        // merging the tail first and then folding it in gives the same mapping
        let mut tail = empty_result();
        for value in returns[1..].iter().cloned() {
            merge_result(&mut tail, value);
        }
        let mut grouped = empty_result();
        merge_result(&mut grouped, returns[0].clone());
        merge_result(&mut grouped, tail);

        assert_eq!(acc, grouped);
        assert_eq!(acc, mapping(&[("a", 3), ("b", 2), ("c", 4)]));
    }

    #[test]
    fn test_null_is_a_no_op() {
        let mut acc = mapping(&[("a", 1)]);
        merge_result(&mut acc, Value::Null);
        assert_eq!(acc, mapping(&[("a", 1)]));
    }

    #[test]
    fn test_non_mapping_clobbers() {
        let mut acc = mapping(&[("a", 1)]);
        merge_result(&mut acc, Value::from("done"));
        assert_eq!(acc, Value::from("done"));
    }

    #[test]
    fn test_mapping_after_clobber_starts_from_replaced_value() {
        let mut acc = mapping(&[("a", 1)]);
        merge_result(&mut acc, Value::from(42));
        merge_result(&mut acc, mapping(&[("b", 2)]));

        // the pre-clobber mapping is gone
        assert_eq!(acc, mapping(&[("b", 2)]));
    }
}
