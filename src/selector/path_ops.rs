use crate::{
    store::StoreError,
    value::{Key, Value},
};

/// Follows `keys` from `root`, stopping at the first miss.
pub(super) fn navigate<'a>(root: &'a Value, keys: &[Key]) -> Option<&'a Value> {
    keys.iter().try_fold(root, |current, key| current.get(key))
}

/// Assigns `new_value` under the last key of `keys`.
///
/// # Errors
/// * `StoreError::InvalidSelector` - If `keys` is empty
/// * `StoreError::BrokenPath` - If an intermediate container is missing or the
///   final container cannot take the key
pub(super) fn set_value_at_path(
    root: &mut Value,
    keys: &[Key],
    new_value: Value,
) -> Result<(), StoreError> {
    let Some((last_key, parents)) = keys.split_last() else {
        return Err(StoreError::InvalidSelector {
            reason: "an empty path addresses the whole store; use replace instead".to_string(),
        });
    };

    let parent = navigate_to_parent_mut(root, parents)?;

    insert_value(parent, last_key, new_value, keys)
}

/// Walks to the container addressed by `parents` without creating anything.
///
/// # Errors
/// * `StoreError::BrokenPath` - If any step misses
fn navigate_to_parent_mut<'a>(
    root: &'a mut Value,
    parents: &[Key],
) -> Result<&'a mut Value, StoreError> {
    let mut current = root;

    for (i, key) in parents.iter().enumerate() {
        current = navigate_step_mut(current, key, &parents[..=i])?;
    }

    Ok(current)
}

fn navigate_step_mut<'a>(
    current: &'a mut Value,
    key: &Key,
    path_so_far: &[Key],
) -> Result<&'a mut Value, StoreError> {
    let type_str = current.type_str();
    let is_container = current.is_container();

    current.get_mut(key).ok_or_else(|| {
        let reason = if is_container {
            format!("no entry in {type_str}")
        } else {
            format!("cannot navigate into {type_str}")
        };

        StoreError::broken_path(path_so_far, key, reason)
    })
}

fn insert_value(
    container: &mut Value,
    key: &Key,
    new_value: Value,
    path: &[Key],
) -> Result<(), StoreError> {
    match container {
        Value::Mapping(map) => {
            map.insert(key.to_field(), new_value);
            Ok(())
        }
        Value::Sequence(items) => {
            let Some(index) = key.as_index() else {
                return Err(StoreError::broken_path(
                    path,
                    key,
                    "sequence positions must be integers",
                ));
            };

            let len = items.len();
            items
                .get_mut(index)
                .map(|slot| *slot = new_value)
                .ok_or_else(|| {
                    StoreError::broken_path(
                        path,
                        key,
                        format!("index {index} out of bounds for length {len}"),
                    )
                })
        }
        other => Err(StoreError::broken_path(
            path,
            key,
            format!("cannot insert into {}", other.type_str()),
        )),
    }
}
