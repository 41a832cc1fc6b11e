/// The error returned by lookups that require the key to be present.
///
/// # Examples
///
/// ```
/// use avl_tree::{AvlTreeMap, KeyError};
///
/// let map: AvlTreeMap<i32, &str> = AvlTreeMap::new();
/// assert_eq!(map.try_get(&1), Err(KeyError));
/// assert_eq!(KeyError.to_string(), "key not found");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, thiserror::Error)]
#[error("key not found")]
pub struct KeyError;
