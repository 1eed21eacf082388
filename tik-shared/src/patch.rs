/// Unset-aware field wrapper for partial updates
///
/// JSON update bodies need three states per field, which `Option<T>` alone
/// cannot carry:
///
/// - the key is missing: [`Patch::Unset`], the column is left untouched
/// - the key is present with `null`: [`Patch::Null`]
/// - the key is present with a value: [`Patch::Value`]
///
/// Fields must be annotated with `#[serde(default)]` so that a missing key
/// deserializes to `Unset`.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use tik_shared::patch::Patch;
///
/// #[derive(Deserialize)]
/// struct UpdateBody {
///     #[serde(default)]
///     title: Patch<String>,
///     #[serde(default)]
///     description: Patch<String>,
/// }
///
/// let body: UpdateBody = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
/// assert_eq!(body.title, Patch::Value("New".to_string()));
/// assert!(body.description.is_unset());
/// ```

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field omitted by the caller
    #[default]
    Unset,

    /// Field explicitly set to `null`
    Null,

    /// Field explicitly set to a value
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    pub fn is_set(&self) -> bool {
        !self.is_unset()
    }

    /// The supplied value, if one was given
    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Converts a set field into the value to store (`None` for an explicit null)
    ///
    /// Returns `None` for `Unset`, meaning "do not touch the column".
    pub fn into_assignment(self) -> Option<Option<T>> {
        match self {
            Patch::Unset => None,
            Patch::Null => Some(None),
            Patch::Value(value) => Some(Some(value)),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Patch<U> {
        match self {
            Patch::Unset => Patch::Unset,
            Patch::Null => Patch::Null,
            Patch::Value(value) => Patch::Value(f(value)),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        label: Patch<String>,
        #[serde(default)]
        level_id: Patch<i64>,
    }

    #[test]
    fn test_missing_key_is_unset() {
        let body: Body = serde_json::from_str("{}").unwrap();
        assert!(body.label.is_unset());
        assert!(body.level_id.is_unset());
    }

    #[test]
    fn test_explicit_null_differs_from_missing() {
        let body: Body = serde_json::from_str(r#"{"label": null}"#).unwrap();
        assert_eq!(body.label, Patch::Null);
        assert!(body.label.is_set());
        assert_eq!(body.label.into_assignment(), Some(None));
    }

    #[test]
    fn test_value_assignment() {
        let body: Body = serde_json::from_str(r#"{"level_id": 3}"#).unwrap();
        assert_eq!(body.level_id.value(), Some(&3));
        assert_eq!(body.level_id.into_assignment(), Some(Some(3)));
        assert_eq!(body.label.into_assignment(), None);
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let result: Result<Body, _> = serde_json::from_str(r#"{"level_id": "high"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_map_preserves_state() {
        assert_eq!(Patch::Value(2).map(|v| v * 2), Patch::Value(4));
        assert_eq!(Patch::<i32>::Null.map(|v| v * 2), Patch::Null);
        assert_eq!(Patch::<i32>::Unset.map(|v| v * 2), Patch::Unset);
    }
}
