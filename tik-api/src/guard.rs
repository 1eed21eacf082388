/// Not-found guard
///
/// Handlers run every fetched value or collection through [`guard`] before
/// using it. An absent value or an empty collection becomes
/// `ApiError::NotFound` with the given message, logged at warn level.

use crate::error::{ApiError, ApiResult};
use tracing::warn;

/// Something that can be present or absent
pub trait Presence {
    type Output;

    /// The value if present
    fn present(self) -> Option<Self::Output>;
}

impl<T> Presence for Option<T> {
    type Output = T;

    fn present(self) -> Option<T> {
        self
    }
}

impl<T> Presence for Vec<T> {
    type Output = Vec<T>;

    fn present(self) -> Option<Vec<T>> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Fails with `NotFound(message)` if `value` is absent or empty
pub fn guard<P: Presence>(value: P, message: impl Into<String>) -> ApiResult<P::Output> {
    match value.present() {
        Some(output) => Ok(output),
        None => {
            let message = message.into();
            warn!("{}", message);
            Err(ApiError::NotFound(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_present_option_passes() {
        assert_eq!(guard(Some(3), "missing").unwrap(), 3);
    }

    #[test]
    fn test_absent_option_fails() {
        let err = guard(None::<i64>, "Category with ID 9 not found").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.message(), "Category with ID 9 not found");
    }

    #[test]
    fn test_empty_collection_fails() {
        let err = guard(Vec::<i64>::new(), "No categories found").unwrap_err();
        assert_eq!(err.message(), "No categories found");

        assert_eq!(guard(vec![1, 2], "No categories found").unwrap(), vec![1, 2]);
    }
}
