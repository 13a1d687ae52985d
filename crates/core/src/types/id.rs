//! Opaque identifiers issued by the backend.
//!
//! The backend owns ID generation, so IDs are carried as strings. Numeric IDs
//! in a payload are accepted and stored in their decimal form.

/// Macro to define an opaque, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain string, `Deserialize` from a string or an integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - `new()`, `as_str()` and `From<&str>` / `From<String>`
///
/// # Example
///
/// ```rust
/// # use am_botanics_core::define_id;
/// define_id!(ReviewId);
///
/// let id = ReviewId::new("66f1c0ffee");
/// assert_eq!(id.as_str(), "66f1c0ffee");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                #[derive(::serde::Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Text(String),
                    Number(i64),
                }

                Ok(match Raw::deserialize(deserializer)? {
                    Raw::Text(s) => Self(s),
                    Raw::Number(n) => Self(n.to_string()),
                })
            }
        }
    };
}

define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_string_id() {
        let id: UserId = serde_json::from_str("\"64a7f0c2e1\"").unwrap();
        assert_eq!(id, UserId::new("64a7f0c2e1"));
    }

    #[test]
    fn test_deserialize_numeric_id() {
        let id: UserId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }
}
