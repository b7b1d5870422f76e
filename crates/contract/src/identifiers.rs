//! Newtype identifiers.
//!
//! Server-side resources are addressed purely by a caller-chosen name; the
//! client keeps no local record of them. Wrapping the name in a distinct type
//! keeps an empty string from ever reaching the wire and keeps resource names
//! apart from free-form text arguments such as queries and prompts.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or_else(|| concat!(stringify!($name), " must not be empty").to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes.
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Names a datasource or LLM instance held by the remote server.
    ///
    /// The client does not check that the resource exists or is unique; the
    /// name is only a convention shared with the server.
    ResourceName
}

u64_id! {
    /// Correlates a JSON-RPC response with the request that produced it.
    ///
    /// Issued per client instance, starting at 1.
    RequestId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_name_rejects_empty() {
        assert!(ResourceName::new("").is_none());
        assert_eq!(ResourceName::new("db1").unwrap().as_str(), "db1");
    }

    #[test]
    fn test_resource_name_deserialize_validates() {
        let ok: ResourceName = serde_json::from_str("\"bot\"").unwrap();
        assert_eq!(ok.to_string(), "bot");
        assert!(serde_json::from_str::<ResourceName>("\"\"").is_err());
    }

    #[test]
    fn test_request_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&RequestId::new(7)).unwrap(), "7");
    }
}
