use serde::{Deserialize, Serialize};
use std::fmt;

/// Generates a printable identifier: hex epoch milliseconds followed by a
/// random v4 UUID. The time prefix keeps ids roughly sortable by creation.
pub fn generate_id() -> String {
    format!("{:x}-{}", crate::now_ms().max(0), uuid::Uuid::new_v4().simple())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                Self(generate_id())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Durable anonymous identifier for a storage profile.
    VisitorId
);

string_id!(
    /// Identifier of one activity session.
    SessionId
);

string_id!(
    /// Unique identifier of a single tracked event.
    EventId
);
