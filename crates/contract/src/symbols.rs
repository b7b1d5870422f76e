//! Symbolic enumerations and their canonical code tables.
//!
//! The server represents driver kinds, LLM providers, and chat roles as small
//! integers. Callers name them with lowercase strings (`"postgres"`,
//! `"openai"`, `"user"`). Each enumeration has exactly one `(name, variant)`
//! table, and every lookup is total: a name missing from the table maps to the
//! reserved `Unspecified` member (code `0`) so the server decides how to treat
//! values it added after this client was built.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for symbol enumerations.
// Generates: enum (Copy, repr(i32)), TABLE, from_name(), from_code(), code(),
// name(), Display.
// ---------------------------------------------------------------------------
macro_rules! symbol_enum {
    (
        $(#[$attr:meta])*
        $name:ident {
            $( $(#[$vattr:meta])* $variant:ident = $code:literal => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        #[repr(i32)]
        pub enum $name {
            /// Reserved code for names this client does not recognise.
            #[default]
            Unspecified = 0,
            $( $(#[$vattr])* $variant = $code ),+
        }

        impl $name {
            /// The canonical name table. `Unspecified` has no name.
            pub const TABLE: &'static [(&'static str, $name)] = &[ $( ($text, $name::$variant) ),+ ];

            /// Looks up a symbolic name. Unknown names yield `Unspecified`.
            pub fn from_name(name: &str) -> Self {
                Self::TABLE
                    .iter()
                    .find(|(text, _)| *text == name)
                    .map_or(Self::Unspecified, |(_, value)| *value)
            }

            /// Looks up a wire code. Unknown codes yield `Unspecified`.
            pub fn from_code(code: i32) -> Self {
                Self::TABLE
                    .iter()
                    .find(|(_, value)| value.code() == code)
                    .map_or(Self::Unspecified, |(_, value)| *value)
            }

            /// Returns the integer wire code.
            pub fn code(self) -> i32 {
                self as i32
            }

            /// Returns the symbolic name (`"unspecified"` for the reserved member).
            pub fn name(self) -> &'static str {
                Self::TABLE
                    .iter()
                    .find(|(_, value)| *value == self)
                    .map_or("unspecified", |(text, _)| *text)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.name())
            }
        }
    };
}

symbol_enum! {
    /// Backend kind of a datasource.
    DriverKind {
        Postgres = 1 => "postgres",
        Mysql = 2 => "mysql",
        Redis = 3 => "redis",
        Mongodb = 4 => "mongodb",
        Kafka = 5 => "kafka",
    }
}

symbol_enum! {
    /// Vendor behind an LLM instance.
    LlmProvider {
        Openai = 1 => "openai",
        Ollama = 2 => "ollama",
        Anthropic = 3 => "anthropic",
        Local = 4 => "local",
    }
}

symbol_enum! {
    /// Author of a chat message.
    ChatRole {
        System = 1 => "system",
        User = 2 => "user",
        Assistant = 3 => "assistant",
    }
}

/// Maps a driver name to its wire code (`0` when unrecognised).
pub fn map_driver(name: &str) -> i32 {
    DriverKind::from_name(name).code()
}

/// Maps a provider name to its wire code (`0` when unrecognised).
pub fn map_provider(name: &str) -> i32 {
    LlmProvider::from_name(name).code()
}

/// Maps a chat role name to its wire code (`0` when unrecognised).
pub fn map_role(name: &str) -> i32 {
    ChatRole::from_name(name).code()
}
