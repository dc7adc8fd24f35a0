//! Newtype wrappers for entity identifiers.
//!
//! These prevent accidentally mixing up card, transaction and user IDs at
//! compile time. All three are opaque strings on the wire.

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapping a `String` inner type.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident { $($extra:tt)* }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the given string.
            #[inline]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// Returns a reference to the inner string.
            #[inline]
            #[must_use]
            pub fn as_inner(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner string.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            $($extra)*
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

define_string_id! {
    /// Identifier of the user owning a ledger (e-mail, login or `guest`).
    UserId {
        /// The user id used when nobody is signed in.
        #[inline]
        #[must_use]
        pub fn guest() -> Self {
            Self("guest".to_owned())
        }

        /// Encodes the id as a single file-name component.
        ///
        /// ASCII letters, digits, `-`, `@` and non-leading `.` are kept.
        /// Every other byte, `%` and `_` included, is written as `%XX`, so
        /// distinct ids never share a name and none can climb out of a
        /// directory. The empty id encodes as a lone `%`.
        #[must_use]
        pub fn path_safe(&self) -> String {
            let mut name = String::with_capacity(self.0.len());
            for (index, ch) in self.0.char_indices() {
                let keep = ch.is_ascii_alphanumeric()
                    || matches!(ch, '-' | '@')
                    || (ch == '.' && index > 0);
                if keep {
                    name.push(ch);
                    continue;
                }
                let mut buf = [0_u8; 4];
                for byte in ch.encode_utf8(&mut buf).bytes() {
                    name.push('%');
                    name.push(hex_digit(byte >> 4_u8));
                    name.push(hex_digit(byte & 0x0F));
                }
            }
            if name.is_empty() {
                name.push('%');
            }
            name
        }
    }
}

/// Upper-case hex digit for the low four bits of `nibble`.
fn hex_digit(nibble: u8) -> char {
    char::from_digit(u32::from(nibble & 0x0F), 16).map_or('0', |digit| digit.to_ascii_uppercase())
}

define_string_id! {
    /// Unique identifier for a credit card.
    CardId {
        /// Generates a fresh random identifier (UUID v4).
        #[inline]
        #[must_use]
        pub fn generate() -> Self {
            Self(uuid::Uuid::new_v4().to_string())
        }
    }
}

define_string_id! {
    /// Unique identifier for a purchase transaction.
    TransactionId {
        /// Generates a fresh random identifier (UUID v4).
        #[inline]
        #[must_use]
        pub fn generate() -> Self {
            Self(uuid::Uuid::new_v4().to_string())
        }
    }
}
