// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes and token generation.
//!
//! Task ids are 12-char url-safe random tokens; worker ids are short
//! sequence-based handles. Both stay opaque strings to consumers: the
//! types here only build, compare, display, and clip them.

use rand::Rng;

/// Length of generated task-id tokens.
pub const TOKEN_LEN: usize = 12;

/// Url-safe token alphabet (A-Z a-z 0-9 _ -).
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Generate a fresh [`TOKEN_LEN`]-char url-safe token.
pub fn random_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| {
            let at = rng.random_range(0..TOKEN_ALPHABET.len());
            TOKEN_ALPHABET[at] as char
        })
        .collect()
}

/// True if `value` has the shape of a generated token.
///
/// Ids are opaque, so this is advisory only; storage uses it to call out
/// records whose file names were edited by hand.
pub fn looks_like_token(value: &str) -> bool {
    value.len() == TOKEN_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Clip a display value to at most `max` characters for log lines.
///
/// Clips on character boundaries, so multi-byte text in free-form values
/// (reasoning verdicts, tool output) cannot panic the logger.
pub fn abbrev(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((at, _)) => &text[..at],
        None => text,
    }
}

/// Declare a string-backed identifier type.
///
/// The wrapper serializes transparently as its inner string and exposes
/// only `new`, `as_str`, `abbrev`, `Display`, the `From` conversions, and
/// `&str` comparisons.
///
/// ```ignore
/// string_id! {
///     /// Doc comment for the id type.
///     pub struct MyId;
/// }
/// ```
#[macro_export]
macro_rules! string_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Clip to at most `max` characters for log lines.
            pub fn abbrev(&self, max: usize) -> &str {
                $crate::id::abbrev(&self.0, max)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
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

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
