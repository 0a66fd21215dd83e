//! Case-insensitive name types for nicks and channels.
//!
//! Protocol names compare, order and hash without regard to ASCII case, but
//! keep the casing they were created with for display.

use itertools::{EitherOrBoth, Itertools};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

fn compare_folded(a: &str, b: &str) -> Ordering {
    a.chars()
        .zip_longest(b.chars())
        .map(|ab| match ab {
            EitherOrBoth::Left(_) => Ordering::Greater,
            EitherOrBoth::Right(_) => Ordering::Less,
            EitherOrBoth::Both(a, b) => a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()),
        })
        .find(|&ordering| ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

macro_rules! define_names {
    ( $( $(#[$attr:meta])* $name:ident ),* $(,)? ) => { $(
        $(#[$attr])*
        #[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// The name with its original casing
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The lower-cased form, as used for comparison
            pub fn folded(&self) -> String {
                self.0.to_ascii_lowercase()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.eq_ignore_ascii_case(&other.0)
            }
        }

        impl Eq for $name {}

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.eq_ignore_ascii_case(other)
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0.eq_ignore_ascii_case(other)
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                compare_folded(&self.0, &other.0)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, h: &mut H) {
                for c in self.0.chars() {
                    c.to_ascii_lowercase().hash(h);
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    )* };
}

define_names! {
    /// The display identity of a participant on one connection
    Nickname,
    /// A channel name, including its leading sigil
    ChannelName,
}

/// Whether `target` names a channel rather than a user
pub fn is_channel_name(target: &str) -> bool {
    target.starts_with('#') || target.starts_with('&')
}
