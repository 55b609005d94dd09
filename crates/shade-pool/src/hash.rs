//! hashing primitives and 32-byte identifier newtypes

use crate::{EMPTY_LEAF_DOMAIN, NODE_DOMAIN};

/// 32-byte hash
pub type Hash = [u8; 32];

/// interior node of the commitment tree
///
/// the level is mixed in so a subtree root can never be replayed as a
/// node of a different height
pub fn hash_node(level: u8, left: &Hash, right: &Hash) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(&[level]);
    hasher.update(left);
    hasher.update(right);
    *hasher.finalize().as_bytes()
}

/// canonical value of an unfilled leaf slot
pub fn empty_leaf() -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(EMPTY_LEAF_DOMAIN);
    *hasher.finalize().as_bytes()
}

/// declares a `[u8; 32]` newtype with hex display/parse and hex serde
macro_rules! hash_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub $crate::hash::Hash);

        impl $name {
            pub const fn from_bytes(bytes: $crate::hash::Hash) -> Self {
                Self(bytes)
            }

            pub const fn to_bytes(&self) -> $crate::hash::Hash {
                self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<$crate::hash::Hash> for $name {
            fn from(bytes: $crate::hash::Hash) -> Self {
                Self(bytes)
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..6]))
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl core::str::FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(s, &mut bytes)?;
                Ok(Self(bytes))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use hash_newtype;
