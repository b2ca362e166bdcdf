//! Newtypes for seller, owner-account and product identifiers.
//!
//! All three wrap a `NonZeroU64`: the upstream store encodes "no owner" as `0`
//! or `null`, and an allocation must never emit either. Zero is rejected at
//! construction, at parse time, and during deserialization.

use core::fmt;
use core::num::NonZeroU64;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

macro_rules! def_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "u64", into = "u64"))]
        pub struct $name(NonZeroU64);

        impl $name {
            pub fn new(raw: u64) -> Result<Self, CoreError> {
                NonZeroU64::new(raw)
                    .map(Self)
                    .ok_or_else(|| CoreError::InvalidId(format!("{}: 0", stringify!($name))))
            }

            #[inline]
            pub const fn from_nonzero(raw: NonZeroU64) -> Self { Self(raw) }

            #[inline]
            pub fn get(self) -> u64 { self.0.get() }
        }

        impl TryFrom<u64> for $name {
            type Error = CoreError;
            fn try_from(raw: u64) -> Result<Self, Self::Error> { Self::new(raw) }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 { id.get() }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| CoreError::InvalidId(format!("{}: {s:?}", stringify!($name))))?;
                Self::new(raw)
            }
        }
    };
}

def_id!(
    /// Surrogate key of a storefront (display identity).
    SellerId
);
def_id!(
    /// Identity of the account that controls a storefront; the allocation target.
    OwnerId
);
def_id!(ProductId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected_everywhere() {
        assert!(OwnerId::new(0).is_err());
        assert!("0".parse::<ProductId>().is_err());
        assert!(SellerId::try_from(0u64).is_err());
    }

    #[test]
    fn parse_and_display_round_trip() {
        let id: OwnerId = " 42 ".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_zero_id() {
        let ok: OwnerId = serde_json::from_str("7").unwrap();
        assert_eq!(ok.get(), 7);
        assert!(serde_json::from_str::<OwnerId>("0").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "7");
    }
}
