//! Identifier types for the ledger
//!
//! Every entity is keyed by an opaque UUIDv4 wrapped in its own newtype, so an
//! account id can never be passed where a user id is expected.
//!
//! `AccountId` ordering doubles as the global lock order used by transfers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }
    };
}

opaque_id!(
    /// Account identifier, assigned when the account is opened
    AccountId
);

opaque_id!(
    /// User identifier, assigned at registration
    UserId
);

opaque_id!(
    /// Identifier of a single transaction record
    TransactionId
);

opaque_id!(
    /// Logical transfer identifier shared by both legs of a transfer
    TransferId
);
