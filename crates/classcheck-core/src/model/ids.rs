// ── Identity types ──
//
// The service hands out auto-increment integer keys. Each entity gets its
// own newtype so a poll id can never be passed where a student id belongs.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

integer_id!(
    /// Roster entry key.
    StudentId
);
integer_id!(
    /// Attendance poll key.
    PollId
);
integer_id!(
    /// Attendance record key.
    RecordId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_and_display() {
        let id: StudentId = " 42 ".parse().unwrap();
        assert_eq!(id, StudentId::new(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<PollId>().is_err());
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&PollId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
