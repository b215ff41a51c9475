// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(PackagingId);
entity_id!(ProductModelId);
entity_id!(WaterRateId);
entity_id!(UserId);
entity_id!(DepartmentId);
entity_id!(PositionId);
entity_id!(OrganizationId);

/// Parses an optional id from a select-style form value; blank means unset.
pub fn parse_optional_id<T: From<i64>>(raw: &str) -> Option<std::result::Result<T, String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        trimmed
            .parse::<i64>()
            .map(T::from)
            .map_err(|_| format!("{trimmed:?} is not a valid id")),
    )
}

#[cfg(test)]
mod tests {
    use super::{OrganizationId, UserId, parse_optional_id};

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&UserId::new(42)).expect("serialize id");
        assert_eq!(json, "42");
        let parsed: UserId = serde_json::from_str("7").expect("deserialize id");
        assert_eq!(parsed.get(), 7);
    }

    #[test]
    fn optional_id_parsing_treats_blank_as_unset() {
        assert!(parse_optional_id::<OrganizationId>("  ").is_none());
        assert_eq!(
            parse_optional_id::<OrganizationId>("3"),
            Some(Ok(OrganizationId::new(3)))
        );
        assert!(matches!(
            parse_optional_id::<OrganizationId>("x"),
            Some(Err(_))
        ));
    }
}
