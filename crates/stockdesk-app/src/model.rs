// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    Packaging,
    ProductModels,
    WaterRates,
    Users,
}

impl ViewKind {
    pub const ALL: [Self; 4] = [
        Self::Packaging,
        Self::ProductModels,
        Self::WaterRates,
        Self::Users,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Packaging => "Packaging",
            Self::ProductModels => "Product models",
            Self::WaterRates => "Water deduction",
            Self::Users => "Users",
        }
    }

    /// Path segment under `/api/` for the view's primary collection.
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Packaging => "packaging",
            Self::ProductModels => "product-models",
            Self::WaterRates => "water-deduction-rates",
            Self::Users => "users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "1" | "true" => Some(Self::Active),
            "inactive" | "0" | "false" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub const fn from_flag(active: bool) -> Self {
        if active { Self::Active } else { Self::Inactive }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packaging {
    pub id: PackagingId,
    pub name: String,
    #[serde(default)]
    pub specification: String,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductModel {
    pub id: ProductModelId,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub organization: Option<OrganizationId>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterRate {
    pub id: WaterRateId,
    pub name: String,
    pub rate: f64,
    #[serde(default)]
    pub organization: Option<OrganizationId>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<DepartmentId>,
    #[serde(default)]
    pub position: Option<PositionId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, with = "rfc3339_opt")]
    pub date_joined: Option<OffsetDateTime>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub const fn status(&self) -> UserStatus {
        UserStatus::from_flag(self.is_active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
}

mod rfc3339_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub fn serialize<S: Serializer>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => {
                let raw = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&raw)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => OffsetDateTime::parse(value, &Rfc3339)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

pub fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserStatus, ViewKind, format_decimal};
    use crate::UserId;

    fn user(first: Option<&str>, last: Option<&str>) -> User {
        User {
            id: UserId::new(1),
            username: "jli".to_owned(),
            first_name: first.map(str::to_owned),
            last_name: last.map(str::to_owned),
            email: None,
            department: None,
            position: None,
            is_active: true,
            date_joined: None,
        }
    }

    #[test]
    fn display_name_skips_missing_parts() {
        assert_eq!(user(Some("Li"), Some("Jun")).display_name(), "Li Jun");
        assert_eq!(user(None, Some("Jun")).display_name(), "Jun");
        assert_eq!(user(Some(" Li "), Some("")).display_name(), "Li");
        assert_eq!(user(None, None).display_name(), "");
    }

    #[test]
    fn user_decodes_with_missing_optional_fields() {
        let parsed: User = serde_json::from_str(
            r#"{"id":3,"username":"wang","email":null,"date_joined":"2026-03-01T08:00:00Z"}"#,
        )
        .expect("decode user");
        assert!(parsed.is_active);
        assert_eq!(parsed.email, None);
        assert!(parsed.date_joined.is_some());
    }

    #[test]
    fn status_parse_accepts_flags() {
        assert_eq!(UserStatus::parse("Active"), Some(UserStatus::Active));
        assert_eq!(UserStatus::parse("0"), Some(UserStatus::Inactive));
        assert_eq!(UserStatus::parse("maybe"), None);
    }

    #[test]
    fn every_view_has_a_resource_path() {
        for view in ViewKind::ALL {
            assert!(!view.resource().is_empty());
            assert!(!view.resource().contains('/'));
        }
    }

    #[test]
    fn decimals_drop_trailing_zero_fraction() {
        assert_eq!(format_decimal(55.5), "55.5");
        assert_eq!(format_decimal(12.0), "12");
    }
}
