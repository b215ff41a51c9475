// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{DepartmentId, OrganizationId, PositionId, ValidationError, parse_optional_id};

macro_rules! reject {
    ($($arg:tt)*) => {
        return Err(anyhow::Error::new(ValidationError::new(format!($($arg)*))))
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
}

const fn field(key: &'static str, label: &'static str, required: bool) -> FormField {
    FormField {
        key,
        label,
        required,
    }
}

/// Raw field values as typed into a form, keyed by field key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map_or("", String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn trimmed(&self, key: &str) -> String {
        self.get(key).trim().to_owned()
    }
}

pub trait FormInput: Serialize + Sized {
    const FIELDS: &'static [FormField];

    fn from_values(values: &FormValues) -> Result<Self>;

    fn validate(&self, mode: FormMode) -> Result<()>;

    /// Parses and validates in one step; every failure is a `ValidationError`.
    fn parse(values: &FormValues, mode: FormMode) -> Result<Self> {
        let input = Self::from_values(values)?;
        input.validate(mode)?;
        Ok(input)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackagingInput {
    pub name: String,
    pub specification: String,
    pub weight_kg: Option<f64>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductModelInput {
    pub name: String,
    pub code: String,
    pub organization: Option<OrganizationId>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterRateInput {
    pub name: String,
    pub rate: f64,
    pub organization: Option<OrganizationId>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: Option<DepartmentId>,
    pub position: Option<PositionId>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl FormInput for PackagingInput {
    const FIELDS: &'static [FormField] = &[
        field("name", "Name", true),
        field("specification", "Specification", false),
        field("weight_kg", "Weight (kg)", false),
        field("description", "Description", false),
    ];

    fn from_values(values: &FormValues) -> Result<Self> {
        let weight_kg = match values.get("weight_kg").trim() {
            "" => None,
            raw => match raw.parse::<f64>() {
                Ok(weight) => Some(weight),
                Err(_) => reject!("weight must be a number, got {raw:?}"),
            },
        };
        Ok(Self {
            name: values.trimmed("name"),
            specification: values.trimmed("specification"),
            weight_kg,
            description: values.trimmed("description"),
        })
    }

    fn validate(&self, _mode: FormMode) -> Result<()> {
        if self.name.is_empty() {
            reject!("packaging name is required -- enter a name and retry");
        }
        if let Some(weight) = self.weight_kg
            && (!weight.is_finite() || weight < 0.0)
        {
            reject!("packaging weight cannot be negative");
        }
        Ok(())
    }
}

impl FormInput for ProductModelInput {
    const FIELDS: &'static [FormField] = &[
        field("name", "Name", true),
        field("code", "Code", false),
        field("organization", "Organization id", false),
        field("description", "Description", false),
    ];

    fn from_values(values: &FormValues) -> Result<Self> {
        Ok(Self {
            name: values.trimmed("name"),
            code: values.trimmed("code"),
            organization: optional_id(values, "organization")?,
            description: values.trimmed("description"),
        })
    }

    fn validate(&self, _mode: FormMode) -> Result<()> {
        if self.name.is_empty() {
            reject!("product model name is required -- enter a name and retry");
        }
        Ok(())
    }
}

impl FormInput for WaterRateInput {
    const FIELDS: &'static [FormField] = &[
        field("name", "Name", true),
        field("rate", "Rate (%)", true),
        field("organization", "Organization id", false),
        field("description", "Description", false),
    ];

    fn from_values(values: &FormValues) -> Result<Self> {
        let rate = match values.get("rate").trim() {
            "" => reject!("deduction rate is required -- enter a percentage and retry"),
            raw => match raw.parse::<f64>() {
                Ok(rate) => rate,
                Err(_) => reject!("deduction rate must be a number, got {raw:?}"),
            },
        };
        Ok(Self {
            name: values.trimmed("name"),
            rate,
            organization: optional_id(values, "organization")?,
            description: values.trimmed("description"),
        })
    }

    fn validate(&self, _mode: FormMode) -> Result<()> {
        if self.name.is_empty() {
            reject!("rate name is required -- enter a name and retry");
        }
        if !self.rate.is_finite() || !(0.0..=100.0).contains(&self.rate) {
            reject!("deduction rate must be between 0 and 100");
        }
        Ok(())
    }
}

impl FormInput for UserInput {
    const FIELDS: &'static [FormField] = &[
        field("username", "Username", true),
        field("first_name", "First name", false),
        field("last_name", "Last name", false),
        field("email", "Email", false),
        field("department", "Department id", false),
        field("position", "Position id", false),
        field("is_active", "Active (yes/no)", false),
        field("password", "Password", false),
    ];

    fn from_values(values: &FormValues) -> Result<Self> {
        let is_active = match values.get("is_active").trim().to_ascii_lowercase().as_str() {
            "" | "true" | "1" | "yes" | "y" => true,
            "false" | "0" | "no" | "n" => false,
            other => reject!("active must be yes or no, got {other:?}"),
        };
        let password = values.get("password");
        Ok(Self {
            username: values.trimmed("username"),
            first_name: values.trimmed("first_name"),
            last_name: values.trimmed("last_name"),
            email: values.trimmed("email"),
            department: optional_id(values, "department")?,
            position: optional_id(values, "position")?,
            is_active,
            password: (!password.is_empty()).then(|| password.to_owned()),
        })
    }

    fn validate(&self, mode: FormMode) -> Result<()> {
        if self.username.is_empty() {
            reject!("username is required -- enter a username and retry");
        }
        if !self.email.is_empty() && !self.email.contains('@') {
            reject!("email {:?} is not an address", self.email);
        }
        if mode == FormMode::Create && self.password.is_none() {
            reject!("password is required for new users");
        }
        Ok(())
    }
}

fn optional_id<T: From<i64>>(values: &FormValues, key: &str) -> Result<Option<T>> {
    match parse_optional_id(values.get(key)) {
        None => Ok(None),
        Some(Ok(id)) => Ok(Some(id)),
        Some(Err(message)) => reject!("{key}: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FormInput, FormMode, FormValues, PackagingInput, ProductModelInput, UserInput,
        WaterRateInput,
    };
    use crate::{OrganizationId, ValidationError};

    fn rate_form(rate: &str) -> FormValues {
        FormValues::from_pairs([("name", "Summer"), ("rate", rate)])
    }

    #[test]
    fn rate_outside_percentage_bounds_is_rejected() {
        let error = WaterRateInput::parse(&rate_form("150"), FormMode::Create)
            .expect_err("150 should be rejected");
        assert!(error.downcast_ref::<ValidationError>().is_some());
        assert!(error.to_string().contains("between 0 and 100"));
        assert!(WaterRateInput::parse(&rate_form("-0.5"), FormMode::Create).is_err());
    }

    #[test]
    fn fractional_rate_within_bounds_is_accepted() {
        let input = WaterRateInput::parse(&rate_form("55.5"), FormMode::Create)
            .expect("55.5 should be accepted");
        assert_eq!(input.rate, 55.5);
        assert!(WaterRateInput::parse(&rate_form("0"), FormMode::Create).is_ok());
        assert!(WaterRateInput::parse(&rate_form("100"), FormMode::Create).is_ok());
    }

    #[test]
    fn non_numeric_rate_is_a_validation_error() {
        let error = WaterRateInput::parse(&rate_form("abc"), FormMode::Create)
            .expect_err("text rate should fail");
        assert!(error.downcast_ref::<ValidationError>().is_some());
    }

    #[test]
    fn blank_names_are_rejected() {
        let blank = FormValues::from_pairs([("name", "   ")]);
        assert!(PackagingInput::parse(&blank, FormMode::Create).is_err());
        assert!(ProductModelInput::parse(&blank, FormMode::Update).is_err());
    }

    #[test]
    fn select_values_parse_into_ids() {
        let values = FormValues::from_pairs([("name", "PM-1"), ("organization", "4")]);
        let input = ProductModelInput::parse(&values, FormMode::Create).expect("valid input");
        assert_eq!(input.organization, Some(OrganizationId::new(4)));

        let bad = FormValues::from_pairs([("name", "PM-1"), ("organization", "four")]);
        assert!(ProductModelInput::parse(&bad, FormMode::Create).is_err());
    }

    #[test]
    fn user_password_required_only_when_creating() {
        let values = FormValues::from_pairs([("username", "zhao"), ("email", "zhao@corp.cn")]);
        assert!(UserInput::parse(&values, FormMode::Create).is_err());
        let input = UserInput::parse(&values, FormMode::Update).expect("update without password");
        assert!(input.password.is_none());
        let body = serde_json::to_value(&input).expect("serialize");
        assert!(body.get("password").is_none());
    }

    #[test]
    fn user_email_must_look_like_an_address() {
        let values = FormValues::from_pairs([
            ("username", "zhao"),
            ("email", "not-an-email"),
            ("password", "secret"),
        ]);
        assert!(UserInput::parse(&values, FormMode::Create).is_err());
    }
}
