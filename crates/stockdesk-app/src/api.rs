// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use serde::de::DeserializeOwned;
use std::fmt;
use time::macros::format_description;

use crate::{
    Department, FormInput, FormValues, Organization, Packaging, PackagingInput, Position,
    ProductModel, ProductModelInput, ReferenceData, User, UserInput, ViewKind, WaterRate,
    WaterRateInput, format_decimal,
};

/// Anything the backend exposes as a collection under `/api/<RESOURCE>/`.
pub trait Resource: DeserializeOwned {
    const RESOURCE: &'static str;
}

/// A resource the console can list, edit and delete.
pub trait Entity: Resource + Clone + fmt::Debug {
    type Id: Copy + Ord + fmt::Debug + fmt::Display + From<i64> + Into<i64>;
    type Input: FormInput;

    const VIEW: ViewKind;
    const NOUN: &'static str;
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Self::Id;

    /// Field values that reproduce this record in its edit form.
    fn form_values(&self) -> FormValues;

    fn cells(&self, refs: &ReferenceData) -> Vec<String>;
}

/// Collection payload. Older endpoints return a bare array.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<T> {
    Paged {
        count: u64,
        total_pages: Option<u32>,
        results: Vec<T>,
    },
    Flat(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_records(self) -> Vec<T> {
        match self {
            Self::Paged { results, .. } => results,
            Self::Flat(records) => records,
        }
    }
}

/// Outcome of a successful create/update/delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutation {
    pub id: Option<i64>,
    pub message: Option<String>,
}

/// The REST collaborator as the controllers see it.
pub trait ResourceApi {
    fn list<R: Resource>(&mut self) -> Result<Vec<R>>;

    fn list_page<R: Resource>(&mut self, query: &[(String, String)]) -> Result<Listing<R>>;

    fn get<E: Entity>(&mut self, id: E::Id) -> Result<E>;

    fn create<E: Entity>(&mut self, input: &E::Input) -> Result<Mutation>;

    fn update<E: Entity>(&mut self, id: E::Id, input: &E::Input) -> Result<Mutation>;

    fn delete<E: Entity>(&mut self, id: E::Id) -> Result<Mutation>;
}

impl Resource for Department {
    const RESOURCE: &'static str = "departments";
}

impl Resource for Position {
    const RESOURCE: &'static str = "positions";
}

impl Resource for Organization {
    const RESOURCE: &'static str = "organizations";
}

impl Resource for Packaging {
    const RESOURCE: &'static str = ViewKind::Packaging.resource();
}

impl Resource for ProductModel {
    const RESOURCE: &'static str = ViewKind::ProductModels.resource();
}

impl Resource for WaterRate {
    const RESOURCE: &'static str = ViewKind::WaterRates.resource();
}

impl Resource for User {
    const RESOURCE: &'static str = ViewKind::Users.resource();
}

fn optional_id<T: fmt::Display>(id: Option<T>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

impl Entity for Packaging {
    type Id = crate::PackagingId;
    type Input = PackagingInput;

    const VIEW: ViewKind = ViewKind::Packaging;
    const NOUN: &'static str = "packaging";
    const COLUMNS: &'static [&'static str] =
        &["ID", "Name", "Specification", "Weight (kg)", "Description"];

    fn id(&self) -> Self::Id {
        self.id
    }

    fn form_values(&self) -> FormValues {
        FormValues::from_pairs([
            ("name", self.name.clone()),
            ("specification", self.specification.clone()),
            (
                "weight_kg",
                self.weight_kg.map(format_decimal).unwrap_or_default(),
            ),
            ("description", self.description.clone()),
        ])
    }

    fn cells(&self, _refs: &ReferenceData) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.specification.clone(),
            self.weight_kg.map(format_decimal).unwrap_or_default(),
            self.description.clone(),
        ]
    }
}

impl Entity for ProductModel {
    type Id = crate::ProductModelId;
    type Input = ProductModelInput;

    const VIEW: ViewKind = ViewKind::ProductModels;
    const NOUN: &'static str = "product model";
    const COLUMNS: &'static [&'static str] = &["ID", "Name", "Code", "Organization", "Description"];

    fn id(&self) -> Self::Id {
        self.id
    }

    fn form_values(&self) -> FormValues {
        FormValues::from_pairs([
            ("name", self.name.clone()),
            ("code", self.code.clone()),
            ("organization", optional_id(self.organization)),
            ("description", self.description.clone()),
        ])
    }

    fn cells(&self, refs: &ReferenceData) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.code.clone(),
            refs.organization_label(self.organization).to_owned(),
            self.description.clone(),
        ]
    }
}

impl Entity for WaterRate {
    type Id = crate::WaterRateId;
    type Input = WaterRateInput;

    const VIEW: ViewKind = ViewKind::WaterRates;
    const NOUN: &'static str = "deduction rate";
    const COLUMNS: &'static [&'static str] = &["ID", "Name", "Rate", "Organization", "Description"];

    fn id(&self) -> Self::Id {
        self.id
    }

    fn form_values(&self) -> FormValues {
        FormValues::from_pairs([
            ("name", self.name.clone()),
            ("rate", format_decimal(self.rate)),
            ("organization", optional_id(self.organization)),
            ("description", self.description.clone()),
        ])
    }

    fn cells(&self, refs: &ReferenceData) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            format!("{}%", format_decimal(self.rate)),
            refs.organization_label(self.organization).to_owned(),
            self.description.clone(),
        ]
    }
}

impl Entity for User {
    type Id = crate::UserId;
    type Input = UserInput;

    const VIEW: ViewKind = ViewKind::Users;
    const NOUN: &'static str = "user";
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Username",
        "Name",
        "Email",
        "Department",
        "Position",
        "Status",
        "Joined",
    ];

    fn id(&self) -> Self::Id {
        self.id
    }

    fn form_values(&self) -> FormValues {
        FormValues::from_pairs([
            ("username", self.username.clone()),
            ("first_name", self.first_name.clone().unwrap_or_default()),
            ("last_name", self.last_name.clone().unwrap_or_default()),
            ("email", self.email.clone().unwrap_or_default()),
            ("department", optional_id(self.department)),
            ("position", optional_id(self.position)),
            (
                "is_active",
                if self.is_active { "yes" } else { "no" }.to_owned(),
            ),
            ("password", String::new()),
        ])
    }

    fn cells(&self, refs: &ReferenceData) -> Vec<String> {
        let joined = self
            .date_joined
            .and_then(|joined| {
                joined
                    .date()
                    .format(format_description!("[year]-[month]-[day]"))
                    .ok()
            })
            .unwrap_or_default();
        vec![
            self.id.to_string(),
            self.username.clone(),
            self.display_name(),
            self.email.clone().unwrap_or_default(),
            refs.department_label(self.department).to_owned(),
            refs.position_label(self.position).to_owned(),
            self.status().as_str().to_owned(),
            joined,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::Entity;
    use crate::{
        Department, DepartmentId, FormInput, FormMode, ReferenceData, User, UserId, WaterRate,
        WaterRateId, WaterRateInput,
    };

    #[test]
    fn user_cells_never_show_missing_markers() {
        let user = User {
            id: UserId::new(9),
            username: "sun".to_owned(),
            first_name: None,
            last_name: Some("Sun".to_owned()),
            email: None,
            department: Some(DepartmentId::new(1)),
            position: None,
            is_active: false,
            date_joined: None,
        };
        let refs = ReferenceData::new(
            vec![Department {
                id: DepartmentId::new(1),
                name: "QA".to_owned(),
            }],
            Vec::new(),
            Vec::new(),
        );
        let cells = user.cells(&refs);
        assert_eq!(cells.len(), User::COLUMNS.len());
        assert_eq!(cells[2], "Sun");
        assert_eq!(cells[4], "QA");
        assert_eq!(cells[5], "");
        assert_eq!(cells[6], "inactive");
        for cell in cells {
            assert!(!cell.contains("undefined") && !cell.contains("null"));
        }
    }

    #[test]
    fn rate_form_values_parse_back_to_same_input() {
        let rate = WaterRate {
            id: WaterRateId::new(1),
            name: "Spring".to_owned(),
            rate: 55.5,
            organization: None,
            description: "wet season".to_owned(),
        };
        let input = WaterRateInput::parse(&rate.form_values(), FormMode::Update)
            .expect("form values should validate");
        assert_eq!(input.rate, 55.5);
        assert_eq!(input.name, "Spring");
        assert_eq!(input.organization, None);
    }
}
