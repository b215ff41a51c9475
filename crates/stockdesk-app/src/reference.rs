// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::{
    Department, DepartmentId, Notice, Organization, OrganizationId, Position, PositionId,
    ResourceApi, Surface,
};

/// Lookup tables fetched once per console session. Nothing mutates them
/// after bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    departments: BTreeMap<DepartmentId, Department>,
    positions: BTreeMap<PositionId, Position>,
    organizations: BTreeMap<OrganizationId, Organization>,
}

impl ReferenceData {
    pub fn new(
        departments: Vec<Department>,
        positions: Vec<Position>,
        organizations: Vec<Organization>,
    ) -> Self {
        Self {
            departments: departments.into_iter().map(|d| (d.id, d)).collect(),
            positions: positions.into_iter().map(|p| (p.id, p)).collect(),
            organizations: organizations.into_iter().map(|o| (o.id, o)).collect(),
        }
    }

    /// Fetches every collection. A collection that fails to load is left
    /// empty and reported once; the remaining collections still load.
    pub fn bootstrap<A: ResourceApi, S: Surface>(api: &mut A, surface: &mut S) -> Self {
        let mut failed = Vec::new();

        let departments = api.list::<Department>().unwrap_or_else(|error| {
            tracing::warn!(%error, "load departments failed");
            failed.push("departments");
            Vec::new()
        });
        let positions = api.list::<Position>().unwrap_or_else(|error| {
            tracing::warn!(%error, "load positions failed");
            failed.push("positions");
            Vec::new()
        });
        let organizations = api.list::<Organization>().unwrap_or_else(|error| {
            tracing::warn!(%error, "load organizations failed");
            failed.push("organizations");
            Vec::new()
        });

        if !failed.is_empty() {
            surface.notify(
                Notice::Warning,
                &format!("could not load {}; labels may be blank", failed.join(", ")),
            );
        }

        let data = Self::new(departments, positions, organizations);
        tracing::info!(
            departments = data.departments.len(),
            positions = data.positions.len(),
            organizations = data.organizations.len(),
            "reference data loaded"
        );
        data
    }

    pub fn department_label(&self, id: Option<DepartmentId>) -> &str {
        id.and_then(|id| self.departments.get(&id))
            .map_or("", |d| d.name.as_str())
    }

    pub fn position_label(&self, id: Option<PositionId>) -> &str {
        id.and_then(|id| self.positions.get(&id))
            .map_or("", |p| p.name.as_str())
    }

    pub fn organization_label(&self, id: Option<OrganizationId>) -> &str {
        id.and_then(|id| self.organizations.get(&id))
            .map_or("", |o| o.name.as_str())
    }

    pub fn departments(&self) -> impl Iterator<Item = &Department> {
        self.departments.values()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn organizations(&self) -> impl Iterator<Item = &Organization> {
        self.organizations.values()
    }
}

#[cfg(test)]
mod tests {
    use super::ReferenceData;
    use crate::{Department, DepartmentId, OrganizationId, PositionId};

    #[test]
    fn labels_resolve_by_id_and_blank_otherwise() {
        let refs = ReferenceData::new(
            vec![Department {
                id: DepartmentId::new(2),
                name: "Warehouse".to_owned(),
            }],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(refs.department_label(Some(DepartmentId::new(2))), "Warehouse");
        assert_eq!(refs.department_label(Some(DepartmentId::new(9))), "");
        assert_eq!(refs.department_label(None), "");
        assert_eq!(refs.position_label(Some(PositionId::new(1))), "");
        assert_eq!(refs.organization_label(Some(OrganizationId::new(1))), "");
    }
}
