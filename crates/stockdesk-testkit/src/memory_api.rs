// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use stockdesk_app::{
    ApiError, Entity, FormInput, Listing, Mutation, Resource, ResourceApi, pages_for,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    List,
    ListPage,
    Get,
    Create,
    Update,
    Delete,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::ListPage => "list_page",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    List {
        resource: &'static str,
    },
    ListPage {
        resource: &'static str,
        query: Vec<(String, String)>,
    },
    Get {
        resource: &'static str,
        id: i64,
    },
    Create {
        resource: &'static str,
        body: Value,
    },
    Update {
        resource: &'static str,
        id: i64,
        body: Value,
    },
    Delete {
        resource: &'static str,
        id: i64,
    },
}

impl ApiCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::List { .. } => CallKind::List,
            Self::ListPage { .. } => CallKind::ListPage,
            Self::Get { .. } => CallKind::Get,
            Self::Create { .. } => CallKind::Create,
            Self::Update { .. } => CallKind::Update,
            Self::Delete { .. } => CallKind::Delete,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self.kind(),
            CallKind::Create | CallKind::Update | CallKind::Delete
        )
    }
}

/// In-memory stand-in for the REST backend. Records every call, supports
/// failure injection per call kind, and answers list pages either in the
/// paginated shape or, in legacy mode, as a bare array.
#[derive(Debug, Clone)]
pub struct MemoryApi {
    collections: BTreeMap<&'static str, Vec<Value>>,
    paginated: bool,
    failures: Vec<(CallKind, ApiError)>,
    reply_message: Option<String>,
    calls: Vec<ApiCall>,
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self {
            collections: BTreeMap::new(),
            paginated: true,
            failures: Vec::new(),
            reply_message: None,
            calls: Vec::new(),
        }
    }
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `list_page` with a bare array, like the older endpoints.
    pub fn legacy() -> Self {
        Self {
            paginated: false,
            ..Self::default()
        }
    }

    pub fn seed<R: Resource + Serialize>(&mut self, records: &[R]) -> Result<()> {
        let collection = self.collections.entry(R::RESOURCE).or_default();
        for record in records {
            collection.push(serde_json::to_value(record).context("serialize seed record")?);
        }
        Ok(())
    }

    /// Every subsequent call of `kind` fails with `error` until
    /// [`MemoryApi::clear_failures`].
    pub fn fail(&mut self, kind: CallKind, error: ApiError) {
        self.failures.push((kind, error));
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    /// Message returned with successful mutations.
    pub fn reply_with(&mut self, message: &str) {
        self.reply_message = Some(message.to_owned());
    }

    pub fn calls(&self) -> &[ApiCall] {
        &self.calls
    }

    pub fn mutation_count(&self) -> usize {
        self.calls.iter().filter(|call| call.is_mutation()).count()
    }

    pub fn last_call(&self) -> Option<&ApiCall> {
        self.calls.last()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn records(&self, resource: &str) -> &[Value] {
        self.collections
            .get(resource)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn injected(&self, kind: CallKind, resource: &str) -> Result<()> {
        match self.failures.iter().find(|(failing, _)| *failing == kind) {
            Some((_, error)) => {
                Err(anyhow::Error::new(error.clone()).context(format!("{kind} {resource}")))
            }
            None => Ok(()),
        }
    }

    fn position(&self, resource: &str, id: i64) -> Result<usize> {
        self.records(resource)
            .iter()
            .position(|record| record.get("id").and_then(Value::as_i64) == Some(id))
            .ok_or_else(|| {
                anyhow::Error::new(ApiError::Status {
                    code: 404,
                    message: Some(format!("{resource} {id} not found")),
                })
            })
    }

    fn decode<R: Resource>(records: Vec<Value>) -> Result<Vec<R>> {
        records
            .into_iter()
            .map(|record| {
                serde_json::from_value(record)
                    .map_err(|error| anyhow::Error::new(ApiError::Malformed(error.to_string())))
            })
            .collect()
    }

    fn mutation(&self, id: Option<i64>) -> Mutation {
        Mutation {
            id,
            message: self.reply_message.clone(),
        }
    }
}

impl ResourceApi for MemoryApi {
    fn list<R: Resource>(&mut self) -> Result<Vec<R>> {
        self.calls.push(ApiCall::List {
            resource: R::RESOURCE,
        });
        self.injected(CallKind::List, R::RESOURCE)?;
        Self::decode(self.records(R::RESOURCE).to_vec())
    }

    fn list_page<R: Resource>(&mut self, query: &[(String, String)]) -> Result<Listing<R>> {
        self.calls.push(ApiCall::ListPage {
            resource: R::RESOURCE,
            query: query.to_vec(),
        });
        self.injected(CallKind::ListPage, R::RESOURCE)?;

        let mut page = 1_usize;
        let mut page_size = usize::MAX;
        let mut filters = Vec::new();
        for (key, value) in query {
            match key.as_str() {
                "page" => page = value.parse().unwrap_or(1),
                "page_size" => page_size = value.parse().unwrap_or(usize::MAX),
                _ => filters.push((key.as_str(), value.as_str())),
            }
        }

        let matching: Vec<Value> = self
            .records(R::RESOURCE)
            .iter()
            .filter(|record| {
                filters
                    .iter()
                    .all(|(key, value)| record_matches(record, key, value))
            })
            .cloned()
            .collect();
        if !self.paginated {
            return Self::decode(matching).map(Listing::Flat);
        }

        let count = matching.len() as u64;
        let size = page_size.max(1);
        let results = matching
            .into_iter()
            .skip(page.saturating_sub(1).saturating_mul(size))
            .take(size)
            .collect();
        let total_pages = u32::try_from(size).ok().map(|size| pages_for(count, size));
        Ok(Listing::Paged {
            count,
            total_pages,
            results: Self::decode(results)?,
        })
    }

    fn get<E: Entity>(&mut self, id: E::Id) -> Result<E> {
        let id: i64 = id.into();
        self.calls.push(ApiCall::Get {
            resource: E::RESOURCE,
            id,
        });
        self.injected(CallKind::Get, E::RESOURCE)?;
        let index = self.position(E::RESOURCE, id)?;
        let record = self.records(E::RESOURCE)[index].clone();
        serde_json::from_value(record)
            .map_err(|error| anyhow::Error::new(ApiError::Malformed(error.to_string())))
    }

    fn create<E: Entity>(&mut self, input: &E::Input) -> Result<Mutation> {
        let body = to_body(input)?;
        self.calls.push(ApiCall::Create {
            resource: E::RESOURCE,
            body: body.clone(),
        });
        self.injected(CallKind::Create, E::RESOURCE)?;

        let id = self
            .records(E::RESOURCE)
            .iter()
            .filter_map(|record| record.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;
        let mut record = Map::new();
        record.insert("id".to_owned(), Value::from(id));
        merge(&mut record, body);
        self.collections
            .entry(E::RESOURCE)
            .or_default()
            .push(Value::Object(record));
        Ok(self.mutation(Some(id)))
    }

    fn update<E: Entity>(&mut self, id: E::Id, input: &E::Input) -> Result<Mutation> {
        let id: i64 = id.into();
        let body = to_body(input)?;
        self.calls.push(ApiCall::Update {
            resource: E::RESOURCE,
            id,
            body: body.clone(),
        });
        self.injected(CallKind::Update, E::RESOURCE)?;

        let index = self.position(E::RESOURCE, id)?;
        if let Some(Value::Object(record)) = self
            .collections
            .get_mut(E::RESOURCE)
            .and_then(|records| records.get_mut(index))
        {
            merge(record, body);
        }
        Ok(self.mutation(Some(id)))
    }

    fn delete<E: Entity>(&mut self, id: E::Id) -> Result<Mutation> {
        let id: i64 = id.into();
        self.calls.push(ApiCall::Delete {
            resource: E::RESOURCE,
            id,
        });
        self.injected(CallKind::Delete, E::RESOURCE)?;

        let index = self.position(E::RESOURCE, id)?;
        if let Some(records) = self.collections.get_mut(E::RESOURCE) {
            records.remove(index);
        }
        Ok(self.mutation(None))
    }
}

fn to_body<I: FormInput>(input: &I) -> Result<Value> {
    serde_json::to_value(input).context("serialize request body")
}

/// Copies the body's fields into a stored record. Passwords are write-only.
fn merge(record: &mut Map<String, Value>, body: Value) {
    if let Value::Object(fields) = body {
        for (key, value) in fields {
            if key != "password" {
                record.insert(key, value);
            }
        }
    }
}

fn record_matches(record: &Value, key: &str, needle: &str) -> bool {
    if key == "status" {
        let active = record
            .get("is_active")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        return match needle {
            "active" => active,
            "inactive" => !active,
            _ => false,
        };
    }
    record
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase()))
}
