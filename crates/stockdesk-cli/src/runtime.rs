// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use stockdesk_api::Client;
use stockdesk_app::{Entity, Listing, Mutation, Resource, ResourceApi};

/// Routes controller calls to the REST client by resource name.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl ResourceApi for HttpRuntime {
    fn list<R: Resource>(&mut self) -> Result<Vec<R>> {
        self.client.list(R::RESOURCE)
    }

    fn list_page<R: Resource>(&mut self, query: &[(String, String)]) -> Result<Listing<R>> {
        self.client.list_page(R::RESOURCE, query)
    }

    fn get<E: Entity>(&mut self, id: E::Id) -> Result<E> {
        self.client.get(E::RESOURCE, id.into())
    }

    fn create<E: Entity>(&mut self, input: &E::Input) -> Result<Mutation> {
        self.client.create(E::RESOURCE, input)
    }

    fn update<E: Entity>(&mut self, id: E::Id, input: &E::Input) -> Result<Mutation> {
        self.client.update(E::RESOURCE, id.into(), input)
    }

    fn delete<E: Entity>(&mut self, id: E::Id) -> Result<Mutation> {
        self.client.delete(E::RESOURCE, id.into())
    }
}
