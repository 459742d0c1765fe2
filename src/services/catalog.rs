//! Catalog service for lendable items

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::item::{CreateItem, Item, NewItem, UpdateItem},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Every item in creation order
    pub async fn list_all(&self) -> AppResult<Vec<Item>> {
        self.repository.catalog.list().await
    }

    pub async fn add(&self, request: CreateItem) -> AppResult<Item> {
        let item = NewItem::try_from(request)?;
        let created = self.repository.catalog.insert(&item).await?;
        tracing::info!("Added item {} ({} copies)", created.id, created.available_copies);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, changes: UpdateItem) -> AppResult<Item> {
        validator::Validate::validate(&changes)?;
        let updated = self.repository.catalog.update(id, &changes).await?;
        tracing::info!("Updated item {}", id);
        Ok(updated)
    }

    /// Remove an item and return it. Past loans keep referring to it.
    pub async fn delete(&self, id: Uuid) -> AppResult<Item> {
        let deleted = self.repository.catalog.delete(id).await?;
        tracing::info!("Deleted item {}", id);
        Ok(deleted)
    }
}
