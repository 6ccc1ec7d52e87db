//! Local list of products queued for one bulk import.

use shared::{
    error::ApiError,
    protocol::{Product, ProductInput},
};
use uuid::Uuid;

use crate::catalog::ProductCatalog;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub temp_id: Uuid,
    pub input: ProductInput,
}

#[derive(Debug, Clone, Default)]
pub struct BulkDraftList {
    drafts: Vec<ProductDraft>,
}

impl BulkDraftList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drafts(&self) -> &[ProductDraft] {
        &self.drafts
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn add(&mut self, input: ProductInput) -> Uuid {
        let temp_id = Uuid::new_v4();
        self.drafts.push(ProductDraft { temp_id, input });
        temp_id
    }

    /// Returns false when no draft has `temp_id`.
    pub fn replace(&mut self, temp_id: Uuid, input: ProductInput) -> bool {
        match self.drafts.iter_mut().find(|d| d.temp_id == temp_id) {
            Some(draft) => {
                draft.input = input;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, temp_id: Uuid) -> bool {
        let before = self.drafts.len();
        self.drafts.retain(|d| d.temp_id != temp_id);
        self.drafts.len() != before
    }

    pub fn clear(&mut self) {
        self.drafts.clear();
    }

    /// Sends every draft in one bulk-create call. The list is kept on failure.
    pub async fn submit(&mut self, catalog: &ProductCatalog) -> Result<Vec<Product>, ApiError> {
        if self.drafts.is_empty() {
            return Err(ApiError::validation("add at least one product before submitting"));
        }
        let inputs = self.drafts.iter().map(|d| d.input.clone()).collect();
        let created = catalog.create_bulk(inputs).await?;
        self.drafts.clear();
        Ok(created)
    }
}
