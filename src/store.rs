// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Landing persistence.
//!
//! Handlers only see the [`LandingStore`] trait. [`InMemoryLandingStore`] is
//! the implementation the service runs with; records live for the lifetime
//! of the process.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::models::{format_revision_id, Landing, LandingStatus, NewLanding};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("landing {0} not found")]
    NotFound(u64),

    #[error("no landing for transplant request {0}")]
    RequestNotFound(u64),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) | StoreError::RequestNotFound(_) => ApiError::not_found(
                "Landing not found",
                "The requested Landing does not exist",
            ),
        }
    }
}

#[async_trait]
pub trait LandingStore: Send + Sync {
    /// Persist a new landing in the `submitted` state.
    async fn create(&self, landing: NewLanding) -> Result<Landing, StoreError>;

    async fn get(&self, id: u64) -> Result<Option<Landing>, StoreError>;

    /// Landings ordered by id, optionally filtered by revision and status.
    async fn list(
        &self,
        revision_id: Option<u64>,
        status: Option<LandingStatus>,
    ) -> Result<Vec<Landing>, StoreError>;

    /// Record the id transplant assigned to a submitted landing.
    async fn set_request_id(&self, id: u64, request_id: u64) -> Result<Landing, StoreError>;

    async fn mark_failed(&self, id: u64, error: String) -> Result<Landing, StoreError>;

    /// Apply a transplant pingback to the landing with `request_id`.
    async fn update_from_transplant(
        &self,
        request_id: u64,
        landed: bool,
        error: String,
        result: String,
    ) -> Result<Landing, StoreError>;
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    landings: BTreeMap<u64, Landing>,
}

#[derive(Default)]
pub struct InMemoryLandingStore {
    inner: RwLock<Inner>,
}

impl InMemoryLandingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LandingStore for InMemoryLandingStore {
    async fn create(&self, landing: NewLanding) -> Result<Landing, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = Utc::now();
        let landing = Landing {
            id: inner.next_id,
            request_id: None,
            revision_id: format_revision_id(landing.revision_id),
            diff_id: landing.diff_id,
            active_diff_id: landing.active_diff_id,
            requester_email: landing.requester_email,
            tree: landing.tree,
            status: LandingStatus::Submitted,
            error: String::new(),
            result: String::new(),
            created_at: now,
            updated_at: now,
        };
        inner.landings.insert(landing.id, landing.clone());
        Ok(landing)
    }

    async fn get(&self, id: u64) -> Result<Option<Landing>, StoreError> {
        Ok(self.inner.read().await.landings.get(&id).cloned())
    }

    async fn list(
        &self,
        revision_id: Option<u64>,
        status: Option<LandingStatus>,
    ) -> Result<Vec<Landing>, StoreError> {
        let revision_id = revision_id.map(format_revision_id);
        let inner = self.inner.read().await;
        Ok(inner
            .landings
            .values()
            .filter(|landing| {
                revision_id
                    .as_deref()
                    .is_none_or(|revision| landing.revision_id == revision)
            })
            .filter(|landing| status.is_none_or(|status| landing.status == status))
            .cloned()
            .collect())
    }

    async fn set_request_id(&self, id: u64, request_id: u64) -> Result<Landing, StoreError> {
        let mut inner = self.inner.write().await;
        let landing = inner.landings.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        landing.request_id = Some(request_id);
        landing.updated_at = Utc::now();
        Ok(landing.clone())
    }

    async fn mark_failed(&self, id: u64, error: String) -> Result<Landing, StoreError> {
        let mut inner = self.inner.write().await;
        let landing = inner.landings.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        landing.status = LandingStatus::Failed;
        landing.error = error;
        landing.updated_at = Utc::now();
        Ok(landing.clone())
    }

    async fn update_from_transplant(
        &self,
        request_id: u64,
        landed: bool,
        error: String,
        result: String,
    ) -> Result<Landing, StoreError> {
        let mut inner = self.inner.write().await;
        let landing = inner
            .landings
            .values_mut()
            .find(|landing| landing.request_id == Some(request_id))
            .ok_or(StoreError::RequestNotFound(request_id))?;
        landing.status = if landed {
            LandingStatus::Landed
        } else {
            LandingStatus::Failed
        };
        landing.error = error;
        landing.result = result;
        landing.updated_at = Utc::now();
        Ok(landing.clone())
    }
}
