// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Underwriting and document workflow.
//!
//! Documents are staged locally (one per type, last one wins) and uploaded on
//! request. The uploaded set and the underwriting result are fetched from the
//! service; the result is never computed here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::apply_if_current;
use crate::error::{ClientError, ClientResult};
use crate::gateway::RemoteHandle;
use crate::models::{DocType, Document, DocumentId, StagedDocument, UnderwritingResult};
use crate::session::{SessionListener, SessionManager};

#[derive(Default)]
struct StagingArea {
    entries: HashMap<DocType, StagedDocument>,
    next_revision: u64,
}

pub struct UnderwritingController {
    session: Arc<SessionManager>,
    staging: Mutex<StagingArea>,
    documents: watch::Sender<Vec<Document>>,
    result: watch::Sender<Option<UnderwritingResult>>,
}

impl UnderwritingController {
    /// Create the controller and subscribe it to session invalidation.
    pub fn new(session: Arc<SessionManager>) -> Arc<Self> {
        let (documents, _) = watch::channel(Vec::new());
        let (result, _) = watch::channel(None);
        let controller = Arc::new(Self {
            session,
            staging: Mutex::new(StagingArea::default()),
            documents,
            result,
        });
        let listener: Weak<dyn SessionListener> = Arc::downgrade(&controller) as Weak<dyn SessionListener>;
        controller.session.add_listener(listener);
        controller
    }

    fn staging(&self) -> MutexGuard<'_, StagingArea> {
        self.staging.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe_documents(&self) -> watch::Receiver<Vec<Document>> {
        self.documents.subscribe()
    }

    pub fn subscribe_result(&self) -> watch::Receiver<Option<UnderwritingResult>> {
        self.result.subscribe()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.borrow().clone()
    }

    pub fn result(&self) -> Option<UnderwritingResult> {
        self.result.borrow().clone()
    }

    /// Hold `content` for `doc_type`, replacing anything staged before.
    pub fn stage_document(&self, doc_type: DocType, content: Vec<u8>) {
        let mut staging = self.staging();
        staging.next_revision += 1;
        let revision = staging.next_revision;
        debug!(doc_type = %doc_type, bytes = content.len(), revision, "Document staged");
        staging.entries.insert(
            doc_type.clone(),
            StagedDocument {
                doc_type,
                content,
                staged_at: Utc::now(),
                revision,
            },
        );
    }

    pub fn staged(&self, doc_type: &DocType) -> Option<StagedDocument> {
        self.staging().entries.get(doc_type).cloned()
    }

    pub fn staged_types(&self) -> Vec<DocType> {
        let mut types: Vec<DocType> = self.staging().entries.keys().cloned().collect();
        types.sort();
        types
    }

    /// Upload the document staged for `doc_type`.
    ///
    /// The staged entry is removed only after the service accepts it, and
    /// only if nothing newer was staged meanwhile. On failure it stays so
    /// the upload can be retried.
    pub async fn upload_staged(&self, doc_type: &DocType) -> ClientResult<DocumentId> {
        let staged = self
            .staged(doc_type)
            .ok_or_else(|| ClientError::MissingDocument(doc_type.clone()))?;
        let handle = self.session.current_handle()?;

        let id = handle
            .submit_document(&staged.doc_type, &staged.content)
            .await?;
        if !self.session.is_current(handle.generation()) {
            return Err(ClientError::StaleSession);
        }

        {
            let mut staging = self.staging();
            if staging.entries.get(doc_type).map(|d| d.revision) == Some(staged.revision) {
                staging.entries.remove(doc_type);
            }
        }
        info!(doc_type = %doc_type, document_id = %id, "Document uploaded");

        if let Err(e) = self.list_with(&handle).await {
            warn!(doc_type = %doc_type, error = %e, "Document list refresh after upload failed");
        }
        Ok(id)
    }

    /// Fetch the caller's uploaded documents and replace the cache.
    pub async fn list_uploaded(&self) -> ClientResult<Vec<Document>> {
        let handle = self.session.current_handle()?;
        self.list_with(&handle).await
    }

    async fn list_with(&self, handle: &RemoteHandle) -> ClientResult<Vec<Document>> {
        let documents = handle.get_documents(handle.principal()).await?;
        apply_if_current(&self.session, handle, &self.documents, |cache| {
            *cache = documents.clone();
        })?;
        Ok(documents)
    }

    /// Trigger evaluation and re-fetch the result.
    ///
    /// Whatever the trigger returns is ignored; the re-fetched result is the
    /// one cached and returned.
    pub async fn process_underwriting(&self) -> ClientResult<UnderwritingResult> {
        let handle = self.session.current_handle()?;

        let advisory = handle.process_underwriting().await?;
        debug!(
            advisory_status = ?advisory.map(|r| r.status),
            "Underwriting evaluation triggered"
        );

        match self.fetch_result(&handle).await? {
            Some(result) => {
                info!(status = ?result.status, "Underwriting result updated");
                Ok(result)
            }
            None => Err(ClientError::RemoteRejected {
                code: "not_found".to_string(),
                message: "no underwriting result after processing".to_string(),
            }),
        }
    }

    /// Re-fetch the underwriting result. `None` when no evaluation exists.
    pub async fn refresh_result(&self) -> ClientResult<Option<UnderwritingResult>> {
        let handle = self.session.current_handle()?;
        let result = handle.get_underwriting_result().await?;
        apply_if_current(&self.session, &handle, &self.result, |cache| {
            *cache = result.clone();
        })?;
        Ok(result)
    }

    /// Fetch and cache a present result; an absent one leaves the cache alone.
    async fn fetch_result(&self, handle: &RemoteHandle) -> ClientResult<Option<UnderwritingResult>> {
        let result = handle.get_underwriting_result().await?;
        if let Some(result) = &result {
            apply_if_current(&self.session, handle, &self.result, |cache| {
                *cache = Some(result.clone());
            })?;
        }
        Ok(result)
    }
}

impl SessionListener for UnderwritingController {
    fn on_session_invalidated(&self, generation: u64) {
        self.staging().entries.clear();
        self.documents.send_replace(Vec::new());
        self.result.send_replace(None);
        debug!(generation, "Underwriting state cleared");
    }
}
