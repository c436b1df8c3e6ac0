//! In-process artifact sink with expiry.

use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use auditchain_contracts::{
    error::{AuditError, AuditResult},
    export::ArtifactRef,
};
use auditchain_core::traits::ArtifactSink;

struct StoredArtifact {
    bytes: Vec<u8>,
    expires_at: DateTime<Utc>,
}

/// Keeps export artifacts in memory under `mem://exports/<uuid>/<name>`.
#[derive(Default)]
pub struct InMemoryArtifactSink {
    artifacts: Mutex<HashMap<String, StoredArtifact>>,
}

impl InMemoryArtifactSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every artifact whose expiry is at or before `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> AuditResult<usize> {
        let mut artifacts = self.lock()?;
        let before = artifacts.len();
        artifacts.retain(|_, a| a.expires_at > now);
        Ok(before - artifacts.len())
    }

    fn lock(&self) -> AuditResult<std::sync::MutexGuard<'_, HashMap<String, StoredArtifact>>> {
        self.artifacts.lock().map_err(|e| AuditError::ExportFailed {
            reason: format!("artifact sink lock poisoned: {}", e),
        })
    }
}

impl ArtifactSink for InMemoryArtifactSink {
    fn store(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> AuditResult<ArtifactRef> {
        let uri = format!("mem://exports/{}/{}", Uuid::new_v4(), name);
        let reference = ArtifactRef {
            uri: uri.clone(),
            content_type: content_type.to_string(),
            size_bytes: bytes.len(),
        };
        self.lock()?.insert(uri, StoredArtifact { bytes, expires_at });
        debug!(uri = %reference.uri, size = reference.size_bytes, "export artifact stored");
        Ok(reference)
    }

    fn fetch(&self, uri: &str, now: DateTime<Utc>) -> AuditResult<Vec<u8>> {
        let artifacts = self.lock()?;
        match artifacts.get(uri) {
            Some(a) if a.expires_at > now => Ok(a.bytes.clone()),
            _ => Err(AuditError::ArtifactUnavailable {
                reference: uri.to_string(),
            }),
        }
    }
}
