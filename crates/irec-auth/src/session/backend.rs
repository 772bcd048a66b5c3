//! Session storage backends.
//!
//! The store keeps one record per session key. Records for different keys
//! are independent; implementations only need per-key atomicity.

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use super::SessionError;
use super::types::{SessionData, SessionId};

/// Storage trait for session records.
///
/// # Example Implementation
///
/// ```ignore
/// struct RedisSessionBackend { pool: deadpool_redis::Pool }
///
/// #[async_trait::async_trait]
/// impl SessionBackend for RedisSessionBackend {
///     async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, SessionError> {
///         // GET session:{id}, deserialize
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Loads a session record.
    ///
    /// Returns `Ok(None)` if the record does not exist or has expired.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Backend` if the storage is unavailable.
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, SessionError>;

    /// Writes a session record, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Backend` if the storage is unavailable.
    async fn store(
        &self,
        id: &SessionId,
        data: &SessionData,
        expires_at: OffsetDateTime,
    ) -> Result<(), SessionError>;

    /// Removes a session record. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Backend` if the storage is unavailable.
    async fn remove(&self, id: &SessionId) -> Result<(), SessionError>;

    /// Removes all expired records and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Backend` if the storage is unavailable.
    async fn purge_expired(&self) -> Result<usize, SessionError>;
}

#[derive(Debug, Clone)]
struct StoredRecord {
    data: SessionData,
    expires_at: OffsetDateTime,
}

/// In-process session backend.
#[derive(Debug, Default)]
pub struct MemorySessionBackend {
    records: DashMap<SessionId, StoredRecord>,
}

impl MemorySessionBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of every stored record.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(SessionId, SessionData)> {
        self.records
            .iter()
            .map(|entry| (*entry.key(), entry.value().data.clone()))
            .collect()
    }
}

#[async_trait]
impl SessionBackend for MemorySessionBackend {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, SessionError> {
        let now = OffsetDateTime::now_utc();
        let expired = match self.records.get(id) {
            None => return Ok(None),
            Some(record) if record.expires_at > now => return Ok(Some(record.data.clone())),
            Some(_) => true,
        };
        if expired {
            self.records.remove_if(id, |_, record| record.expires_at <= now);
        }
        Ok(None)
    }

    async fn store(
        &self,
        id: &SessionId,
        data: &SessionData,
        expires_at: OffsetDateTime,
    ) -> Result<(), SessionError> {
        self.records.insert(
            *id,
            StoredRecord {
                data: data.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<(), SessionError> {
        self.records.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, SessionError> {
        let now = OffsetDateTime::now_utc();
        let before = self.records.len();
        self.records.retain(|_, record| record.expires_at > now);
        Ok(before.saturating_sub(self.records.len()))
    }
}
