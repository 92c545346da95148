//! In-memory test doubles for the repository contracts and the storage
//! gateway. The grant and invitation doubles are faithful to the atomicity
//! the contracts demand (single-lock compare-and-set), so the concurrency
//! tests exercise real race behavior.
#![allow(dead_code)] // not every test binary uses every double

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use clipcast_core::auth::Capability;
use clipcast_core::models::{
    AccessGrant, CompletedObject, Content, GrantState, Invitation, NewContent, PartAuthorization,
    PartReceipt, Role, User,
};
use clipcast_core::repo::{ContentStore, GrantStore, InviteStore, UserStore};
use clipcast_core::AppError;
use clipcast_storage::{StorageError, StorageGateway, StorageResult};

pub fn test_user(email: &str, role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: "$2b$12$test".to_string(),
        role,
        company_name: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn add(&self, user: User) -> User {
        self.users.lock().unwrap().insert(user.id, user.clone());
        user
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryContentStore {
    rows: Mutex<HashMap<Uuid, Content>>,
}

impl MemoryContentStore {
    pub fn add(&self, content: Content) -> Content {
        self.rows.lock().unwrap().insert(content.id, content.clone());
        content
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn find(&self, id: Uuid) -> Result<Option<Content>, AppError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, content: NewContent) -> Result<Content, AppError> {
        let now = Utc::now();
        let (start_secs, end_secs) = content
            .clip_range
            .map(|r| (Some(r.start_secs), Some(r.end_secs)))
            .unwrap_or((None, None));
        let row = Content {
            id: Uuid::new_v4(),
            kind: content.kind,
            title: content.title,
            description: content.description,
            studio_id: content.studio_id,
            agency_id: content.agency_id,
            filename: content.filename,
            original_name: content.original_name,
            content_type: content.content_type,
            size_bytes: content.size_bytes,
            duration_secs: content.duration_secs,
            storage_key: content.storage_key,
            parent_id: content.parent_id,
            start_secs,
            end_secs,
            status: content.status,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_owned_by_studio(&self, studio_id: Uuid) -> Result<Vec<Content>, AppError> {
        let mut rows: Vec<Content> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.studio_id == studio_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_created_by_agency(&self, agency_id: Uuid) -> Result<Vec<Content>, AppError> {
        let mut rows: Vec<Content> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.agency_id == Some(agency_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Content>, AppError> {
        let rows = self.rows.lock().unwrap();
        let mut out: Vec<Content> = ids.iter().filter_map(|id| rows.get(id).cloned()).collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}

#[derive(Default)]
pub struct MemoryGrantStore {
    rows: Mutex<HashMap<(Uuid, Uuid), AccessGrant>>,
}

impl MemoryGrantStore {
    pub fn all(&self) -> Vec<AccessGrant> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    fn upsert_locked(
        rows: &mut HashMap<(Uuid, Uuid), AccessGrant>,
        content_id: Uuid,
        grantee_id: Uuid,
        granter_id: Uuid,
        capabilities: &[Capability],
    ) -> AccessGrant {
        let now = Utc::now();
        let grant = rows
            .entry((content_id, grantee_id))
            .and_modify(|g| {
                g.state = GrantState::Active;
                g.granter_id = granter_id;
                g.capabilities = capabilities.to_vec();
                g.updated_at = now;
            })
            .or_insert_with(|| AccessGrant {
                id: Uuid::new_v4(),
                content_id,
                grantee_id,
                granter_id,
                capabilities: capabilities.to_vec(),
                state: GrantState::Active,
                download_count: 0,
                last_download_at: None,
                granted_at: now,
                updated_at: now,
            });
        grant.clone()
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn upsert_active(
        &self,
        content_id: Uuid,
        grantee_id: Uuid,
        granter_id: Uuid,
        capabilities: &[Capability],
    ) -> Result<AccessGrant, AppError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(Self::upsert_locked(
            &mut rows,
            content_id,
            grantee_id,
            granter_id,
            capabilities,
        ))
    }

    async fn revoke(&self, content_id: Uuid, grantee_id: Uuid) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&(content_id, grantee_id)) {
            Some(grant) if grant.state == GrantState::Active => {
                grant.state = GrantState::Revoked;
                grant.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_active(
        &self,
        content_id: Uuid,
        grantee_id: Uuid,
    ) -> Result<Option<AccessGrant>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(content_id, grantee_id))
            .filter(|g| g.state == GrantState::Active)
            .cloned())
    }

    async fn list_active_for_grantee(
        &self,
        grantee_id: Uuid,
    ) -> Result<Vec<AccessGrant>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|g| g.grantee_id == grantee_id && g.state == GrantState::Active)
            .cloned()
            .collect())
    }

    async fn record_download(&self, grant_id: Uuid) -> Result<i64, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let grant = rows
            .values_mut()
            .find(|g| g.id == grant_id)
            .ok_or_else(|| AppError::NotFound(format!("Access grant not found: {}", grant_id)))?;
        grant.download_count += 1;
        grant.last_download_at = Some(Utc::now());
        Ok(grant.download_count)
    }
}

/// Invitation store whose consume step is a compare-and-set under one lock,
/// with the grant created before the lock scope ends (the in-memory stand-in
/// for one database transaction).
#[derive(Default)]
pub struct MemoryInviteStore {
    rows: Mutex<HashMap<String, Invitation>>,
    grants: Arc<MemoryGrantStore>,
}

impl MemoryInviteStore {
    pub fn new(grants: Arc<MemoryGrantStore>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            grants,
        }
    }
}

#[async_trait]
impl InviteStore for MemoryInviteStore {
    async fn insert(&self, invitation: &Invitation) -> Result<(), AppError> {
        self.rows
            .lock()
            .unwrap()
            .insert(invitation.token.clone(), invitation.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError> {
        Ok(self.rows.lock().unwrap().get(token).cloned())
    }

    async fn consume_into_grant(
        &self,
        token: &str,
        grantee_id: Uuid,
        capabilities: &[Capability],
    ) -> Result<(Invitation, AccessGrant), AppError> {
        let mut rows = self.rows.lock().unwrap();
        let invitation = match rows.get_mut(token) {
            Some(invite) if invite.is_used => return Err(AppError::AlreadyUsed),
            Some(invite) if invite.expires_at <= Utc::now() => {
                return Err(AppError::InvalidOrExpired)
            }
            Some(invite) => {
                invite.is_used = true;
                invite.used_at = Some(Utc::now());
                invite.clone()
            }
            None => return Err(AppError::InvalidOrExpired),
        };

        let mut grant_rows = self.grants.rows.lock().unwrap();
        let grant = MemoryGrantStore::upsert_locked(
            &mut grant_rows,
            invitation.content_id,
            grantee_id,
            invitation.granter_id,
            capabilities,
        );

        Ok((invitation, grant))
    }
}

/// In-memory storage gateway that counts backend calls, so tests can assert
/// that an incomplete receipt set never reaches the backend.
#[derive(Default)]
pub struct MemoryGateway {
    sessions: Mutex<HashMap<String, HashMap<i32, Vec<u8>>>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    pub complete_calls: AtomicUsize,
    pub abort_calls: AtomicUsize,
}

impl MemoryGateway {
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn session_open(&self, session_id: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(session_id)
    }

    fn digest(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }
}

#[async_trait]
impl StorageGateway for MemoryGateway {
    async fn create_session(&self, _key: &str, _content_type: &str) -> StorageResult<String> {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.clone(), HashMap::new());
        Ok(session_id)
    }

    async fn authorize_part(
        &self,
        session_id: &str,
        _key: &str,
        part_number: i32,
        ttl: Duration,
    ) -> StorageResult<PartAuthorization> {
        Ok(PartAuthorization {
            part_number,
            url: format!("memory://{}/{}", session_id, part_number),
            expires_at: Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_default(),
        })
    }

    async fn upload_part(
        &self,
        session_id: &str,
        _key: &str,
        part_number: i32,
        bytes: Bytes,
    ) -> StorageResult<String> {
        let mut sessions = self.sessions.lock().unwrap();
        let parts = sessions
            .get_mut(session_id)
            .ok_or_else(|| StorageError::NotFound(format!("upload session {}", session_id)))?;
        let tag = Self::digest(&bytes);
        parts.insert(part_number, bytes.to_vec());
        Ok(tag)
    }

    async fn complete_session(
        &self,
        session_id: &str,
        key: &str,
        receipts: &[PartReceipt],
    ) -> StorageResult<CompletedObject> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);

        let mut sessions = self.sessions.lock().unwrap();
        let parts = sessions
            .remove(session_id)
            .ok_or_else(|| StorageError::NotFound(format!("upload session {}", session_id)))?;

        let mut assembled = Vec::new();
        for receipt in receipts {
            let bytes = parts.get(&receipt.part_number).ok_or_else(|| {
                StorageError::CompletionFailed(format!(
                    "part {} was never uploaded",
                    receipt.part_number
                ))
            })?;
            if Self::digest(bytes) != receipt.receipt_tag {
                return Err(StorageError::CompletionFailed(format!(
                    "receipt tag mismatch for part {}",
                    receipt.part_number
                )));
            }
            assembled.extend_from_slice(bytes);
        }

        let checksum = Self::digest(&assembled);
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), assembled);

        Ok(CompletedObject {
            location: format!("memory://{}", key),
            checksum: Some(checksum),
        })
    }

    async fn abort_session(&self, session_id: &str, _key: &str) -> StorageResult<()> {
        self.abort_calls.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn authorize_read(&self, key: &str, _ttl: Duration) -> StorageResult<String> {
        if !self.objects.lock().unwrap().contains_key(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!("memory://{}?signed", key))
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
