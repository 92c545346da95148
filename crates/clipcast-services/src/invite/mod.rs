//! Invitation lifecycle: issuance, validation, exactly-once redemption.
//!
//! Extends access to a recipient identified only by email, with a bounded
//! validity window. A token converts into an access grant exactly once; the
//! consume-and-grant step is a single atomic unit in the store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use uuid::Uuid;

use clipcast_core::constants::INVITE_TOKEN_BYTES;
use clipcast_core::models::{
    AccessGrant, ContentKind, Invitation, InvitationKind, Role,
};
use clipcast_core::repo::{ContentStore, InviteStore, UserStore};
use clipcast_core::AppError;

use crate::access::{default_grant_capabilities, AccessControlService};
use crate::notify::{InviteContext, Notifier};

/// Invitation context surfaced to an acceptance UI without consuming the
/// token.
#[derive(Debug, Clone)]
pub struct InvitationPreview {
    pub kind: InvitationKind,
    pub content_title: String,
    pub recipient_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct InvitationService {
    access: Arc<AccessControlService>,
    users: Arc<dyn UserStore>,
    content: Arc<dyn ContentStore>,
    invites: Arc<dyn InviteStore>,
    notifier: Arc<dyn Notifier>,
    expiry_days: i64,
    frontend_url: Option<String>,
}

impl InvitationService {
    pub fn new(
        access: Arc<AccessControlService>,
        users: Arc<dyn UserStore>,
        content: Arc<dyn ContentStore>,
        invites: Arc<dyn InviteStore>,
        notifier: Arc<dyn Notifier>,
        expiry_days: i64,
        frontend_url: Option<String>,
    ) -> Self {
        Self {
            access,
            users,
            content,
            invites,
            notifier,
            expiry_days,
            frontend_url,
        }
    }

    fn generate_token() -> String {
        let mut bytes = [0u8; INVITE_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// The role a recipient must hold to redeem an invitation of `kind`.
    fn recipient_role(kind: InvitationKind) -> Role {
        match kind {
            InvitationKind::ContentAccess => Role::Agency,
            InvitationKind::ClipAccess => Role::Editor,
        }
    }

    /// Issue an invitation for a recipient with no account yet.
    ///
    /// Fails with `NotFound` when the content does not belong to (or is not
    /// delegable by) the granter. Notifier failures are logged, never
    /// propagated: the token itself is the durable artifact.
    pub async fn issue(
        &self,
        granter_id: Uuid,
        content_id: Uuid,
        recipient_email: &str,
        kind: InvitationKind,
    ) -> Result<Invitation, AppError> {
        let content = self.access.delegable_content(granter_id, content_id).await?;

        let kind_matches = matches!(
            (kind, content.kind),
            (InvitationKind::ContentAccess, ContentKind::Podcast)
                | (InvitationKind::ClipAccess, ContentKind::Clip)
        );
        if !kind_matches {
            return Err(AppError::InvalidInput(format!(
                "Invitation kind {:?} does not match content kind {:?}",
                kind, content.kind
            )));
        }

        let now = Utc::now();
        let invitation = Invitation {
            id: Uuid::new_v4(),
            token: Self::generate_token(),
            kind,
            content_id,
            granter_id,
            recipient_email: recipient_email.to_string(),
            created_at: now,
            expires_at: now + Duration::days(self.expiry_days),
            is_used: false,
            used_at: None,
        };

        self.invites.insert(&invitation).await?;

        tracing::info!(
            invitation_id = %invitation.id,
            content_id = %content_id,
            granter_id = %granter_id,
            kind = ?kind,
            "Invitation issued"
        );

        let granter_name = match self.users.find_by_id(granter_id).await {
            Ok(Some(granter)) => granter.company_name.unwrap_or(granter.email),
            _ => "A clipcast user".to_string(),
        };
        let context = InviteContext {
            granter_name,
            content_title: content.title.clone(),
            accept_link: self
                .frontend_url
                .as_deref()
                .map(|base| format!("{}/accept-invite?token={}", base, invitation.token)),
            expires_in_days: self.expiry_days,
        };

        if let Err(e) = self.notifier.send(recipient_email, kind, &context).await {
            tracing::warn!(
                error = %e,
                invitation_id = %invitation.id,
                "Failed to send invite notification"
            );
        }

        Ok(invitation)
    }

    /// Return invitation context without consuming the token.
    ///
    /// Unknown, already-used, and expired tokens are all reported as
    /// `InvalidOrExpired`; the caller cannot tell which condition applied.
    pub async fn validate(&self, token: &str) -> Result<InvitationPreview, AppError> {
        let invitation = self
            .invites
            .find_by_token(token)
            .await?
            .ok_or(AppError::InvalidOrExpired)?;

        if !invitation.is_redeemable(Utc::now()) {
            return Err(AppError::InvalidOrExpired);
        }

        let content = self
            .content
            .find(invitation.content_id)
            .await?
            .ok_or(AppError::InvalidOrExpired)?;

        Ok(InvitationPreview {
            kind: invitation.kind,
            content_title: content.title,
            recipient_email: invitation.recipient_email,
            created_at: invitation.created_at,
            expires_at: invitation.expires_at,
        })
    }

    /// Redeem an invitation into an access grant, exactly once.
    ///
    /// The acting user must already exist under the invitation's recipient
    /// email (exact, case-sensitive match) and hold the role the kind calls
    /// for. Consumption and grant creation commit as one unit; a concurrent
    /// loser observes `AlreadyUsed` and no grant.
    pub async fn accept(
        &self,
        token: &str,
        acting_user_id: Uuid,
    ) -> Result<AccessGrant, AppError> {
        let user = self
            .users
            .find_by_id(acting_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", acting_user_id)))?;
        if !user.is_active {
            return Err(AppError::NotFound(format!(
                "User not found: {}",
                acting_user_id
            )));
        }

        let invitation = self
            .invites
            .find_by_token(token)
            .await?
            .ok_or(AppError::InvalidOrExpired)?;

        if invitation.recipient_email != user.email {
            return Err(AppError::InvalidOrExpired);
        }
        if user.role != Self::recipient_role(invitation.kind) {
            return Err(AppError::NotFound(format!(
                "User {} does not hold the {} role this invitation requires",
                user.email,
                Self::recipient_role(invitation.kind)
            )));
        }

        let capabilities = match invitation.kind {
            InvitationKind::ContentAccess => default_grant_capabilities(ContentKind::Podcast),
            InvitationKind::ClipAccess => default_grant_capabilities(ContentKind::Clip),
        };

        let (invitation, grant) = self
            .invites
            .consume_into_grant(token, user.id, capabilities)
            .await?;

        tracing::info!(
            invitation_id = %invitation.id,
            grant_id = %grant.id,
            grantee_id = %user.id,
            "Invitation accepted"
        );

        Ok(grant)
    }
}
