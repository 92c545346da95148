use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// What an invitation converts into on acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "invitation_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum InvitationKind {
    ContentAccess,
    ClipAccess,
}

/// Derived lifecycle view of an invitation. `Used` takes precedence over
/// `Expired`: a consumed token stays consumed even after its window lapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvitationState {
    Pending,
    Used,
    Expired,
}

/// A single-use capability token extending access to a recipient identified
/// only by email. Consumed exactly once, atomically, converting into an
/// [`super::AccessGrant`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invitation {
    pub id: Uuid,
    /// Opaque random token; the only handle a recipient holds.
    pub token: String,
    pub kind: InvitationKind,
    pub content_id: Uuid,
    pub granter_id: Uuid,
    pub recipient_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn state(&self, now: DateTime<Utc>) -> InvitationState {
        if self.is_used {
            InvitationState::Used
        } else if self.expires_at <= now {
            InvitationState::Expired
        } else {
            InvitationState::Pending
        }
    }

    /// Whether the token can still be redeemed at `now`.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == InvitationState::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invitation(is_used: bool, expires_in: Duration) -> Invitation {
        let now = Utc::now();
        Invitation {
            id: Uuid::new_v4(),
            token: "tok".to_string(),
            kind: InvitationKind::ContentAccess,
            content_id: Uuid::new_v4(),
            granter_id: Uuid::new_v4(),
            recipient_email: "agency@example.com".to_string(),
            created_at: now,
            expires_at: now + expires_in,
            is_used,
            used_at: if is_used { Some(now) } else { None },
        }
    }

    #[test]
    fn pending_within_window() {
        let invite = invitation(false, Duration::days(7));
        assert_eq!(invite.state(Utc::now()), InvitationState::Pending);
        assert!(invite.is_redeemable(Utc::now()));
    }

    #[test]
    fn expired_after_window() {
        let invite = invitation(false, Duration::days(7));
        let later = Utc::now() + Duration::days(8);
        assert_eq!(invite.state(later), InvitationState::Expired);
        assert!(!invite.is_redeemable(later));
    }

    #[test]
    fn used_takes_precedence_over_expired() {
        let invite = invitation(true, Duration::days(-1));
        assert_eq!(invite.state(Utc::now()), InvitationState::Used);
        assert!(!invite.is_redeemable(Utc::now()));
    }
}
