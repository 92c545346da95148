use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role. Every user has exactly one, assigned at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "user_role", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Studio,
    Agency,
    Editor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Studio, Role::Agency, Role::Editor];
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "studio" => Ok(Role::Studio),
            "agency" => Ok(Role::Agency),
            "editor" => Ok(Role::Editor),
            _ => Err(anyhow::anyhow!("Invalid role: {}", s)),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::Studio => write!(f, "studio"),
            Role::Agency => write!(f, "agency"),
            Role::Editor => write!(f, "editor"),
        }
    }
}

/// User entity. Soft-deactivated via `is_active`, never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub company_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
