use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Staff,
    Admin,
}

impl Role {
    /// Unrecognised roles fall back to staff.
    pub fn from_name(name: &str) -> Self {
        name.trim().to_lowercase().parse().unwrap_or(Role::Staff)
    }
}
