use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1000,
        "staff_id": "ICP/2024/001",
        "first_name": "John",
        "last_name": "Doe",
        "department": "Computer Science",
        "role": "staff"
    })
)]
pub struct Profile {
    #[schema(example = 1000)]
    pub id: u64,

    #[schema(example = "ICP/2024/001")]
    pub staff_id: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "Computer Science")]
    pub department: String,

    pub role: Role,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
