use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "id")]
    pub user_id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
}

impl User {
    pub fn role_display(&self) -> &str {
        self.role.as_deref().unwrap_or("member")
    }
}
