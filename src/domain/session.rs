// Session domain model - signed-in user and admin profile
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "admin".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub email: String,
    pub role: String,
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDetails {
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    #[serde(alias = "adminId", default)]
    pub admin_id: Option<String>,
}

/// What gets persisted between console restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<AuthUser>,
    pub admin: Option<AdminDetails>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user
            .as_ref()
            .map(|u| !u.email.is_empty() && !u.role.is_empty())
            .unwrap_or(false)
    }

    pub fn token(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.token.as_deref())
    }

    pub fn greeting(&self) -> String {
        match &self.admin {
            Some(admin) => format!("Welcome Back, {}", admin.first_name),
            None => "Welcome Back".to_string(),
        }
    }
}
