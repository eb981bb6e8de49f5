//! Role checks for the signed-in user.

/// Roles the application distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRole {
    User,
    Admin,
}

impl AuthRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthRole::User => "user",
            AuthRole::Admin => "admin",
        }
    }
}

/// Every signed-in user satisfies `User`; other roles need an exact match.
pub fn has_role(user_role: &str, required: AuthRole) -> bool {
    required == AuthRole::User || user_role == required.as_str()
}

pub fn is_admin(role: &str) -> bool {
    role == AuthRole::Admin.as_str()
}
