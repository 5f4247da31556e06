use bookshelf_http::KeySchema;
use bookshelf_store::Record;
use serde::{Deserialize, Serialize};

/// A registered account. `password` always holds a bcrypt hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub email: String,
    pub password: String,
}

impl Record for User {
    type Key = String;
    type Patch = PasswordChange;

    fn key(&self) -> &String {
        &self.email
    }

    fn apply(&mut self, patch: PasswordChange) {
        self.password = patch.password_hash;
    }
}

/// Replacement hash for [`User::password`].
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub password_hash: String,
}

/// Body of `POST /api/users`.
#[derive(Debug, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
}

impl Registration {
    pub const SCHEMA: KeySchema = KeySchema::exact(&["email", "password"]);
}

/// Body of `POST /api/users/{email}/reset-password`.
///
/// `securityQuestions` may be sent alongside `newPassword`; it is never read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub new_password: String,
}

impl PasswordReset {
    pub const SCHEMA: KeySchema =
        KeySchema::exact(&["newPassword"]).with_optional(&["securityQuestions"]);
}

/// Public projection of a [`User`]; the hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
        }
    }
}

/// Response of both user endpoints.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: UserView,
}
