use serde::{Deserialize, Serialize};

use crate::users::repo_types::{PlainPassword, User};

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: PlainPassword,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: PlainPassword,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: i64,
}

/// User data safe to return to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
        }
    }
}
