use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::users::User;
use crate::errors::Error;

/// The authenticated user attached to a request
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// User representation returned by the API.
///
/// Credentials and session state never leave the service.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::BadRequest {
                message: "name must not be empty".to_string(),
            });
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(Error::BadRequest {
                message: "a valid email address is required".to_string(),
            });
        }
        if self.password.len() < 8 {
            return Err(Error::BadRequest {
                message: "password must be at least 8 characters".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_validation() {
        let valid = CreateUserRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "long enough".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = CreateUserRequest {
            email: "not-an-email".to_string(),
            ..valid_clone(&valid)
        };
        assert!(bad_email.validate().is_err());

        let short_password = CreateUserRequest {
            password: "short".to_string(),
            ..valid_clone(&valid)
        };
        assert!(short_password.validate().is_err());

        let blank_name = CreateUserRequest {
            name: "   ".to_string(),
            ..valid_clone(&valid)
        };
        assert!(blank_name.validate().is_err());
    }

    fn valid_clone(req: &CreateUserRequest) -> CreateUserRequest {
        CreateUserRequest {
            name: req.name.clone(),
            email: req.email.clone(),
            password: req.password.clone(),
        }
    }
}
