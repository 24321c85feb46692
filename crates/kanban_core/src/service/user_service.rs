//! User use-case service.

use crate::model::user::{User, UserId};
use crate::model::EntityKind;
use crate::repo::user_repo::UserRepository;
use crate::service::{normalize_required, ServiceError, ServiceResult};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// User service facade.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a user. Email is trimmed and lowercased before storage.
    pub fn create_user(&self, email: &str, display_name: &str) -> ServiceResult<User> {
        let email = normalize_email(email)?;
        let display_name = normalize_required("display_name", display_name)?;
        Ok(self.repo.create_user(&email, &display_name)?)
    }

    pub fn get_user(&self, id: UserId) -> ServiceResult<User> {
        self.repo.get_user(id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::User,
            id,
        })
    }
}

fn normalize_email(value: &str) -> ServiceResult<String> {
    let email = value.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(ServiceError::Validation {
            field: "email",
            message: format!("`{}` is not an email address", value.trim()),
        });
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::normalize_email;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for value in ["", "ada", "ada@", "@example.com", "ada@example", "a da@example.com"] {
            assert!(normalize_email(value).is_err(), "{value} accepted");
        }
    }
}
