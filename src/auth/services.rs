use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::User;
use crate::error::{ApiError, Result};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Input checks shared by the register flow. Pure so the rules are
/// testable without a database.
pub(crate) fn validate_registration(username: &str, email: &str, password: &str) -> Result<()> {
    if username.is_empty() || username.len() > 50 {
        return Err(ApiError::Validation(
            "username must be 1-50 characters".into(),
        ));
    }
    if !is_valid_email(email) || email.len() > 100 {
        return Err(ApiError::Validation("invalid email".into()));
    }
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/// Register a new user. Existence pre-checks give the caller a precise
/// duplicate-username/-email message; the unique constraints remain the
/// source of truth, so a register racing this one degrades to the generic
/// conflict from the insert rather than a double row.
pub async fn register(db: &PgPool, username: &str, email: &str, password: &str) -> Result<User> {
    let username = username.trim();
    let email = email.trim();
    validate_registration(username, email, password)?;

    if User::username_exists(db, username).await? {
        warn!(username, "registration rejected: username taken");
        return Err(ApiError::Conflict("username already taken".into()));
    }
    if User::email_exists(db, email).await? {
        warn!(email, "registration rejected: email registered");
        return Err(ApiError::Conflict("email already registered".into()));
    }

    let hash = hash_password(password)?;
    let user = User::create(db, username, email, &hash).await?;
    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Look the identifier up as username OR email and verify the password.
/// Unknown identifier and wrong password both come back as `None`, so a
/// caller cannot tell which half failed.
pub async fn authenticate(db: &PgPool, identifier: &str, password: &str) -> Result<Option<User>> {
    let Some(user) = User::find_by_identifier(db, identifier.trim()).await? else {
        return Ok(None);
    };
    let ok = verify_password(password, &user.password_hash)?;
    Ok(ok.then_some(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@x.com "));
        assert!(!is_valid_email("spaces in@x.com"));
    }

    #[test]
    fn registration_rules() {
        assert!(validate_registration("alice", "a@x.com", "secret12").is_ok());
        assert!(matches!(
            validate_registration("", "a@x.com", "secret12"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_registration("alice", "not-an-email", "secret12"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_registration("alice", "a@x.com", "short"),
            Err(ApiError::Validation(_))
        ));
        let long_name = "x".repeat(51);
        assert!(matches!(
            validate_registration(&long_name, "a@x.com", "secret12"),
            Err(ApiError::Validation(_))
        ));
    }
}
