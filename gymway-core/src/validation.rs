//! Client-side input checks, run before any network call.

use thiserror::Error;

use crate::models::{ProfileUpdate, WorkoutPlan};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

pub fn validate_registration(
    email: &str,
    password: &str,
    display_name: &str,
) -> Result<(), ValidationError> {
    require(display_name, "Display name")?;
    require(email, "Email")?;
    require(password, "Password")?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    require(email, "Email")?;
    require(password, "Password")
}

pub fn validate_profile_update(update: &ProfileUpdate) -> Result<(), ValidationError> {
    match &update.display_name {
        Some(name) => require(name, "Display name"),
        None => Ok(()),
    }
}

pub fn validate_workout_plan(plan: &WorkoutPlan) -> Result<(), ValidationError> {
    require(&plan.title, "Title")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_ok() {
        assert!(validate_registration("a@b.c", "secret1", "Ann").is_ok());
    }

    #[test]
    fn test_registration_short_password() {
        assert_eq!(
            validate_registration("a@b.c", "12345", "Ann"),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
    }

    #[test]
    fn test_registration_exactly_min_length() {
        assert!(validate_registration("a@b.c", "123456", "Ann").is_ok());
    }

    #[test]
    fn test_registration_blank_fields() {
        assert_eq!(
            validate_registration("a@b.c", "secret1", "  "),
            Err(ValidationError::MissingField("Display name"))
        );
        assert_eq!(
            validate_registration("", "secret1", "Ann"),
            Err(ValidationError::MissingField("Email"))
        );
    }

    #[test]
    fn test_login_requires_both_fields() {
        assert!(validate_login("a@b.c", "").is_err());
        assert!(validate_login("a@b.c", "x").is_ok());
    }

    #[test]
    fn test_profile_update_blank_name() {
        let update = ProfileUpdate {
            display_name: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_profile_update(&update).is_err());
        assert!(validate_profile_update(&ProfileUpdate::default()).is_ok());
    }

    #[test]
    fn test_plan_requires_title() {
        assert!(validate_workout_plan(&WorkoutPlan::new("p", "")).is_err());
        assert!(validate_workout_plan(&WorkoutPlan::new("p", "Legs")).is_ok());
    }

    #[test]
    fn test_error_message() {
        let err = ValidationError::PasswordTooShort { min: 6 };
        assert!(err.to_string().contains("at least 6"));
    }
}
