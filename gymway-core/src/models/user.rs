use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Athlete,
    Coach,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Athlete => write!(f, "athlete"),
            Role::Coach => write!(f, "coach"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "athlete" => Ok(Role::Athlete),
            "coach" => Ok(Role::Coach),
            _ => Err(format!(
                "Invalid role '{}'. Valid options: athlete, coach",
                s
            )),
        }
    }
}

/// A user profile as stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub email_verified: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_athlete(&self) -> bool {
        self.role == Role::Athlete
    }

    pub fn is_coach(&self) -> bool {
        self.role == Role::Coach
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.display_name)?;
        writeln!(f, "{}", "=".repeat(self.display_name.len()))?;
        writeln!(f, "UID: {}", self.uid)?;
        writeln!(f, "Email: {}", self.email)?;
        writeln!(f, "Role: {}", self.role)?;
        if let Some(age) = self.age {
            writeln!(f, "Age: {}", age)?;
        }
        if let Some(gender) = &self.gender {
            writeln!(f, "Gender: {}", gender)?;
        }
        writeln!(
            f,
            "Email verified: {}",
            if self.email_verified { "yes" } else { "no" }
        )?;
        Ok(())
    }
}

/// Profile fields a user may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.age.is_none() && self.gender.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("coach").unwrap(), Role::Coach);
        assert_eq!(Role::from_str("ATHLETE").unwrap(), Role::Athlete);
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn test_user_role_helpers() {
        let user = User {
            role: Role::Coach,
            ..Default::default()
        };
        assert!(user.is_coach());
        assert!(!user.is_athlete());
    }

    #[test]
    fn test_user_document_field_names() {
        let json = r#"{"uid":"u1","email":"a@b.c","displayName":"Ann","role":"coach","emailVerified":true}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name, "Ann");
        assert!(user.email_verified);
        assert!(user.age.is_none());
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            age: Some(30),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"age": 30}));
    }
}
