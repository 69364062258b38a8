use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use super::ValidationError;

pub const MAX_NAME_LENGTH: usize = 150;
pub const MAX_EMAIL_LENGTH: usize = 254;

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Invalid regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex"))
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
}

impl NewUser {
    pub fn validate(&self, min_password_length: usize) -> Result<(), ValidationError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::new("email", "Email is required"));
        }
        if email.len() > MAX_EMAIL_LENGTH || !email_regex().is_match(email) {
            return Err(ValidationError::new("email", "Enter a valid email address"));
        }

        let username = self.username.trim();
        if username.is_empty() {
            return Err(ValidationError::new("username", "Username is required"));
        }
        if username.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::new(
                "username",
                format!("Username must be {MAX_NAME_LENGTH} characters or less"),
            ));
        }
        if !username_regex().is_match(username) {
            return Err(ValidationError::new(
                "username",
                "Username may contain only letters, digits and . @ + - _",
            ));
        }

        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            let value = value.trim();
            if value.is_empty() {
                return Err(ValidationError::new(field, "This field is required"));
            }
            if value.chars().count() > MAX_NAME_LENGTH {
                return Err(ValidationError::new(
                    field,
                    format!("Must be {MAX_NAME_LENGTH} characters or less"),
                ));
            }
        }

        validate_password("password", &self.password, min_password_length)
    }
}

/// Body of `POST /users/set_password`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPassword {
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub current_password: String,
}

pub fn validate_password(
    field: &'static str,
    password: &str,
    min_length: usize,
) -> Result<(), ValidationError> {
    if password.chars().count() < min_length {
        return Err(ValidationError::new(
            field,
            format!("Password must be at least {min_length} characters"),
        ));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            field,
            "Password cannot be entirely numeric",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewUser {
        NewUser {
            email: "cook@example.com".to_string(),
            username: "cook.42".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Cook".to_string(),
            password: "s3cret-pass".to_string(),
        }
    }

    #[test]
    fn test_valid_user() {
        assert!(valid().validate(8).is_ok());
    }

    #[test]
    fn test_username_pattern() {
        let mut user = valid();
        user.username = "bad name".to_string();
        assert_eq!(user.validate(8).unwrap_err().field, "username");

        user.username = "повар_1".to_string();
        assert!(user.validate(8).is_ok());
    }

    #[test]
    fn test_email_format() {
        let mut user = valid();
        user.email = "not-an-email".to_string();
        assert_eq!(user.validate(8).unwrap_err().field, "email");
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("password", "short", 8).is_err());
        assert!(validate_password("password", "12345678", 8).is_err());
        assert!(validate_password("password", "long enough", 8).is_ok());
    }
}
