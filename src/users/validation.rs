use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use super::dto::UserPayload;
use super::object_id::ObjectId;
use super::repo_types::NewUser;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("{0} must be a string")]
    InvalidFieldType(&'static str),
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Age must be a number")]
    InvalidAgeType,
    #[error("Invalid user ID format")]
    InvalidId,
}

/// Fields that passed the presence check, borrowed from the payload.
#[derive(Debug)]
pub struct RequiredFields<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub age: &'a Value,
}

/// JSON truthiness: `null`, `false`, `0` and `""` count as absent.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn present(v: &Option<Value>) -> Option<&Value> {
    v.as_ref().filter(|v| is_truthy(v))
}

pub fn check_required_fields(p: &UserPayload) -> Result<RequiredFields<'_>, ValidationError> {
    let (Some(name), Some(email), Some(age)) = (present(&p.name), present(&p.email), present(&p.age))
    else {
        return Err(ValidationError::MissingFields);
    };
    let name = name.as_str().ok_or(ValidationError::InvalidFieldType("name"))?;
    let email = email.as_str().ok_or(ValidationError::InvalidFieldType("email"))?;
    Ok(RequiredFields { name, email, age })
}

pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Only JSON numbers pass; `"30"` does not.
pub fn validate_age_type(age: &Value) -> Result<f64, ValidationError> {
    age.as_f64().ok_or(ValidationError::InvalidAgeType)
}

pub fn validate_identifier_format(id: &str) -> Result<ObjectId, ValidationError> {
    id.parse()
}

impl RequiredFields<'_> {
    pub fn into_new_user(self, age: f64) -> NewUser {
        NewUser {
            name: self.name.to_owned(),
            email: self.email.to_owned(),
            age,
        }
    }
}
