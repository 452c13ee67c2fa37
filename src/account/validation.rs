use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::error::FieldErrors;
use super::types::{SignupPayload, ValidSignup};
use crate::db::{Favorites, FAVORITE_SLOTS};

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(
            r"^[\p{L}\p{N}.!#$%&'*+/=?^_`{|}~-]+@[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?(?:\.[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?)+$",
        )
        .unwrap()
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Accepts a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Scalars are read as their string form; arrays and objects are not strings.
fn as_string(value: Value) -> Result<String, Value> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(other),
    }
}

fn type_error(errors: &mut FieldErrors, field: &str, expected: &str) {
    errors.insert(field, format!("{} must be a `{}` type", field, expected));
}

fn required<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.insert(field, format!("{} is a required field", field));
    }
    value
}

fn optional_string(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<String> {
    match as_string(value?) {
        Ok(s) => Some(s),
        Err(Value::Null) => None,
        Err(_) => {
            type_error(errors, field, "string");
            None
        }
    }
}

fn required_string(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<String> {
    let value = match value.map(as_string) {
        Some(Err(other)) if !other.is_null() => {
            type_error(errors, field, "string");
            return None;
        }
        Some(Ok(s)) if !s.is_empty() => Some(s),
        _ => None,
    };
    required(errors, field, value)
}

fn length_between(
    errors: &mut FieldErrors,
    field: &str,
    value: String,
    min: usize,
    max: usize,
) -> Option<String> {
    let len = value.chars().count();
    if len < min {
        errors.insert(field, format!("{} must be at least {} characters", field, min));
        return None;
    }
    if len > max {
        errors.insert(field, format!("{} must be at most {} characters", field, max));
        return None;
    }
    Some(value)
}

fn array(errors: &mut FieldErrors, field: &str, value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        _ => {
            type_error(errors, field, "array");
            None
        }
    }
}

/// Strings, or a millisecond timestamp.
fn birth_date(errors: &mut FieldErrors, value: Option<Value>) -> Option<NaiveDate> {
    let date = match value? {
        Value::Null => return None,
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => parse_date(&s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<chrono::Utc>::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    };
    if date.is_none() {
        errors.insert("birthDate", "birthDate must be a valid date".to_string());
    }
    date
}

fn genres(errors: &mut FieldErrors, value: Value) -> Option<Vec<String>> {
    let mut genres = Vec::new();
    for (idx, item) in array(errors, "genres", value)?.into_iter().enumerate() {
        match as_string(item) {
            Ok(s) if !s.is_empty() => genres.push(s),
            Ok(_) | Err(Value::Null) => {
                errors.insert("genres", format!("genres[{}] is a required field", idx));
                return None;
            }
            Err(_) => {
                errors.insert("genres", format!("genres[{}] must be a `string` type", idx));
                return None;
            }
        }
    }
    Some(genres)
}

fn favorites(errors: &mut FieldErrors, value: Option<Value>) -> Option<Favorites> {
    let items = match value {
        None | Some(Value::Null) => return Some(Favorites::default()),
        Some(value) => array(errors, "favorites", value)?,
    };

    let mut ids = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match as_string(item) {
            Ok(s) => ids.push(s),
            Err(Value::Null) => ids.push(String::new()),
            Err(_) => {
                errors.insert("favorites", format!("favorites[{}] must be a `string` type", idx));
                return None;
            }
        }
    }

    let favorites = Favorites::from_ids(ids);
    if favorites.is_none() {
        errors.insert(
            "favorites",
            format!(
                "favorites field must have less than or equal to {} items",
                FAVORITE_SLOTS
            ),
        );
    }
    favorites
}

/// Check a signup body. Every field is checked, so the error map holds
/// one message for each field that failed.
pub fn validate_signup(payload: SignupPayload) -> Result<ValidSignup, FieldErrors> {
    let mut errors = FieldErrors::default();

    let username = required_string(&mut errors, "username", payload.username)
        .and_then(|v| length_between(&mut errors, "username", v, 4, 20));

    let email = required_string(&mut errors, "email", payload.email).and_then(|v| {
        if is_valid_email(&v) {
            Some(v)
        } else {
            errors.insert("email", "email must be a valid email".to_string());
            None
        }
    });

    let password = required_string(&mut errors, "password", payload.password)
        .and_then(|v| length_between(&mut errors, "password", v, 6, 20));

    let birth_date = birth_date(&mut errors, payload.birth_date);
    let birth_date = required(&mut errors, "birthDate", birth_date);

    let gender = required_string(&mut errors, "gender", payload.gender);

    let genre_list = payload.genres.filter(|v| !v.is_null());
    let genres = required(&mut errors, "genres", genre_list).and_then(|v| genres(&mut errors, v));

    let favorites = favorites(&mut errors, payload.favorites);

    let profile_picture_path =
        optional_string(&mut errors, "profilePicturePath", payload.profile_picture_path);
    let biography = optional_string(&mut errors, "biography", payload.biography);

    match (username, email, password, birth_date, gender, genres, favorites) {
        (
            Some(username),
            Some(email),
            Some(password),
            Some(birth_date),
            Some(gender),
            Some(genres),
            Some(favorites),
        ) if errors.is_empty() => Ok(ValidSignup {
            username,
            email,
            password,
            birth_date,
            gender,
            genres,
            favorites,
            profile_picture_path,
            biography,
        }),
        _ => Err(errors),
    }
}
