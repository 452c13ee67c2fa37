use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Number of favorite slots every user has.
pub const FAVORITE_SLOTS: usize = 4;

/// Fixed-size list of favorite movie ids, addressed by slot 0..4.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorites([Option<String>; FAVORITE_SLOTS]);

impl Favorites {
    /// Build from a signup list. Empty strings are empty slots.
    /// Returns `None` when there are more entries than slots.
    pub fn from_ids<I, S>(ids: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut favorites = Favorites::default();
        for (idx, id) in ids.into_iter().enumerate() {
            if idx >= FAVORITE_SLOTS {
                return None;
            }
            let id: String = id.into();
            if !id.is_empty() {
                favorites.0[idx] = Some(id);
            }
        }
        Some(favorites)
    }

    pub fn get(&self, slot: usize) -> Option<&str> {
        self.0.get(slot).and_then(|s| s.as_deref())
    }

    /// Map a requested position to a slot index in 0..4.
    pub fn slot_index(slot: i64) -> Result<usize, SlotOutOfRange> {
        usize::try_from(slot)
            .ok()
            .filter(|&i| i < FAVORITE_SLOTS)
            .ok_or(SlotOutOfRange(slot))
    }

    /// Store `movie_id` in `slot`. Out-of-range slots are rejected and
    /// leave the list untouched.
    pub fn set(&mut self, slot: i64, movie_id: &str) -> Result<(), SlotOutOfRange> {
        let idx = Self::slot_index(slot)?;
        self.0[idx] = Some(movie_id.to_string());
        Ok(())
    }

    pub fn slots(&self) -> impl Iterator<Item = Option<&str>> {
        self.0.iter().map(|s| s.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("favorite slot {0} is out of range")]
pub struct SlotOutOfRange(pub i64);

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// bcrypt hash.
    pub password: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub genres: Vec<String>,
    pub profile_picture_path: Option<String>,
    pub biography: Option<String>,
    pub favorites: Favorites,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub year: i32,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub extract: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub userid: String,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorites_from_ids() {
        let favs = Favorites::from_ids(["", "m1", "", ""]).unwrap();
        assert_eq!(favs.get(0), None);
        assert_eq!(favs.get(1), Some("m1"));

        let favs = Favorites::from_ids(Vec::<String>::new()).unwrap();
        assert!(favs.slots().all(|s| s.is_none()));
        assert_eq!(favs.slots().count(), FAVORITE_SLOTS);

        assert!(Favorites::from_ids(["a", "b", "c", "d", "e"]).is_none());
    }

    #[test]
    fn test_favorites_set_bounds() {
        let mut favs = Favorites::default();
        for slot in 0..4 {
            favs.set(slot, "movie").unwrap();
            assert_eq!(favs.get(slot as usize), Some("movie"));
        }

        let before = favs.clone();
        assert_eq!(favs.set(4, "other"), Err(SlotOutOfRange(4)));
        assert_eq!(favs.set(-1, "other"), Err(SlotOutOfRange(-1)));
        assert_eq!(favs, before);
    }

    #[test]
    fn test_favorites_json_shape() {
        let favs = Favorites::from_ids(["", "m1"]).unwrap();
        let json = serde_json::to_string(&favs).unwrap();
        assert_eq!(json, r#"[null,"m1",null,null]"#);
        let back: Favorites = serde_json::from_str(&json).unwrap();
        assert_eq!(back, favs);
    }
}
