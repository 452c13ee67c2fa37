use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::model::*;
use super::repo::*;

const USER_COLUMNS: &str = "id, username, email, password, birthdate, gender, genres, \
                            profilepicture, biography, favorites, created";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password: String,
    birthdate: String,
    gender: String,
    genres: String,
    profilepicture: Option<String>,
    biography: Option<String>,
    favorites: String,
    created: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> DbResult<Self> {
        let birth_date = NaiveDate::parse_from_str(&row.birthdate, "%Y-%m-%d")
            .map_err(|e| DbError::Sqlx(sqlx::Error::Decode(Box::new(e))))?;

        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password: row.password,
            birth_date,
            gender: row.gender,
            genres: serde_json::from_str(&row.genres)?,
            profile_picture_path: row.profilepicture,
            biography: row.biography,
            favorites: serde_json::from_str(&row.favorites)?,
            created: row.created.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        })
    }
}

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self::with_pool(pool).await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    /// A private in-memory database. The pool is pinned to a single
    /// connection that never expires, since every sqlite memory
    /// connection is a separate database.
    pub async fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> DbResult<Self> {
        let repo = Self { pool };
        repo.init_schema().await?;
        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_user(&self, column: &str, value: &str) -> DbResult<User> {
        let query = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    DbError::NotFound(format!("User not found: {} = {}", column, value))
                }
                _ => DbError::Sqlx(e),
            })?;
        User::try_from(row)
    }
}

fn unique_violation(e: sqlx::Error, what: String) -> DbError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return DbError::AlreadyExists(what);
        }
    }
    DbError::Sqlx(e)
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn get_user(&self, username: &str) -> DbResult<User> {
        self.fetch_user("username", username).await
    }

    async fn get_user_by_id(&self, id: &str) -> DbResult<User> {
        self.fetch_user("id", id).await
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        self.fetch_user("email", email).await
    }

    async fn create_user(&self, user: &User) -> DbResult<()> {
        let query = format!(
            "INSERT INTO users ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            USER_COLUMNS
        );
        sqlx::query(&query)
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password)
            .bind(user.birth_date.format("%Y-%m-%d").to_string())
            .bind(&user.gender)
            .bind(serde_json::to_string(&user.genres)?)
            .bind(&user.profile_picture_path)
            .bind(&user.biography)
            .bind(serde_json::to_string(&user.favorites)?)
            .bind(user.created.as_ref().map(|dt| dt.to_rfc3339()))
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation(e, format!("User {}", user.username)))?;
        debug!(userid = %user.id, "user created");
        Ok(())
    }

    async fn update_biography(&self, id: &str, biography: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET biography = ? WHERE id = ?")
            .bind(biography)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User not found: {}", id)));
        }
        Ok(())
    }

    async fn set_favorite(&self, id: &str, slot: usize, movie_id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET favorites = json_set(favorites, ?, ?) WHERE id = ?")
            .bind(format!("$[{}]", slot))
            .bind(movie_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User not found: {}", id)));
        }
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User not found: {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl MovieRepo for SqliteRepository {
    async fn get_movie(&self, id: &str) -> DbResult<Movie> {
        let result = sqlx::query_as::<_, (String, String, i32, String, String, Option<String>, Option<String>)>(
            "SELECT id, title, year, castlist, genres, extract, thumbnail FROM movies WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("Movie not found: {}", id)),
            _ => DbError::Sqlx(e),
        })?;

        Ok(Movie {
            id: result.0,
            title: result.1,
            year: result.2,
            cast: serde_json::from_str(&result.3)?,
            genres: serde_json::from_str(&result.4)?,
            extract: result.5,
            thumbnail: result.6,
        })
    }

    async fn upsert_movie(&self, movie: &Movie) -> DbResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO movies
            (id, title, year, castlist, genres, extract, thumbnail)
            VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&movie.id)
        .bind(&movie.title)
        .bind(movie.year)
        .bind(serde_json::to_string(&movie.cast)?)
        .bind(serde_json::to_string(&movie.genres)?)
        .bind(&movie.extract)
        .bind(&movie.thumbnail)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AccessTokenRepo for SqliteRepository {
    async fn get_token(&self, token: &str) -> DbResult<AccessToken> {
        let result = sqlx::query_as::<_, (String, String, Option<String>)>(
            "SELECT token, userid, created FROM accesstokens WHERE token = ?",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound("Token not found".to_string()),
            _ => DbError::Sqlx(e),
        })?;

        Ok(AccessToken {
            token: result.0,
            userid: result.1,
            created: result.2.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        })
    }

    async fn upsert_token(&self, token: &AccessToken) -> DbResult<()> {
        sqlx::query("INSERT OR REPLACE INTO accesstokens (token, userid, created) VALUES (?, ?, ?)")
            .bind(&token.token)
            .bind(&token.userid)
            .bind(token.created.as_ref().map(|dt| dt.to_rfc3339()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_tokens_by_user(&self, user_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM accesstokens WHERE userid = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
