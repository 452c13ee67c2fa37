use async_trait::async_trait;

use super::model::*;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_user(&self, username: &str) -> DbResult<User>;
    async fn get_user_by_id(&self, id: &str) -> DbResult<User>;
    async fn get_user_by_email(&self, email: &str) -> DbResult<User>;
    async fn create_user(&self, user: &User) -> DbResult<()>;
    async fn update_biography(&self, id: &str, biography: &str) -> DbResult<()>;
    /// Overwrite a single favorite slot, leaving the other slots as stored.
    async fn set_favorite(&self, id: &str, slot: usize, movie_id: &str) -> DbResult<()>;
    async fn delete_user(&self, id: &str) -> DbResult<()>;
}

#[async_trait]
pub trait MovieRepo: Send + Sync {
    async fn get_movie(&self, id: &str) -> DbResult<Movie>;
    async fn upsert_movie(&self, movie: &Movie) -> DbResult<()>;
}

#[async_trait]
pub trait AccessTokenRepo: Send + Sync {
    async fn get_token(&self, token: &str) -> DbResult<AccessToken>;
    async fn upsert_token(&self, token: &AccessToken) -> DbResult<()>;
    async fn delete_tokens_by_user(&self, user_id: &str) -> DbResult<()>;
}
