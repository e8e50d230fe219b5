//! PostgreSQL Storage
//!
//! [`Storage`] over the `users`, `reviews`, `words` and `likes` tables.
//! Preference sets are encoded with the token-set codec on the way in and
//! decoded on the way out; nothing above this layer sees the text form.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{ContentItem, ContentKind, LikeEvent, TokenSet, User};

use super::{
    LikeEventChanges, LikeEventFilter, NewLikeEvent, Storage, StorageError, StorageResult,
    UpdateOptions, UserChanges,
};

type UserRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
    i64,
    i64,
    DateTime<Utc>,
    DateTime<Utc>,
);

type ContentRow = (i64, i64, String, i64, i64, DateTime<Utc>);

type LikeRow = (i64, i64, i64, i64, bool, DateTime<Utc>);

const USER_COLUMNS: &str = "id, name, avatar, cover, favor, movie_ids, \
     review_count, words_count, version, created_at, updated_at";

const LIKE_COLUMNS: &str = "id, sender_id, receiver_id, review_id, checked, created_at";

fn user_from_row(row: UserRow) -> User {
    let (
        id,
        name,
        avatar,
        cover,
        favor,
        movie_ids,
        review_count,
        words_count,
        version,
        created_at,
        updated_at,
    ) = row;
    User {
        id,
        name,
        avatar,
        cover,
        favor_tags: TokenSet::decode(favor.as_deref()),
        liked_movie_ids: TokenSet::decode(movie_ids.as_deref()),
        review_count,
        words_count,
        version,
        created_at,
        updated_at,
    }
}

fn content_from_row(kind: ContentKind, row: ContentRow) -> ContentItem {
    let (id, user_id, title, like_num, review_num, created_at) = row;
    ContentItem {
        id,
        kind,
        user_id,
        title,
        like_num,
        review_num,
        created_at,
    }
}

fn like_from_row(row: LikeRow) -> LikeEvent {
    let (id, sender_id, receiver_id, content_id, checked, created_at) = row;
    LikeEvent {
        id,
        sender_id,
        receiver_id,
        content_id,
        checked,
        created_at,
    }
}

/// Select list for a content table; words carry no `review_num` column
fn content_columns(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Review => "id, user_id, title, like_num, review_num, created_at",
        ContentKind::Words => "id, user_id, title, like_num, 0::BIGINT AS review_num, created_at",
    }
}

/// PostgreSQL storage backend
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Create a new PgStorage
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Current preference version, or `None` for an unknown user
    async fn current_version(&self, id: i64) -> StorageResult<Option<i64>> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(version)
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(user_from_row))
    }

    async fn update_user(
        &self,
        id: i64,
        changes: &UserChanges,
        options: UpdateOptions,
    ) -> StorageResult<()> {
        if changes.is_empty() {
            return match self.current_version(id).await? {
                Some(_) => Ok(()),
                None => Err(StorageError::user_not_found(id)),
            };
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(tags) = &changes.favor_tags {
                set.push("favor = ").push_bind_unseparated(tags.encode());
            }
            if let Some(ids) = &changes.liked_movie_ids {
                set.push("movie_ids = ").push_bind_unseparated(ids.encode());
            }
            if let Some(count) = changes.review_count {
                set.push("review_count = ").push_bind_unseparated(count);
            }
            if let Some(count) = changes.words_count {
                set.push("words_count = ").push_bind_unseparated(count);
            }
            if let Some(url) = &changes.avatar {
                set.push("avatar = ").push_bind_unseparated(url.clone());
            }
            if let Some(url) = &changes.cover {
                set.push("cover = ").push_bind_unseparated(url.clone());
            }
            if changes.touches_preferences() {
                set.push("version = version + 1");
            }
            if !options.silent {
                set.push("updated_at = NOW()");
            }
        }
        builder.push(" WHERE id = ").push_bind(id);
        if let Some(expected) = options.expected_version {
            builder.push(" AND version = ").push_bind(expected);
        }

        let rows_affected = builder.build().execute(&self.pool).await?.rows_affected();
        if rows_affected > 0 {
            return Ok(());
        }

        // Nothing matched: either the user is gone or the version moved on
        match (self.current_version(id).await?, options.expected_version) {
            (None, _) => Err(StorageError::user_not_found(id)),
            (Some(found), Some(expected)) => Err(StorageError::VersionConflict {
                user_id: id,
                expected,
                found,
            }),
            (Some(_), None) => Ok(()),
        }
    }

    async fn list_users(&self, offset: i64, limit: i64) -> StorageResult<(Vec<User>, i64)> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users ORDER BY id LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(user_from_row).collect(), count))
    }

    async fn list_user_ids(&self, after_id: i64, limit: i64) -> StorageResult<Vec<i64>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE id > $1 ORDER BY id LIMIT $2")
                .bind(after_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    async fn count_content_by_user(&self, user_id: i64, kind: ContentKind) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = $1",
            kind.table()
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_content_by_user(
        &self,
        user_id: i64,
        kind: ContentKind,
    ) -> StorageResult<Vec<ContentItem>> {
        let rows: Vec<ContentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY id",
            content_columns(kind),
            kind.table()
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| content_from_row(kind, row))
            .collect())
    }

    async fn find_content(&self, kind: ContentKind, id: i64) -> StorageResult<Option<ContentItem>> {
        let row: Option<ContentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            content_columns(kind),
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| content_from_row(kind, row)))
    }

    async fn increment_like_num(&self, kind: ContentKind, id: i64) -> StorageResult<bool> {
        let rows_affected = sqlx::query(&format!(
            "UPDATE {} SET like_num = like_num + 1 WHERE id = $1",
            kind.table()
        ))
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows_affected > 0)
    }

    async fn create_like_event(&self, fields: NewLikeEvent) -> StorageResult<LikeEvent> {
        let row: LikeRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO likes (sender_id, receiver_id, review_id, checked, created_at, updated_at)
            VALUES ($1, $2, $3, FALSE, NOW(), NOW())
            RETURNING {}
            "#,
            LIKE_COLUMNS
        ))
        .bind(fields.sender_id)
        .bind(fields.receiver_id)
        .bind(fields.content_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(like_from_row(row))
    }

    async fn find_like_event(&self, id: i64) -> StorageResult<Option<LikeEvent>> {
        let row: Option<LikeRow> =
            sqlx::query_as(&format!("SELECT {} FROM likes WHERE id = $1", LIKE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(like_from_row))
    }

    async fn list_like_events(&self, filter: LikeEventFilter) -> StorageResult<Vec<LikeEvent>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM likes WHERE TRUE", LIKE_COLUMNS));
        if let Some(sender_id) = filter.sender_id {
            builder.push(" AND sender_id = ").push_bind(sender_id);
        }
        if let Some(receiver_id) = filter.receiver_id {
            builder.push(" AND receiver_id = ").push_bind(receiver_id);
        }
        if let Some(checked) = filter.checked {
            builder.push(" AND checked = ").push_bind(checked);
        }
        builder.push(" ORDER BY id");

        let rows: Vec<LikeRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(like_from_row).collect())
    }

    async fn update_like_event(&self, id: i64, changes: LikeEventChanges) -> StorageResult<()> {
        let checked = changes.checked.unwrap_or(false);

        // `checked OR $2` keeps a read flag from ever being cleared
        let rows_affected = sqlx::query(
            r#"
            UPDATE likes
            SET checked = checked OR $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(checked)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StorageError::like_not_found(id));
        }
        Ok(())
    }
}
