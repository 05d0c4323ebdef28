use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::info;

use super::{AddItem, Store};
use crate::models::{ItemStatus, NewUser, NewWatchlist, NewWatchlistItem, User, Watchlist, WatchlistItem};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    avatar_color: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            avatar_color: row.avatar_color,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WatchlistRow {
    id: String,
    user_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    watchlist_id: String,
    tmdb_id: i64,
    media_type: String,
    title: String,
    poster_path: Option<String>,
    status: String,
    added_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> Result<WatchlistItem> {
        Ok(WatchlistItem {
            media_type: self.media_type.parse()?,
            status: self.status.parse()?,
            id: self.id,
            tmdb_id: self.tmdb_id,
            title: self.title,
            poster_path: self.poster_path,
            added_at: self.added_at,
        })
    }
}

/// PostgreSQL-backed store. Watchlist items live in their own table and are
/// reassembled into each watchlist on read.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects, optionally overriding the database name, and applies the
    /// bundled migrations.
    pub async fn connect(database_url: &str, db_name: Option<&str>) -> Result<Self> {
        let mut options = PgConnectOptions::from_str(database_url).context("Invalid DATABASE_URL")?;
        if let Some(name) = db_name {
            options = options.database(name);
        }
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        sqlx::migrate!()
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        info!("Connected to PostgreSQL store");
        Ok(Self { pool })
    }

    async fn attach_items(&self, rows: Vec<WatchlistRow>) -> Result<Vec<Watchlist>> {
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, watchlist_id, tmdb_id, media_type, title, poster_path, status, added_at
            FROM watchlist_items
            WHERE watchlist_id = ANY($1)
            ORDER BY added_at ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_watchlist: HashMap<String, Vec<WatchlistItem>> = HashMap::new();
        for row in items {
            let watchlist_id = row.watchlist_id.clone();
            by_watchlist.entry(watchlist_id).or_default().push(row.into_item()?);
        }

        Ok(rows
            .into_iter()
            .map(|row| Watchlist {
                items: by_watchlist.remove(&row.id).unwrap_or_default(),
                id: row.id,
                user_id: row.user_id,
                name: row.name,
                created_at: row.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, avatar_color, created_at FROM users ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create_user(&self, input: NewUser) -> Result<User> {
        let user = User::new(input);
        sqlx::query("INSERT INTO users (id, name, avatar_color, created_at) VALUES ($1, $2, $3, $4)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.avatar_color)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, avatar_color, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn delete_user(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM watchlists WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_watchlists(&self, user_id: &str) -> Result<Vec<Watchlist>> {
        let rows = sqlx::query_as::<_, WatchlistRow>(
            "SELECT id, user_id, name, created_at FROM watchlists WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_items(rows).await
    }

    async fn create_watchlist(&self, input: NewWatchlist) -> Result<Watchlist> {
        let watchlist = Watchlist::new(input);
        sqlx::query("INSERT INTO watchlists (id, user_id, name, created_at) VALUES ($1, $2, $3, $4)")
            .bind(&watchlist.id)
            .bind(&watchlist.user_id)
            .bind(&watchlist.name)
            .bind(watchlist.created_at)
            .execute(&self.pool)
            .await?;
        Ok(watchlist)
    }

    async fn get_watchlist(&self, id: &str) -> Result<Option<Watchlist>> {
        let row = sqlx::query_as::<_, WatchlistRow>(
            "SELECT id, user_id, name, created_at FROM watchlists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn rename_watchlist(&self, id: &str, name: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE watchlists SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_watchlist(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM watchlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_item(&self, watchlist_id: &str, input: NewWatchlistItem) -> Result<AddItem> {
        let mut tx = self.pool.begin().await?;
        // FOR SHARE holds off a concurrent watchlist delete until commit.
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM watchlists WHERE id = $1 FOR SHARE")
            .bind(watchlist_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(AddItem::WatchlistMissing);
        }

        let item = WatchlistItem::new(input);
        let result = sqlx::query(
            r#"
            INSERT INTO watchlist_items
                (id, watchlist_id, tmdb_id, media_type, title, poster_path, status, added_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (watchlist_id, tmdb_id, media_type) DO NOTHING
            "#,
        )
        .bind(&item.id)
        .bind(watchlist_id)
        .bind(item.tmdb_id)
        .bind(item.media_type.as_str())
        .bind(&item.title)
        .bind(&item.poster_path)
        .bind(item.status.as_str())
        .bind(item.added_at)
        .execute(&mut *tx)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(e) if is_foreign_key_violation(&e) => return Ok(AddItem::WatchlistMissing),
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Ok(AddItem::Duplicate);
        }
        Ok(AddItem::Added(item))
    }

    async fn update_item_status(&self, watchlist_id: &str, item_id: &str, status: ItemStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE watchlist_items SET status = $3 WHERE watchlist_id = $1 AND id = $2")
            .bind(watchlist_id)
            .bind(item_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_item(&self, watchlist_id: &str, item_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM watchlist_items WHERE watchlist_id = $1 AND id = $2")
            .bind(watchlist_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
