//! Persistence for users, watchlists and their items.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ItemStatus, NewUser, NewWatchlist, NewWatchlistItem, User, Watchlist, WatchlistItem};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Outcome of adding an item to a watchlist.
#[derive(Debug, Clone, PartialEq)]
pub enum AddItem {
    Added(WatchlistItem),
    /// An item with the same catalog id and media type is already present.
    Duplicate,
    WatchlistMissing,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn create_user(&self, input: NewUser) -> Result<User>;
    async fn get_user(&self, id: &str) -> Result<Option<User>>;
    /// Deletes the user and every watchlist they own. Returns false when the
    /// user did not exist.
    async fn delete_user(&self, id: &str) -> Result<bool>;

    async fn list_watchlists(&self, user_id: &str) -> Result<Vec<Watchlist>>;
    async fn create_watchlist(&self, input: NewWatchlist) -> Result<Watchlist>;
    async fn get_watchlist(&self, id: &str) -> Result<Option<Watchlist>>;
    async fn rename_watchlist(&self, id: &str, name: &str) -> Result<bool>;
    async fn delete_watchlist(&self, id: &str) -> Result<bool>;

    async fn add_item(&self, watchlist_id: &str, input: NewWatchlistItem) -> Result<AddItem>;
    async fn update_item_status(&self, watchlist_id: &str, item_id: &str, status: ItemStatus) -> Result<bool>;
    async fn remove_item(&self, watchlist_id: &str, item_id: &str) -> Result<bool>;
}
