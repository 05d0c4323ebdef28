use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AddItem, Store};
use crate::models::{ItemStatus, NewUser, NewWatchlist, NewWatchlistItem, User, Watchlist, WatchlistItem};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    watchlists: Vec<Watchlist>,
}

/// Process-local store used when no database is configured and in tests.
/// Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.tables.lock().await.users.clone())
    }

    async fn create_user(&self, input: NewUser) -> Result<User> {
        let user = User::new(input);
        self.tables.lock().await.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn delete_user(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        tables.watchlists.retain(|w| w.user_id != id);
        Ok(true)
    }

    async fn list_watchlists(&self, user_id: &str) -> Result<Vec<Watchlist>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .watchlists
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_watchlist(&self, input: NewWatchlist) -> Result<Watchlist> {
        let watchlist = Watchlist::new(input);
        self.tables.lock().await.watchlists.push(watchlist.clone());
        Ok(watchlist)
    }

    async fn get_watchlist(&self, id: &str) -> Result<Option<Watchlist>> {
        let tables = self.tables.lock().await;
        Ok(tables.watchlists.iter().find(|w| w.id == id).cloned())
    }

    async fn rename_watchlist(&self, id: &str, name: &str) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        match tables.watchlists.iter_mut().find(|w| w.id == id) {
            Some(w) => {
                w.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_watchlist(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.watchlists.len();
        tables.watchlists.retain(|w| w.id != id);
        Ok(tables.watchlists.len() != before)
    }

    async fn add_item(&self, watchlist_id: &str, input: NewWatchlistItem) -> Result<AddItem> {
        let mut tables = self.tables.lock().await;
        let Some(watchlist) = tables.watchlists.iter_mut().find(|w| w.id == watchlist_id) else {
            return Ok(AddItem::WatchlistMissing);
        };
        if watchlist.contains(input.tmdb_id, input.media_type) {
            return Ok(AddItem::Duplicate);
        }
        let item = WatchlistItem::new(input);
        watchlist.items.push(item.clone());
        Ok(AddItem::Added(item))
    }

    async fn update_item_status(&self, watchlist_id: &str, item_id: &str, status: ItemStatus) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let item = tables
            .watchlists
            .iter_mut()
            .find(|w| w.id == watchlist_id)
            .and_then(|w| w.items.iter_mut().find(|i| i.id == item_id));
        match item {
            Some(item) => {
                item.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_item(&self, watchlist_id: &str, item_id: &str) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let Some(watchlist) = tables.watchlists.iter_mut().find(|w| w.id == watchlist_id) else {
            return Ok(false);
        };
        let before = watchlist.items.len();
        watchlist.items.retain(|i| i.id != item_id);
        Ok(watchlist.items.len() != before)
    }
}
