pub mod app;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod omdb;
pub mod store;
pub mod tmdb;
pub mod users;
pub mod watchlists;
