//! Events CRUD and search API backed by a single SQLite file.

pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod utils;

use db::Database;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}
