//! # Courtside
//!
//! A server-rendered web application for publishing and browsing tennis
//! sessions, built on [`axum`], [`tower-sessions`](https://crates.io/crates/tower-sessions)
//! and [Sea-ORM](https://crates.io/crates/sea-orm).
//!
//! ## Features
//!
//! - Server-side sessions persisted through Sea-ORM ([`store::SeaOrmStore`])
//!   with signed cookies and sliding expiry
//! - CSRF protection with per-request masked tokens
//! - Templates compiled once at startup ([`templates::TemplateCache`])
//! - Form validation that collects every error for re-rendering
//! - Signup and login with Argon2 password hashing
//! - SQLite by default, PostgreSQL with the `postgres` feature
//!
//! ## Assembling the application
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use courtside::config::AppConfig;
//! use courtside::models::{TennisSessionModel, UserModel};
//! use courtside::store::SeaOrmStore;
//! use courtside::templates::{Helpers, TemplateCache};
//! use courtside::web::{self, AppState};
//! use sea_orm::Database;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cfg = AppConfig::load()?;
//! let db = Database::connect(cfg.database_url.as_str()).await?;
//!
//! let state = AppState::new(
//!     Arc::new(UserModel::new(db.clone())),
//!     Arc::new(TennisSessionModel::new(db.clone())),
//!     Arc::new(TemplateCache::build(&cfg.templates_dir, &Helpers::standard())?),
//! );
//! let app = web::app(state, SeaOrmStore::new(db), &cfg.session_settings()?, &cfg.static_dir);
//!
//! let listener = tokio::net::TcpListener::bind(cfg.addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod forms;
pub mod migration;
pub mod models;
pub mod store;
pub mod templates;
pub mod web;

pub use error::AppError;
pub use store::SeaOrmStore;
