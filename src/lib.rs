//! recipeshare: a recipe sharing backend.
//!
//! Users register and log in with JWTs, publish recipes with a photo, comment
//! on and rate them, and keep a favorites list. Documents live either in a
//! single JSON file or in PostgreSQL. Cross-origin access is governed by an
//! [`cors::OriginMatcher`] built from a comma-separated pattern list.

pub mod admin;
pub mod auth;
pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod util;
