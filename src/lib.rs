//! Emotionally intelligent task management backend.
//!
//! EmotiTask serves a JSON API for tasks, projects, goals and user profiles,
//! plus a chat advisor that answers with empathetic replies and task
//! suggestions. Every record is owned by one user and every read or write is
//! scoped to the authenticated caller.
//!
//! # Architecture
//!
//! - **Storage**: Supabase PostgREST tables, or a bounded in-memory store in
//!   debug builds without credentials. Chosen once at startup.
//! - **Auth**: bearer tokens verified against the Supabase identity provider
//! - **Chat**: OpenAI chat completions when a key is configured, keyword-matched
//!   canned replies otherwise
//! - **Transport**: axum HTTP server under `/api/v1`
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`models`]: Entity records, creation payloads and partial updates
//! - [`store`]: Storage interface with remote and in-memory backends
//! - [`data`]: Data access facade: ids, timestamps and validation
//! - [`auth`]: Identity gate and identity provider client
//! - [`chat`]: Chat advisor replies and suggestions
//! - [`routes`]: HTTP handlers and router

pub mod auth;
pub mod chat;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod routes;
pub mod server;
pub mod store;
