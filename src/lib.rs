//! streamhub - content-sharing backend
//!
//! The core of the service is the credential and session-token lifecycle:
//! account creation with one-way password protection, login/logout, token
//! issuance, refresh rotation over each account's single session slot, and
//! the deletion flow that coordinates session invalidation with removal of
//! externally hosted media.

pub mod account;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod media;
pub mod password;
pub mod server;
pub mod token;
