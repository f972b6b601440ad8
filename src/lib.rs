// src/lib.rs

pub mod chat;
pub mod config;
pub mod error;
pub mod provider;
pub mod server;
