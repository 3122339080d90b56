// src/blockchain/mod.rs

pub mod client;
pub mod models;
pub mod networks;

pub use client::UpstreamClient;
pub use models::{UpstreamError, UpstreamResult};
