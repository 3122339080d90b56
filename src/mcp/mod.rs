// src/mcp/mod.rs

pub mod handler;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod tools;

pub use handler::McpHandler;
