// src/chat/mod.rs
pub mod client;
pub mod relay;
pub mod sse;
