// src/services/mod.rs
pub mod history;
pub mod resolver;
