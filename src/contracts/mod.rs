// src/contracts/mod.rs
pub mod identity_registry;
