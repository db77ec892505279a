// src/models/mod.rs

pub mod account;
pub mod question;
pub mod user_stats;
