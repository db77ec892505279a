// src/stats/mod.rs

pub mod engine;
pub mod repository;

pub use repository::StatsRepository;
