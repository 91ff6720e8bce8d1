// src/services/mod.rs
pub mod cache;
pub mod csv_history;
pub mod dashboard;
pub mod engine;
pub mod history;
pub mod input;
pub mod pipeline;
pub mod presenter;
pub mod yahoo;
