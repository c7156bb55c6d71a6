// src/lib.rs

pub mod browser;
pub mod collect;
pub mod combine;
pub mod config;
pub mod discover;
pub mod error;
pub mod run;
pub mod store;
pub mod table;
