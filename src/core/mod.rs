// src/core/mod.rs
pub mod hypothesis;
pub mod language_model;
pub mod parameter;
pub mod phrase_table;
pub mod sentence;
pub mod static_data;
pub mod translation_options;
pub mod types;
