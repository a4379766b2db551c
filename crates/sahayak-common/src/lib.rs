pub mod api;
pub mod capability;
pub mod embedding;
pub mod error;
pub mod language;
pub mod openai;
pub mod providers;
pub mod redis;
