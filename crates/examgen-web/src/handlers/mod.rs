pub mod analyze;
pub mod chat;
pub mod download;
pub mod generate;
