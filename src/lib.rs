pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod selector;
pub mod session;
pub mod ui;
pub mod zobrist;
