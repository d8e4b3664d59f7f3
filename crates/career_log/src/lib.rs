pub mod config;
pub mod daily_log;
pub mod error;
pub mod fixtures;
pub mod llm;
pub mod report;
pub mod server;
pub mod state;
pub mod storage;
