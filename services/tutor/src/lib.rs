pub mod config;
pub mod prompt_loader;
pub mod replay_adapter;
