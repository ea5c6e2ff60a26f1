//! flower-ai: フォルダ内の花画像を1枚ずつAIで識別し、結果を表示・CSV出力する

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod scanner;
pub mod view;
