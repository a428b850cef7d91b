pub mod config;
pub mod derive;
pub mod error;
pub mod flag;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod record;
pub mod stats;
pub mod validate;
