pub mod api;
pub mod audit;
pub mod backup;
pub mod cli;
pub mod content;
pub mod email;
pub mod error;
pub mod security;
pub mod settings;

pub use error::Error;
