pub use crate::client::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::feedback::*;

mod client;
mod config;
mod error;
mod feedback;
