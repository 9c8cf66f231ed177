pub mod config;
pub mod detection;
pub mod error;
pub mod imaging;
pub mod ingredients;
pub mod net;
pub mod recipes;
pub mod server;

pub use error::{Error, Result};
