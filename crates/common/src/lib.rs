//! Common types shared by the promo harvester crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
