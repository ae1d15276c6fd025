//! Credentials, partner identity, and access-token models.

pub mod credential;
pub mod token;

pub use credential::*;
pub use token::{record::*, secret::*, seed::*};
