//! Access tokens issued by the MVola token endpoint.

pub mod record;
pub mod secret;
pub mod seed;
