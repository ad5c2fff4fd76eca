//! Wire and domain types shared between the front-desk client core and its hosts.

pub mod domain;
pub mod error;
pub mod protocol;
