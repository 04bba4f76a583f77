//! Small shared helpers

pub mod currency;
pub mod time;
