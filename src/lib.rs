//! ghosttag - call-data tag embedding and block-scanning detector
//!
//! Senders append `"ghosttag" ‖ tag ‖ payload` to transaction call data through
//! the [`proxy`] wrappers; the [`detector`] watches new blocks for that suffix
//! and reports each match as a [`types::TaggedEvent`].

pub mod cli;
pub mod codec;
pub mod config;
pub mod detector;
pub mod errors;
pub mod proxy;
pub mod rpc;
pub mod types;
pub mod utils;
