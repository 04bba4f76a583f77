//! ghosttag - Type System
//!
//! - `chain`: blocks, transactions and receipts as the detector and proxy see them
//! - `event`: `TaggedEvent`, the detector's output unit

mod chain;
mod event;

pub use chain::*;
pub use event::*;
