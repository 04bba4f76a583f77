//! Detector output

use crate::codec::PayloadFields;
use serde::{Deserialize, Serialize};

/// One matching transaction observed by the detector
///
/// Built fresh per match and handed to the callback; the detector keeps no copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaggedEvent {
    pub block_number: u64,
    pub tx_hash: String,
    pub from: String,
    pub to: Option<String>,
    /// Native value in ether. Display only: large wei amounts lose precision.
    pub value: f64,
    /// Block timestamp, unix seconds
    pub timestamp: u64,
    /// `0x`-prefixed hex of everything after the tag
    pub data_hex: String,
    pub data_str: String,
    pub parsed_data: PayloadFields,
}

impl TaggedEvent {
    /// Block timestamp rendered as ISO 8601
    pub fn timestamp_iso(&self) -> String {
        crate::utils::time::timestamp_to_iso(self.timestamp as i64)
    }
}
