use crate::codec::{decode_payload, locate_marker, parse_payload, tag_to_hex};
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use clap::Args;
use serde_json::json;
use tracing::info;

/// Locate a tag in call data and decode the payload after it
#[derive(Args)]
pub struct DecodeCommand {
    /// Call data hex (transaction input)
    #[arg(long)]
    pub input: String,

    /// Tag to search for (defaults to the configured detector tag)
    #[arg(long)]
    pub tag: Option<String>,

    /// Payload keys to extract
    #[arg(long, value_delimiter = ',')]
    pub keys: Vec<String>,
}

impl DecodeCommand {
    pub fn run(&self) -> AppResult<()> {
        match self.decode()? {
            Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
            None => println!("No tag found"),
        }
        Ok(())
    }

    /// JSON summary of the match, `None` when the tag is absent
    pub fn decode(&self) -> AppResult<Option<serde_json::Value>> {
        let detector = AppConfig::get_defaults().detector;
        let tag = self.tag.clone().unwrap_or(detector.tag);
        if tag.is_empty() {
            return Err(AppError::Config(
                "No tag given; pass --tag or set detector.tag".to_string(),
            ));
        }
        let keys = if self.keys.is_empty() {
            detector.data_keys
        } else {
            self.keys.clone()
        };

        let Some(offset) = locate_marker(&self.input, &tag_to_hex(&tag)) else {
            info!("Tag '{}' not present in input", tag);
            return Ok(None);
        };

        let payload_hex = self.input.get(offset..).unwrap_or("");
        let payload = decode_payload(payload_hex)?;
        let parsed = parse_payload(&payload, &keys);

        Ok(Some(json!({
            "tag": tag,
            "offset": offset,
            "data_hex": format!("0x{}", payload_hex),
            "data_str": payload,
            "parsed_data": parsed,
        })))
    }
}
