use crate::config::schema::RegionPreset;
use crate::error::TitleBlockError;

const TITLE_BLOCK_JSON: &str = include_str!("../../../../presets/title-block.json");
const COMPACT_JSON: &str = include_str!("../../../../presets/compact.json");

/// Available predefined regions.
pub const PRESETS: &[&str] = &["title-block", "compact"];

/// Load a predefined region by name.
pub fn load_preset(name: &str) -> Result<RegionPreset, TitleBlockError> {
    let json = match name {
        "title-block" => TITLE_BLOCK_JSON,
        "compact" => COMPACT_JSON,
        _ => {
            return Err(TitleBlockError::ConfigInvalid(format!(
                "unknown preset '{}'. Available: {}",
                name,
                PRESETS.join(", ")
            )))
        }
    };
    let preset: RegionPreset = serde_json::from_str(json)?;
    Ok(preset)
}
