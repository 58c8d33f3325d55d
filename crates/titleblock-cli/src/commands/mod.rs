pub mod config;
pub mod convert;
pub mod extract;
pub mod run;

use std::path::Path;

use titleblock_core::batch::BatchOptions;
use titleblock_core::config::schema::Config;
use titleblock_core::config::{builtin, load_config, validate_config};
use titleblock_core::error::TitleBlockError;
use titleblock_core::model::{Containment, Corner, RegionSpec};

use crate::{BatchArgs, RegionArgs};

/// Load the config file, or the defaults when none is given.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, TitleBlockError> {
    match path {
        Some(p) => load_config(p),
        None => Ok(Config::default()),
    }
}

/// Resolve the effective config and region: config file first, then the
/// preset, then individual flags.
pub fn resolve(args: &RegionArgs) -> Result<(Config, RegionSpec), TitleBlockError> {
    let mut config = load_or_default(args.config.as_deref())?;
    let mut spec = config.region;

    if let Some(ref name) = args.preset {
        spec = builtin::load_preset(name)?.region;
    }

    if let Some(ref corner) = args.corner {
        spec.corner = Corner::from_str_loose(corner).ok_or_else(|| {
            TitleBlockError::ConfigInvalid(format!(
                "unknown corner '{corner}' (expected bottom-right, bottom-left, top-right or top-left)"
            ))
        })?;
    }
    if let Some(w) = args.width_inset {
        spec.width_inset = w;
    }
    if let Some(h) = args.height_inset {
        spec.height_inset = h;
    }
    if let Some(ref c) = args.containment {
        spec.containment = Containment::from_str_loose(c).ok_or_else(|| {
            TitleBlockError::ConfigInvalid(format!(
                "unknown containment '{c}' (expected full-box or corner-point)"
            ))
        })?;
    }

    config.region = spec;
    validate_config(&config)?;
    Ok((config, spec))
}

impl From<&BatchArgs> for BatchOptions {
    fn from(args: &BatchArgs) -> Self {
        BatchOptions {
            recursive: args.recursive,
            out_dir: args.out_dir.clone(),
        }
    }
}
