use std::path::Path;

use titleblock_core::config::builtin;
use titleblock_core::error::TitleBlockError;

use crate::RegionArgs;

pub fn presets() -> Result<(), TitleBlockError> {
    println!("Available predefined regions:\n");
    for name in builtin::PRESETS {
        let preset = builtin::load_preset(name)?;
        let r = preset.region;
        println!(
            "  {:<12} {} {} x {} pt ({})",
            name, r.corner, r.width_inset, r.height_inset, r.containment
        );
        if let Some(ref desc) = preset.description {
            println!("               {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(region: &RegionArgs) -> Result<(), TitleBlockError> {
    let (config, _) = super::resolve(region)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), TitleBlockError> {
    let config = titleblock_core::config::load_config(file)?;

    println!("Config '{}' is valid.", file.display());
    let r = &config.region;
    println!(
        "  Region: {} {} x {} pt ({})",
        r.corner, r.width_inset, r.height_inset, r.containment
    );
    if config.tiff.enabled {
        println!("  TIFF: {}", config.tiff.extensions.join(", "));
    }
    for conv in &config.converters {
        println!("  Converter '{}': {} -> {}", conv.name, conv.extensions.join(", "), conv.program);
    }

    // Warnings, not errors
    let mut warnings = Vec::new();
    if config.converters.is_empty() {
        warnings.push("no CAD converters configured; .slddrw and .dwg files will be skipped".to_string());
    }
    for conv in &config.converters {
        if !conv.args.iter().any(|a| a.contains("{input}")) {
            warnings.push(format!("converter '{}' never passes {{input}} to its program", conv.name));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
