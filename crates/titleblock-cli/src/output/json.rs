use serde::Serialize;
use titleblock_core::error::TitleBlockError;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), TitleBlockError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
