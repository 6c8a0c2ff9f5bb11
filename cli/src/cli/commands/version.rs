//! Version command.

use crate::error::Result;

/// Print version information.
pub fn execute(json: bool) -> Result<()> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    if json {
        let output = serde_json::json!({
            "name": name,
            "version": version,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{name} {version}");
    }
    Ok(())
}
