use anyhow::{Context, Result};
use std::path::Path;

use odb_format::{MAJOR_ODB, MINOR_ODB, detect_version, preflight::ensure_present};

pub(crate) fn run(input: &Path) -> Result<()> {
    ensure_present(input, [MAJOR_ODB, MINOR_ODB])?;
    let d = detect_version(&input.join(MAJOR_ODB), &input.join(MINOR_ODB))
        .with_context(|| format!("detect {}", input.display()))?;

    println!("version={}", d.version);
    println!("major_tables={}", d.major_tables);
    println!("minor_tables={}", d.minor_tables);
    Ok(())
}
