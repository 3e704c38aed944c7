use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use odb_format::{DecodeOptions, decode_with};

use super::run_with_progress;

pub(crate) fn run(
    input: PathBuf,
    output: PathBuf,
    opts: DecodeOptions,
    progress_every: u8,
) -> Result<()> {
    info!(
        "decode input={} output={} schema={}",
        input.display(),
        output.display(),
        opts.schema
            .map(|v| v.to_string())
            .unwrap_or_else(|| "auto".to_string())
    );

    let ctx = format!("decode {}", input.display());
    run_with_progress("decode", progress_every, move |tx| {
        decode_with(&input, &output, &opts, tx)
    })
    .context(ctx)?;
    Ok(())
}
