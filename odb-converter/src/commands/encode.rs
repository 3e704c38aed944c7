use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use odb_format::{EncodeOptions, encode_with};

use super::run_with_progress;

pub(crate) fn run(
    input: PathBuf,
    output: PathBuf,
    opts: EncodeOptions,
    progress_every: u8,
) -> Result<()> {
    info!(
        "encode input={} output={} copy_external={}",
        input.display(),
        output.display(),
        opts.copy_external
    );

    let ctx = format!("encode {}", input.display());
    run_with_progress("encode", progress_every, move |tx| {
        encode_with(&input, &output, &opts, tx)
    })
    .context(ctx)?;
    Ok(())
}
