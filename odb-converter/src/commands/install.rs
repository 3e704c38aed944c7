use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

pub(crate) fn run(source: &Path, target: &Path) -> Result<()> {
    info!(
        "install source={} target={}",
        source.display(),
        target.display()
    );

    if !target.is_dir() {
        anyhow::bail!("Target directory not found: {}", target.display());
    }

    let files = discover_containers(source)?;
    if files.is_empty() {
        warn!("No .odb files found in {}", source.display());
        return Ok(());
    }

    let stamp = Local::now().format("%Y%m%d").to_string();
    let mut installed = 0usize;
    let mut failed = 0usize;

    for from in &files {
        match install_one(from, target, &stamp) {
            Ok(backup) => {
                match backup {
                    Some(b) => info!("installed {} (backup {})", from.display(), b.display()),
                    None => info!("installed {}", from.display()),
                }
                installed += 1;
            }
            Err(e) => {
                error!("failed to install {}: {:?}", from.display(), e);
                failed += 1;
            }
        }
    }

    info!(
        "install complete installed={} failed={} total={}",
        installed,
        failed,
        files.len()
    );

    if failed > 0 {
        anyhow::bail!("{} file(s) failed to install", failed);
    }
    Ok(())
}

fn discover_containers(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_odb = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("odb"));
        if path.is_file() && is_odb {
            files.push(path);
        }
    }
    files.sort_unstable();
    Ok(files)
}

/// Backup name for `name` taken on `stamp` (YYYYMMDD).
fn backup_name(name: &str, stamp: &str) -> String {
    format!("{name}.{stamp}.backup")
}

/// Copies `from` into `target`; an existing file is copied aside first.
fn install_one(from: &Path, target: &Path, stamp: &str) -> Result<Option<PathBuf>> {
    let name = from
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("unusable file name: {}", from.display()))?;
    let dest = target.join(name);

    let backup = if dest.is_file() {
        let b = target.join(backup_name(name, stamp));
        fs::copy(&dest, &b).with_context(|| format!("backup {}", dest.display()))?;
        Some(b)
    } else {
        None
    };

    fs::copy(from, &dest).with_context(|| format!("copy to {}", dest.display()))?;
    Ok(backup)
}
