//! Directory level pipelines: a folder of text files in, a folder of
//! containers out, and back.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    config::DatabaseConfig,
    error::{OdbError, OdbResult},
    mux::{MuxStats, decode_tables, encode_single_table, encode_tables},
    preflight::ensure_present,
    progress::{
        DECODE_PROGRESS_BYTES, ENCODE_PROGRESS_LINES, ProgressSink, ProgressTracker,
        count_lines, count_table_lines,
    },
    reader::ContainerReader,
    schema::{
        CONTAINER_FILES, Database, LINEUPS_CSV, LINEUPS_ODB, MAJOR_ODB, MINOR_ODB,
        SchemaVersion, TRANSACTIONS_CSV, TRANSACTIONS_ODB, TableNameList, external_names,
    },
    sniff::{Detection, detect_version},
};

#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Use the registry lists of this version instead of `DatabaseConfig.txt`.
    pub schema: Option<SchemaVersion>,
    /// Copy the overlay text files the active lists name next to the containers.
    pub copy_external: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            schema: None,
            copy_external: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Skip sniffing and decode with this version's lists.
    pub schema: Option<SchemaVersion>,
    /// Give reserved slots a placeholder file name instead of failing on them.
    pub keep_unknown: bool,
    pub write_config: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            schema: None,
            keep_unknown: false,
            write_config: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub version: SchemaVersion,
    pub records: u64,
    pub tables: usize,
}

/// Text directory to containers, default options.
pub fn start_encode<S: ProgressSink>(
    src: &Path,
    dst: &Path,
    sink: S,
) -> OdbResult<ConversionSummary> {
    encode_with(src, dst, &EncodeOptions::default(), sink)
}

/// Containers to text directory, default options.
pub fn start_decode<S: ProgressSink>(
    src: &Path,
    dst: &Path,
    sink: S,
) -> OdbResult<ConversionSummary> {
    decode_with(src, dst, &DecodeOptions::default(), sink)
}

/// Explicit schema, then `DatabaseConfig.txt` in `src`, then the newest release.
fn resolve_encode_config(src: &Path, schema: Option<SchemaVersion>) -> OdbResult<DatabaseConfig> {
    if let Some(version) = schema {
        return DatabaseConfig::for_version(version);
    }
    match DatabaseConfig::load(src)? {
        Some(cfg) => {
            debug!(version = %cfg.version, "using table names from {}", src.display());
            Ok(cfg)
        }
        None => DatabaseConfig::for_version(SchemaVersion::LATEST),
    }
}

fn required_inputs(cfg: &DatabaseConfig) -> Vec<String> {
    cfg.major
        .named()
        .chain(cfg.minor.named())
        .map(|(_, name)| name)
        .chain([LINEUPS_CSV, TRANSACTIONS_CSV])
        .map(str::to_owned)
        .collect()
}

/// Overlay files named by the active lists. Layouts that predate an overlay
/// neither require nor receive it.
fn overlay_names(cfg: &DatabaseConfig) -> Vec<&'static str> {
    external_names()
        .iter()
        .copied()
        .filter(|ext| cfg.major.named().chain(cfg.minor.named()).any(|(_, n)| n == *ext))
        .collect()
}

fn saturating_rows(lines: u64) -> u32 {
    u32::try_from(lines).unwrap_or(u32::MAX)
}

fn create_dir(dir: &Path) -> OdbResult<()> {
    fs::create_dir_all(dir).map_err(|e| OdbError::file(dir, e))
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

pub fn encode_with<S: ProgressSink>(
    src: &Path,
    dst: &Path,
    opts: &EncodeOptions,
    sink: S,
) -> OdbResult<ConversionSummary> {
    let cfg = resolve_encode_config(src, opts.schema)?;
    ensure_present(src, required_inputs(&cfg))?;
    create_dir(dst)?;

    let major_lines = count_table_lines(&cfg.major, src)?;
    let minor_lines = count_table_lines(&cfg.minor, src)?;
    let lineups_lines = count_lines(&src.join(LINEUPS_CSV))?;
    let transactions_lines = count_lines(&src.join(TRANSACTIONS_CSV))?;
    let total = major_lines + minor_lines + lineups_lines + transactions_lines;

    info!(
        version = %cfg.version,
        lines = total,
        "encoding {} -> {}",
        src.display(),
        dst.display()
    );

    let mut tracker = ProgressTracker::new(sink, total, ENCODE_PROGRESS_LINES);
    let mut records = 0u64;

    records += encode_tables(
        &cfg.major,
        src,
        &dst.join(MAJOR_ODB),
        saturating_rows(major_lines),
        &mut tracker,
    )?;
    records += encode_tables(
        &cfg.minor,
        src,
        &dst.join(MINOR_ODB),
        saturating_rows(minor_lines),
        &mut tracker,
    )?;
    records += encode_single_table(
        LINEUPS_CSV,
        src,
        &dst.join(LINEUPS_ODB),
        saturating_rows(lineups_lines),
        &mut tracker,
    )?;
    records += encode_single_table(
        TRANSACTIONS_CSV,
        src,
        &dst.join(TRANSACTIONS_ODB),
        saturating_rows(transactions_lines),
        &mut tracker,
    )?;

    if opts.copy_external {
        copy_external_files(src, dst, &overlay_names(&cfg))?;
    }
    cfg.write(dst)?;
    tracker.complete(TRANSACTIONS_ODB);

    let tables = cfg.major.named().count() + cfg.minor.named().count() + 2;
    info!(records, tables, "encode finished");
    Ok(ConversionSummary {
        version: cfg.version,
        records,
        tables,
    })
}

/// Overlay files are authoritative, so existing copies in `dst` are replaced.
fn copy_external_files(src: &Path, dst: &Path, names: &[&str]) -> OdbResult<()> {
    if same_dir(src, dst) {
        debug!("source and destination are the same directory, overlay copy skipped");
        return Ok(());
    }
    for name in names {
        let from = src.join(name);
        fs::copy(&from, dst.join(name)).map_err(|e| OdbError::file(&from, e))?;
    }
    Ok(())
}

pub fn decode_with<S: ProgressSink>(
    src: &Path,
    dst: &Path,
    opts: &DecodeOptions,
    sink: S,
) -> OdbResult<ConversionSummary> {
    ensure_present(src, CONTAINER_FILES)?;

    let detection = match opts.schema {
        Some(version) => Detection::known(version)?,
        None => detect_version(
            &src.join(Database::Major.container_name()),
            &src.join(Database::Minor.container_name()),
        )?,
    };
    let mut major = detection.table_names(Database::Major)?;
    let mut minor = detection.table_names(Database::Minor)?;
    if opts.keep_unknown {
        major = major.with_placeholders(Database::Major);
        minor = minor.with_placeholders(Database::Minor);
    }

    create_dir(dst)?;

    let sizes = CONTAINER_FILES
        .iter()
        .map(|name| {
            let path = src.join(name);
            fs::metadata(&path)
                .map(|m| m.len())
                .map_err(|e| OdbError::file(path, e))
        })
        .collect::<OdbResult<Vec<u64>>>()?;
    let total: u64 = sizes.iter().sum();

    info!(
        version = %detection.version,
        bytes = total,
        "decoding {} -> {}",
        src.display(),
        dst.display()
    );

    let mut tracker = ProgressTracker::new(sink, total, DECODE_PROGRESS_BYTES);
    let lineups = TableNameList::single(LINEUPS_CSV);
    let transactions = TableNameList::single(TRANSACTIONS_CSV);
    let lists = [&major, &minor, &lineups, &transactions];

    let mut base = 0u64;
    let mut stats: Vec<MuxStats> = Vec::with_capacity(lists.len());
    for ((container, names), size) in CONTAINER_FILES.iter().zip(lists).zip(&sizes) {
        let path = src.join(container);
        let mut reader = ContainerReader::open(&path)?;
        let s = decode_tables(&mut reader, names, dst, &mut tracker, base)
            .map_err(|e| e.at(&path))?;
        debug!(
            container,
            declared = reader.declared_rows(),
            records = s.records,
            tables = s.table_count(),
            "container decoded"
        );
        stats.push(s);
        base += size;
    }

    if opts.write_config {
        let cfg = DatabaseConfig {
            version: detection.version,
            major: major.retain(|t| stats[0].wrote(t)),
            minor: minor.retain(|t| stats[1].wrote(t)),
        };
        let path: PathBuf = cfg.write(dst)?;
        debug!("wrote {}", path.display());
    }
    tracker.complete(TRANSACTIONS_CSV);

    let records = stats.iter().map(|s| s.records).sum();
    let tables = stats.iter().map(MuxStats::table_count).sum();
    info!(records, tables, "decode finished");
    Ok(ConversionSummary {
        version: detection.version,
        records,
        tables,
    })
}
