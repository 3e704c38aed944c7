use anyhow::{Context, Result};
use std::{collections::BTreeMap, path::Path, time::Instant};
use tracing::info;

use odb_format::{ContainerReader, Record};

#[derive(Default, Debug, Clone, Copy)]
pub struct TableStat {
    pub records: u64,
    pub bytes: u64, // payload bytes plus the 3-byte record prefix
}

#[derive(Default, Debug, Clone)]
pub struct ContainerReport {
    pub declared_rows: u32,
    pub records: u64,
    pub file_bytes: u64,
    pub tables: BTreeMap<u8, TableStat>,
}

pub fn inspect_container(path: &Path) -> Result<ContainerReport> {
    info!("inspect input={}", path.display());
    let start = Instant::now();

    let mut reader =
        ContainerReader::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut rep = ContainerReport {
        declared_rows: reader.declared_rows(),
        ..ContainerReport::default()
    };

    let mut record = Record::default();
    while reader
        .read_record_into(&mut record)
        .with_context(|| format!("read {}", path.display()))?
    {
        rep.records += 1;
        let stat = rep.tables.entry(record.table).or_default();
        stat.records += 1;
        stat.bytes += record.encoded_len() as u64;
    }
    rep.file_bytes = reader.bytes_read();

    info!(
        "inspect done records={} tables={} in {:.2}s",
        rep.records,
        rep.tables.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(rep)
}

pub fn print_report(rep: &ContainerReport) {
    let total = rep.file_bytes as f64;
    let pct = |x: u64| {
        if total > 0.0 {
            (x as f64) * 100.0 / total
        } else {
            0.0
        }
    };

    println!("declared_rows={}", rep.declared_rows);
    println!("records={}", rep.records);
    println!("file_bytes={}", rep.file_bytes);
    if u64::from(rep.declared_rows) != rep.records {
        println!("note: declared row count differs from records on disk");
    }
    println!();

    println!("{:>5} {:>12} {:>14} {:>8}", "table", "records", "bytes", "share");
    for (table, stat) in &rep.tables {
        println!(
            "{:>5} {:>12} {:>14} {:>7.2}%",
            table,
            stat.records,
            stat.bytes,
            pct(stat.bytes)
        );
    }
}
