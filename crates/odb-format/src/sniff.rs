//! Recovers the schema version of a container pair.
//!
//! Containers carry no version tag. Two incidental features differ across
//! releases and are used instead:
//! - column 3 of the first slot 6 row (the header row of a fielding table):
//!   `Glf` for the outfield layout, `teamID` for the combined layout;
//! - whether the major container uses slot 22 or above.
//!
//! When neither pins a version the table counts of both containers are
//! measured and returned as an ad-hoc signature.

use std::{io::Read, path::Path};

use tracing::{debug, info, warn};

use crate::{
    error::{OdbError, OdbResult},
    reader::ContainerReader,
    record::{CONTAINER_DELIMITER, Record, to_text_delimiters},
    schema::{Database, SchemaVersion, TableNameList, table_names},
};

pub const FINGERPRINT_SLOT: u8 = 6;
pub const FINGERPRINT_COLUMN: usize = 3;
pub const MID_GENERATION_SLOT: u8 = 22;

pub const OUTFIELD_MARKER: &str = "Glf";
pub const COMBINED_FIELDING_MARKER: &str = "teamID";

/// Releases sharing the outfield fielding layout, oldest first.
const OUTFIELD_FAMILY: [SchemaVersion; 3] =
    [SchemaVersion::V22, SchemaVersion::V25, SchemaVersion::V26];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fingerprint {
    Outfield,
    CombinedFielding,
    Indeterminate,
}

/// What one pass over a container observed.
#[derive(Debug, Clone, Default)]
pub struct TableScan {
    seen: [u64; 4],
    max_table: Option<u8>,
    fingerprint: Option<Fingerprint>,
    records: u64,
}

impl TableScan {
    #[inline]
    pub fn contains(&self, table: u8) -> bool {
        self.seen[(table >> 6) as usize] & (1u64 << (table & 63)) != 0
    }

    /// Every table index that appeared, ascending.
    pub fn tables(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|&t| self.contains(t))
    }

    /// Highest observed index plus one, 0 for an empty container.
    #[inline]
    pub fn table_count(&self) -> usize {
        self.max_table.map_or(0, |t| t as usize + 1)
    }

    #[inline]
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }

    #[inline]
    pub fn records(&self) -> u64 {
        self.records
    }

    fn observe(&mut self, record: &Record) -> OdbResult<()> {
        let t = record.table;
        self.seen[(t >> 6) as usize] |= 1u64 << (t & 63);
        self.max_table = Some(self.max_table.map_or(t, |m| m.max(t)));
        self.records += 1;

        if t == FINGERPRINT_SLOT && self.fingerprint.is_none() {
            let fp = fingerprint_of(record)?;
            debug!(?fp, slot = FINGERPRINT_SLOT, "fingerprint row");
            self.fingerprint = Some(fp);
        }
        Ok(())
    }
}

/// `record` is raw: columns are split on the stored tab so a comma inside a
/// field does not shift them.
fn fingerprint_of(record: &Record) -> OdbResult<Fingerprint> {
    let column = record
        .columns(CONTAINER_DELIMITER)
        .nth(FINGERPRINT_COLUMN)
        .ok_or_else(|| {
            let mut text = record.clone();
            to_text_delimiters(&mut text.line);
            OdbError::MissingColumn(text.line_lossless())
        })?;

    Ok(if column.eq_ignore_ascii_case(OUTFIELD_MARKER.as_bytes()) {
        Fingerprint::Outfield
    } else if column.eq_ignore_ascii_case(COMBINED_FIELDING_MARKER.as_bytes()) {
        Fingerprint::CombinedFielding
    } else {
        Fingerprint::Indeterminate
    })
}

/// Streams `reader` to EOF, recording table usage and the slot 6 fingerprint.
pub fn scan_container<R: Read>(reader: &mut ContainerReader<R>) -> OdbResult<TableScan> {
    let mut scan = TableScan::default();
    let mut record = Record::default();
    while reader.read_raw_record_into(&mut record)? {
        scan.observe(&record)?;
    }
    Ok(scan)
}

/// Version implied by a scan of the major container.
pub fn classify(scan: &TableScan) -> SchemaVersion {
    match scan.fingerprint {
        Some(Fingerprint::Outfield) => outfield_release(scan),
        _ if scan.max_table.is_some_and(|t| t >= MID_GENERATION_SLOT) => SchemaVersion::V19,
        Some(Fingerprint::CombinedFielding) => SchemaVersion::V17,
        _ => SchemaVersion::Unknown,
    }
}

/// Oldest outfield-layout release that names every slot the container uses.
fn outfield_release(scan: &TableScan) -> SchemaVersion {
    OUTFIELD_FAMILY
        .into_iter()
        .find(|&v| {
            table_names(v, Database::Major)
                .map(|names| scan.tables().all(|t| names.get(t).is_some()))
                .unwrap_or(false)
        })
        .unwrap_or(SchemaVersion::LATEST)
}

/// Result of sniffing a container pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub version: SchemaVersion,
    pub major_tables: usize,
    pub minor_tables: usize,
}

impl Detection {
    /// Table counts taken from the registry.
    pub fn known(version: SchemaVersion) -> OdbResult<Self> {
        Ok(Self {
            version,
            major_tables: table_names(version, Database::Major)?.len(),
            minor_tables: table_names(version, Database::Minor)?.len(),
        })
    }

    /// Registry names for a known version, placeholder names sized by the
    /// measured counts otherwise.
    pub fn table_names(&self, db: Database) -> OdbResult<TableNameList> {
        if self.version.is_known() {
            return table_names(self.version, db);
        }
        let count = match db {
            Database::Major => self.major_tables,
            Database::Minor => self.minor_tables,
        };
        TableNameList::placeholders(count, db)
    }
}

/// Sniffs the version of the major container at `major`, measuring `minor`
/// too when the major container gives no usable signal.
pub fn detect_version(major: &Path, minor: &Path) -> OdbResult<Detection> {
    let mut reader = ContainerReader::open(major)?;
    let scan = scan_container(&mut reader).map_err(|e| e.at(major))?;
    let version = classify(&scan);

    if version.is_known() {
        let detection = Detection::known(version)?;
        info!(
            %version,
            records = scan.records(),
            tables = scan.table_count(),
            "detected schema from {}",
            major.display()
        );
        return Ok(detection);
    }

    let mut minor_reader = ContainerReader::open(minor)?;
    let minor_scan = scan_container(&mut minor_reader).map_err(|e| e.at(minor))?;
    let detection = Detection {
        version: SchemaVersion::Unknown,
        major_tables: scan.table_count(),
        minor_tables: minor_scan.table_count(),
    };
    warn!(
        major_tables = detection.major_tables,
        minor_tables = detection.minor_tables,
        "schema not recognised, falling back to placeholder table names"
    );
    Ok(detection)
}
