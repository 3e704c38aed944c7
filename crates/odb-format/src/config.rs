//! `DatabaseConfig.txt`: the schema a text directory was decoded with.
//!
//! ```text
//! Version=26
//! Table_0=Master.csv
//! MiLBTable_0=MiLBMaster.csv
//! ```

use std::{
    fmt::Write as _,
    fs,
    io,
    path::{Path, PathBuf},
};

use crate::{
    error::{OdbError, OdbResult},
    schema::{Database, MAX_TABLES, SchemaVersion, TableNameList, table_names},
};

pub const CONFIG_FILE_NAME: &str = "DatabaseConfig.txt";

const VERSION_KEY: &str = "Version";
const MAJOR_PREFIX: &str = "Table_";
const MINOR_PREFIX: &str = "MiLBTable_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub version: SchemaVersion,
    pub major: TableNameList,
    pub minor: TableNameList,
}

impl DatabaseConfig {
    /// Registry lists of a known version.
    pub fn for_version(version: SchemaVersion) -> OdbResult<Self> {
        Ok(Self {
            version,
            major: table_names(version, Database::Major)?,
            minor: table_names(version, Database::Minor)?,
        })
    }

    pub fn names(&self, db: Database) -> &TableNameList {
        match db {
            Database::Major => &self.major,
            Database::Minor => &self.minor,
        }
    }

    /// Only named slots are listed; gaps are implied by the indices.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{VERSION_KEY}={}", self.version);
        for (i, name) in self.major.named() {
            let _ = writeln!(out, "{MAJOR_PREFIX}{i}={name}");
        }
        for (i, name) in self.minor.named() {
            let _ = writeln!(out, "{MINOR_PREFIX}{i}={name}");
        }
        out
    }

    pub fn parse(text: &str) -> OdbResult<Self> {
        let mut version = SchemaVersion::Unknown;
        let mut major = Vec::new();
        let mut minor = Vec::new();

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            if key == VERSION_KEY {
                version = value.parse()?;
            } else if let Some(idx) = key.strip_prefix(MINOR_PREFIX) {
                put_slot(&mut minor, idx, value)?;
            } else if let Some(idx) = key.strip_prefix(MAJOR_PREFIX) {
                put_slot(&mut major, idx, value)?;
            }
        }

        Ok(Self {
            version,
            major: TableNameList::new(major)?,
            minor: TableNameList::new(minor)?,
        })
    }

    /// Reads `dir/DatabaseConfig.txt`; `None` when there is no such file.
    pub fn load(dir: &Path) -> OdbResult<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OdbError::file(path, e)),
        }
    }

    pub fn write(&self, dir: &Path) -> OdbResult<PathBuf> {
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, self.to_text()).map_err(|e| OdbError::file(&path, e))?;
        Ok(path)
    }
}

/// Non-numeric indices are ignored like any other unknown key.
fn put_slot(slots: &mut Vec<Option<String>>, idx: &str, name: &str) -> OdbResult<()> {
    let Ok(i) = idx.parse::<usize>() else {
        return Ok(());
    };
    if i >= MAX_TABLES {
        return Err(OdbError::Config(format!(
            "table index {i} does not fit a one byte table index"
        )));
    }
    if slots.len() <= i {
        slots.resize(i + 1, None);
    }
    slots[i] = Some(name.to_owned());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form_round_trips() {
        for version in SchemaVersion::KNOWN {
            let cfg = DatabaseConfig::for_version(version).unwrap();
            let back = DatabaseConfig::parse(&cfg.to_text()).unwrap();
            assert_eq!(back.version, version);
            assert_eq!(
                back.major.named().collect::<Vec<_>>(),
                cfg.major.named().collect::<Vec<_>>()
            );
            assert_eq!(
                back.minor.named().collect::<Vec<_>>(),
                cfg.minor.named().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn gaps_are_rebuilt_from_indices() {
        let cfg = DatabaseConfig::parse(
            "Version=22\r\nTable_0=Master.csv\r\nTable_3=Pitching.csv\r\nMiLBTable_1=MiLBBatting.csv\r\n",
        )
        .unwrap();
        assert_eq!(cfg.version, SchemaVersion::V22);
        assert_eq!(cfg.major.len(), 4);
        assert_eq!(cfg.major.get(1), None);
        assert_eq!(cfg.major.get(3), Some("Pitching.csv"));
        assert_eq!(cfg.names(Database::Minor).get(1), Some("MiLBBatting.csv"));
    }

    #[test]
    fn junk_lines_are_ignored() {
        let cfg = DatabaseConfig::parse(
            "# comment\nWhatever=1\nTable_x=Nope.csv\n\n Table_0 = Master.csv \n",
        )
        .unwrap();
        assert_eq!(cfg.version, SchemaVersion::Unknown);
        assert_eq!(cfg.major.len(), 1);
        assert_eq!(cfg.major.get(0), Some("Master.csv"));
        assert!(cfg.minor.is_empty());
    }

    #[test]
    fn rejects_bad_index_and_version() {
        assert!(matches!(
            DatabaseConfig::parse("Table_256=Big.csv"),
            Err(OdbError::Config(_))
        ));
        assert!(matches!(
            DatabaseConfig::parse("Version=18"),
            Err(OdbError::Config(_))
        ));
    }

    #[test]
    fn load_and_write() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DatabaseConfig::load(dir.path()).unwrap().is_none());

        let cfg = DatabaseConfig::for_version(SchemaVersion::V19).unwrap();
        let path = cfg.write(dir.path()).unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));

        let back = DatabaseConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(back.version, SchemaVersion::V19);
        assert_eq!(back.major.get(22), Some("RecordsSingleGame.csv"));
        assert_eq!(back.major.get(21), None);
    }
}
