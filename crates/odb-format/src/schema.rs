//! Schema registry: which text file lives in which table slot, per release.
//!
//! Slot numbers are the table index byte written in every container record.
//! The same slot has meant different tables across releases, so each version
//! keeps its own pair of lists (major league, minor league).

use std::{fmt, str::FromStr};

use rustc_hash::FxHashSet;

use crate::error::{OdbError, OdbResult};

/// A table index is one byte wide.
pub const MAX_TABLES: usize = 256;

pub const LINEUPS_CSV: &str = "Lineups.csv";
pub const TRANSACTIONS_CSV: &str = "Transactions.csv";

pub const MAJOR_ODB: &str = "historical_database.odb";
pub const MINOR_ODB: &str = "historical_minor_database.odb";
pub const LINEUPS_ODB: &str = "historical_lineups.odb";
pub const TRANSACTIONS_ODB: &str = "historical_transactions.odb";

/// The four physical containers, in conversion order.
pub const CONTAINER_FILES: [&str; 4] = [MAJOR_ODB, MINOR_ODB, LINEUPS_ODB, TRANSACTIONS_ODB];

const MASTER: &str = "Master.csv";
const BATTING: &str = "Batting.csv";
const BATTING2: &str = "Batting2.csv";
const PITCHING: &str = "Pitching.csv";
const PITCHING2: &str = "Pitching2.csv";
const FIELDING: &str = "Fielding.csv";
const FIELDING2: &str = "Fielding2.csv";
const FIELDING_OF: &str = "FieldingOF.csv";
const FIELDING_OF2: &str = "FieldingOF2.csv";
const ALLSTAR_FULL: &str = "AllstarFull.csv";
const AWARDS_PLAYERS: &str = "AwardsPlayers.csv";
const HALL_OF_FAME: &str = "HallOfFame.csv";
const TEAMS: &str = "Teams.csv";
const TEAM_FRANCHISES: &str = "TeamFranchises.csv";
const SERIES_POST: &str = "SeriesPost.csv";
const UNI_NUMBERS: &str = "UniNumbers.csv";
const MANAGERS: &str = "Managers.csv";
const AWARDS_MANAGERS: &str = "AwardsManagers.csv";
const BATTING_POST: &str = "BattingPost.csv";
const PITCHING_POST: &str = "PitchingPost.csv";
const FIELDING_POST: &str = "FieldingPost.csv";
const WS_ROSTERS: &str = "WSRosters.csv";
const RECORDS_SINGLE_GAME: &str = "RecordsSingleGame.csv";
const BATTING_SPLITS: &str = "BattingSplits.csv";
const OD_ROSTERS: &str = "ODRosters.csv";
const EOS_ROSTERS: &str = "EOSRosters.csv";
const PITCHING_SPLITS: &str = "PitchingSplits.csv";
const FIELDING_RATINGS: &str = "FieldingRatings.csv";
const PITCHING_RATINGS: &str = "PitchingRatings.csv";
const NEGRO_LEAGUE_BATTING: &str = "NegroLeagueBatting.csv";
const NEGRO_LEAGUE_PITCHING: &str = "NegroLeaguePitching.csv";
const NEGRO_LEAGUE_FIELDING: &str = "NegroLeagueFielding.csv";

const MILB_MASTER: &str = "MiLBMaster.csv";
const MILB_BATTING: &str = "MiLBBatting.csv";
const MILB_PITCHING: &str = "MiLBPitching.csv";
const MILB_FIELDING: &str = "MiLBFielding.csv";
const MILB_TEAMS: &str = "MiLBTeams.csv";
const MILB_LEAGUES: &str = "MiLBLeagues.csv";

/// Files that also exist outside the containers as user-editable overrides.
const EXTERNAL: [&str; 9] = [
    MASTER,
    TEAMS,
    MILB_MASTER,
    MILB_TEAMS,
    MILB_LEAGUES,
    SERIES_POST,
    UNI_NUMBERS,
    OD_ROSTERS,
    EOS_ROSTERS,
];

type Slots = &'static [Option<&'static str>];

const MAJOR_V17: Slots = &[
    Some(MASTER),
    Some(BATTING),
    Some(BATTING2),
    Some(PITCHING),
    Some(PITCHING2),
    Some(FIELDING),
    Some(FIELDING2),
    Some(FIELDING_OF),
    Some(FIELDING_OF2),
    Some(ALLSTAR_FULL),
    Some(AWARDS_PLAYERS),
    Some(HALL_OF_FAME),
    Some(TEAMS),
    Some(TEAM_FRANCHISES),
    Some(SERIES_POST),
    Some(UNI_NUMBERS),
    Some(MANAGERS),
    Some(AWARDS_MANAGERS),
    Some(BATTING_POST),
    Some(PITCHING_POST),
    Some(WS_ROSTERS),
];

const MAJOR_V19: Slots = &[
    Some(MASTER),
    Some(BATTING),
    Some(BATTING2),
    Some(PITCHING),
    Some(PITCHING2),
    Some(FIELDING),
    Some(FIELDING2),
    Some(FIELDING_OF),
    Some(FIELDING_OF2),
    Some(ALLSTAR_FULL),
    Some(AWARDS_PLAYERS),
    Some(HALL_OF_FAME),
    Some(TEAMS),
    Some(TEAM_FRANCHISES),
    Some(SERIES_POST),
    Some(UNI_NUMBERS),
    Some(MANAGERS),
    Some(AWARDS_MANAGERS),
    Some(BATTING_POST),
    Some(PITCHING_POST),
    Some(FIELDING_POST),
    None,
    Some(RECORDS_SINGLE_GAME),
    Some(BATTING_SPLITS),
    Some(OD_ROSTERS),
    Some(EOS_ROSTERS),
];

const MAJOR_V22: Slots = &[
    Some(MASTER),
    Some(BATTING),
    Some(BATTING2),
    Some(PITCHING),
    Some(PITCHING2),
    Some(FIELDING),
    Some(FIELDING_OF),
    Some(ALLSTAR_FULL),
    Some(AWARDS_PLAYERS),
    Some(HALL_OF_FAME),
    Some(TEAMS),
    Some(TEAM_FRANCHISES),
    Some(SERIES_POST),
    Some(UNI_NUMBERS),
    Some(MANAGERS),
    Some(AWARDS_MANAGERS),
    Some(BATTING_POST),
    Some(PITCHING_POST),
    Some(FIELDING_POST),
    None,
    Some(RECORDS_SINGLE_GAME),
    Some(BATTING_SPLITS),
    Some(OD_ROSTERS),
    Some(EOS_ROSTERS),
    None,
    None,
];

const MAJOR_V25: Slots = &[
    Some(MASTER),
    Some(BATTING),
    Some(BATTING2),
    Some(PITCHING),
    Some(PITCHING2),
    Some(FIELDING),
    Some(FIELDING_OF),
    Some(ALLSTAR_FULL),
    Some(AWARDS_PLAYERS),
    Some(HALL_OF_FAME),
    Some(TEAMS),
    Some(TEAM_FRANCHISES),
    Some(SERIES_POST),
    Some(UNI_NUMBERS),
    Some(MANAGERS),
    Some(AWARDS_MANAGERS),
    Some(BATTING_POST),
    Some(PITCHING_POST),
    Some(FIELDING_POST),
    None,
    Some(RECORDS_SINGLE_GAME),
    Some(BATTING_SPLITS),
    Some(OD_ROSTERS),
    Some(EOS_ROSTERS),
    Some(PITCHING_SPLITS),
    Some(FIELDING_RATINGS),
    Some(PITCHING_RATINGS),
];

const MAJOR_V26: Slots = &[
    Some(MASTER),
    Some(BATTING),
    Some(BATTING2),
    Some(PITCHING),
    Some(PITCHING2),
    Some(FIELDING),
    Some(FIELDING_OF),
    Some(ALLSTAR_FULL),
    Some(AWARDS_PLAYERS),
    Some(HALL_OF_FAME),
    Some(TEAMS),
    Some(TEAM_FRANCHISES),
    Some(SERIES_POST),
    Some(UNI_NUMBERS),
    Some(MANAGERS),
    Some(AWARDS_MANAGERS),
    Some(BATTING_POST),
    Some(PITCHING_POST),
    Some(FIELDING_POST),
    None,
    Some(RECORDS_SINGLE_GAME),
    Some(BATTING_SPLITS),
    Some(OD_ROSTERS),
    Some(EOS_ROSTERS),
    Some(PITCHING_SPLITS),
    Some(FIELDING_RATINGS),
    Some(PITCHING_RATINGS),
    Some(NEGRO_LEAGUE_BATTING),
    Some(NEGRO_LEAGUE_PITCHING),
    Some(NEGRO_LEAGUE_FIELDING),
];

const MINOR_V17: Slots = &[
    Some(MILB_MASTER),
    Some(MILB_BATTING),
    None,
    Some(MILB_PITCHING),
    None,
    Some(MILB_FIELDING),
    None,
    None,
    None,
    None,
    None,
    None,
    Some(MILB_TEAMS),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    Some(MILB_LEAGUES),
];

const MINOR_V22: Slots = &[
    Some(MILB_MASTER),
    Some(MILB_BATTING),
    None,
    Some(MILB_PITCHING),
    None,
    Some(MILB_FIELDING),
    None,
    None,
    None,
    None,
    Some(MILB_TEAMS),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    Some(MILB_LEAGUES),
    None,
    None,
    None,
    None,
    None,
    None,
];

const MINOR_V25: Slots = &[
    Some(MILB_MASTER),
    Some(MILB_BATTING),
    None,
    Some(MILB_PITCHING),
    None,
    Some(MILB_FIELDING),
    None,
    None,
    None,
    None,
    Some(MILB_TEAMS),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    Some(MILB_LEAGUES),
];

/// Release of the container layout. The files carry no version tag, see
/// [`crate::sniff`] for how it is recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaVersion {
    Unknown,
    V17,
    V19,
    V22,
    V25,
    V26,
}

impl SchemaVersion {
    pub const KNOWN: [SchemaVersion; 5] = [
        SchemaVersion::V17,
        SchemaVersion::V19,
        SchemaVersion::V22,
        SchemaVersion::V25,
        SchemaVersion::V26,
    ];

    pub const LATEST: SchemaVersion = SchemaVersion::V26;

    #[inline]
    pub fn is_known(self) -> bool {
        self != SchemaVersion::Unknown
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchemaVersion::Unknown => "unknown",
            SchemaVersion::V17 => "17",
            SchemaVersion::V19 => "19",
            SchemaVersion::V22 => "22",
            SchemaVersion::V25 => "25",
            SchemaVersion::V26 => "26",
        };
        f.write_str(s)
    }
}

impl FromStr for SchemaVersion {
    type Err = OdbError;

    fn from_str(s: &str) -> OdbResult<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unknown") {
            return Ok(SchemaVersion::Unknown);
        }
        let digits = s
            .strip_prefix("ODB_")
            .or_else(|| s.strip_prefix('v'))
            .or_else(|| s.strip_prefix('V'))
            .unwrap_or(s);
        match digits {
            "17" => Ok(SchemaVersion::V17),
            "19" => Ok(SchemaVersion::V19),
            "22" => Ok(SchemaVersion::V22),
            "25" => Ok(SchemaVersion::V25),
            "26" => Ok(SchemaVersion::V26),
            _ => Err(OdbError::Config(format!("unknown schema version {s:?}"))),
        }
    }
}

/// Which of the two multi-table containers a list describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Database {
    Major,
    Minor,
}

impl Database {
    pub fn container_name(self) -> &'static str {
        match self {
            Database::Major => MAJOR_ODB,
            Database::Minor => MINOR_ODB,
        }
    }

    fn placeholder(self, slot: usize) -> String {
        match self {
            Database::Major => format!("Unknown_{}.csv", slot + 1),
            Database::Minor => format!("MiLB_Unknown_{}.csv", slot + 1),
        }
    }
}

/// Ordered file names, one per table slot. `None` marks a slot that exists in
/// the layout but has no text file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableNameList {
    slots: Vec<Option<String>>,
}

impl TableNameList {
    pub fn new(slots: Vec<Option<String>>) -> OdbResult<Self> {
        if slots.len() > MAX_TABLES {
            return Err(OdbError::TooManyTables(slots.len()));
        }
        Ok(Self { slots })
    }

    fn from_static(slots: Slots) -> Self {
        Self {
            slots: slots.iter().map(|s| s.map(str::to_owned)).collect(),
        }
    }

    /// One-table list used for the lineups and transactions containers.
    pub fn single(name: &str) -> Self {
        Self {
            slots: vec![Some(name.to_owned())],
        }
    }

    /// `count` slots, every one named `Unknown_<n>.csv` / `MiLB_Unknown_<n>.csv`.
    pub fn placeholders(count: usize, db: Database) -> OdbResult<Self> {
        Self::new((0..count).map(|i| Some(db.placeholder(i))).collect())
    }

    /// Same slots with every gap given its placeholder name.
    pub fn with_placeholders(&self, db: Database) -> Self {
        let slots = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, s)| Some(s.clone().unwrap_or_else(|| db.placeholder(i))))
            .collect();
        Self { slots }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Name at `table`, `None` for gaps and for slots past the end.
    #[inline]
    pub fn get(&self, table: u8) -> Option<&str> {
        self.slots.get(table as usize)?.as_deref()
    }

    /// Every slot in index order, gaps included.
    pub fn slots(&self) -> impl Iterator<Item = (u8, Option<&str>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| (i as u8, s.as_deref()))
    }

    /// Named slots only, in index order.
    pub fn named(&self) -> impl Iterator<Item = (u8, &str)> + '_ {
        self.slots().filter_map(|(i, s)| s.map(|s| (i, s)))
    }

    /// Keep only the slots for which `keep` returns true; others become gaps.
    /// Trailing gaps are dropped.
    pub fn retain(&self, mut keep: impl FnMut(u8) -> bool) -> Self {
        let mut slots: Vec<Option<String>> = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, s)| s.clone().filter(|_| keep(i as u8)))
            .collect();
        while matches!(slots.last(), Some(None)) {
            slots.pop();
        }
        Self { slots }
    }
}

/// Name list for `version` and `db`.
pub fn table_names(version: SchemaVersion, db: Database) -> OdbResult<TableNameList> {
    let slots = match (version, db) {
        (SchemaVersion::Unknown, _) => return Err(OdbError::UnknownVersion),
        (SchemaVersion::V17, Database::Major) => MAJOR_V17,
        (SchemaVersion::V19, Database::Major) => MAJOR_V19,
        (SchemaVersion::V22, Database::Major) => MAJOR_V22,
        (SchemaVersion::V25, Database::Major) => MAJOR_V25,
        (SchemaVersion::V26, Database::Major) => MAJOR_V26,
        (SchemaVersion::V17 | SchemaVersion::V19, Database::Minor) => MINOR_V17,
        (SchemaVersion::V22, Database::Minor) => MINOR_V22,
        (SchemaVersion::V25 | SchemaVersion::V26, Database::Minor) => MINOR_V25,
    };
    Ok(TableNameList::from_static(slots))
}

/// Text files kept next to the containers as editable overrides.
pub fn external_names() -> &'static [&'static str] {
    &EXTERNAL
}

/// Every text file a conversion may touch, deduplicated, first-seen order.
/// Only meant for existence checks.
pub fn all_text_names(major: &TableNameList, minor: &TableNameList) -> Vec<String> {
    let mut seen = FxHashSet::default();
    major
        .named()
        .chain(minor.named())
        .map(|(_, name)| name)
        .chain(EXTERNAL.iter().copied())
        .chain([LINEUPS_CSV, TRANSACTIONS_CSV])
        .filter(|name| seen.insert(*name))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_lengths_are_fixed_per_version() {
        let expected = [
            (SchemaVersion::V17, 21, 22),
            (SchemaVersion::V19, 26, 22),
            (SchemaVersion::V22, 26, 26),
            (SchemaVersion::V25, 27, 20),
            (SchemaVersion::V26, 30, 20),
        ];
        for (version, major, minor) in expected {
            assert_eq!(table_names(version, Database::Major).unwrap().len(), major);
            assert_eq!(table_names(version, Database::Minor).unwrap().len(), minor);
        }
    }

    #[test]
    fn unknown_version_has_no_names() {
        assert!(matches!(
            table_names(SchemaVersion::Unknown, Database::Major),
            Err(OdbError::UnknownVersion)
        ));
    }

    #[test]
    fn gaps_stay_in_place() {
        let v26 = table_names(SchemaVersion::V26, Database::Major).unwrap();
        assert_eq!(v26.get(6), Some("FieldingOF.csv"));
        assert_eq!(v26.get(19), None);
        assert_eq!(v26.get(20), Some("RecordsSingleGame.csv"));
        assert_eq!(v26.get(30), None);

        let v19 = table_names(SchemaVersion::V19, Database::Major).unwrap();
        assert_eq!(v19.get(6), Some("Fielding2.csv"));
        assert_eq!(v19.get(21), None);
        assert_eq!(v19.get(22), Some("RecordsSingleGame.csv"));

        let minor = table_names(SchemaVersion::V25, Database::Minor).unwrap();
        let named: Vec<u8> = minor.named().map(|(i, _)| i).collect();
        assert_eq!(named, vec![0, 1, 3, 5, 10, 19]);
    }

    #[test]
    fn placeholders_fill_gaps_only() {
        let minor = table_names(SchemaVersion::V17, Database::Minor).unwrap();
        let filled = minor.with_placeholders(Database::Minor);
        assert_eq!(filled.len(), minor.len());
        assert_eq!(filled.get(0), Some("MiLBMaster.csv"));
        assert_eq!(filled.get(2), Some("MiLB_Unknown_3.csv"));

        let unknown = TableNameList::placeholders(3, Database::Major).unwrap();
        assert_eq!(unknown.get(2), Some("Unknown_3.csv"));
        assert!(TableNameList::placeholders(257, Database::Major).is_err());
    }

    #[test]
    fn retain_drops_trailing_gaps() {
        let list = TableNameList::new(vec![
            Some("A.csv".into()),
            Some("B.csv".into()),
            Some("C.csv".into()),
        ])
        .unwrap();
        let kept = list.retain(|i| i == 0);
        assert_eq!(kept.len(), 1);
        let kept = list.retain(|i| i != 1);
        assert_eq!(kept.get(1), None);
        assert_eq!(kept.get(2), Some("C.csv"));
    }

    #[test]
    fn all_text_names_is_deduplicated() {
        let major = table_names(SchemaVersion::V26, Database::Major).unwrap();
        let minor = table_names(SchemaVersion::V26, Database::Minor).unwrap();
        let all = all_text_names(&major, &minor);
        assert_eq!(all.iter().filter(|n| *n == "Master.csv").count(), 1);
        assert!(all.contains(&"Lineups.csv".to_string()));
        assert!(all.contains(&"MiLBLeagues.csv".to_string()));
        // 29 major + 6 minor, every external is already in one of the lists
        assert_eq!(all.len(), 29 + 6 + 2);
    }

    #[test]
    fn version_parse_and_display() {
        for v in SchemaVersion::KNOWN {
            assert_eq!(v.to_string().parse::<SchemaVersion>().unwrap(), v);
        }
        assert_eq!("ODB_22".parse::<SchemaVersion>().unwrap(), SchemaVersion::V22);
        assert_eq!("v19".parse::<SchemaVersion>().unwrap(), SchemaVersion::V19);
        assert!("18".parse::<SchemaVersion>().is_err());
    }
}
