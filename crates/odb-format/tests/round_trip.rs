use std::{fs, path::Path};

use odb_format::{
    CONTAINER_FILES, ContainerReader, Database, DatabaseConfig, DecodeOptions, EncodeOptions,
    LINEUPS_CSV, MAJOR_ODB, MINOR_ODB, NoProgress, OdbError, SchemaVersion, TRANSACTIONS_CSV,
    decode_with, detect_version, encode_with, external_names, start_decode, start_encode,
    table_names,
};

/// Writes a minimal but complete text tree for `version`, overlay files
/// included. Slot 6 carries the fielding header that tells the releases apart.
fn write_tree(dir: &Path, version: SchemaVersion) {
    let major = table_names(version, Database::Major).unwrap();
    let minor = table_names(version, Database::Minor).unwrap();
    let fielding_header = match version {
        SchemaVersion::V17 | SchemaVersion::V19 => "playerID,yearID,stint,teamID,lgID,POS",
        _ => "playerID,yearID,stint,Glf,Gcf,Grf",
    };

    for (i, name) in major.named() {
        let body = if i == 6 {
            format!("{fielding_header}\r\naaronha01,1954,1,x,y,z\r\n")
        } else {
            format!("col_a,col_b\n{name},{i}\nlast,row")
        };
        fs::write(dir.join(name), body).unwrap();
    }
    for (i, name) in minor.named() {
        fs::write(dir.join(name), format!("milb,{i}\n")).unwrap();
    }
    fs::write(dir.join(LINEUPS_CSV), "team,lineup\nNYA,1\n").unwrap();
    fs::write(dir.join(TRANSACTIONS_CSV), "date,player\n").unwrap();
    for name in external_names() {
        let path = dir.join(name);
        if !path.exists() {
            fs::write(path, "overlay\n").unwrap();
        }
    }
}

fn encode_opts(version: SchemaVersion) -> EncodeOptions {
    EncodeOptions {
        schema: Some(version),
        copy_external: true,
    }
}

#[test]
fn re_encoding_a_decoded_tree_reproduces_the_containers() {
    for version in SchemaVersion::KNOWN {
        let text = tempfile::tempdir().unwrap();
        let odb = tempfile::tempdir().unwrap();
        let decoded = tempfile::tempdir().unwrap();
        let again = tempfile::tempdir().unwrap();
        write_tree(text.path(), version);

        encode_with(text.path(), odb.path(), &encode_opts(version), NoProgress).unwrap();
        let dec = start_decode(odb.path(), decoded.path(), NoProgress).unwrap();
        assert_eq!(dec.version, version, "sniffed version");

        // no explicit schema: the written DatabaseConfig.txt drives the names
        start_encode(decoded.path(), again.path(), NoProgress).unwrap();

        for name in CONTAINER_FILES {
            assert_eq!(
                fs::read(odb.path().join(name)).unwrap(),
                fs::read(again.path().join(name)).unwrap(),
                "{name} differs for version {version}"
            );
        }
    }
}

#[test]
fn decoded_text_is_normalized_to_lf() {
    let text = tempfile::tempdir().unwrap();
    let odb = tempfile::tempdir().unwrap();
    let decoded = tempfile::tempdir().unwrap();
    write_tree(text.path(), SchemaVersion::V26);

    encode_with(text.path(), odb.path(), &encode_opts(SchemaVersion::V26), NoProgress).unwrap();
    start_decode(odb.path(), decoded.path(), NoProgress).unwrap();

    assert_eq!(
        fs::read_to_string(decoded.path().join("FieldingOF.csv")).unwrap(),
        "playerID,yearID,stint,Glf,Gcf,Grf\naaronha01,1954,1,x,y,z\n"
    );
    // a final line without newline gains one
    assert_eq!(
        fs::read_to_string(decoded.path().join("Batting.csv")).unwrap(),
        "col_a,col_b\nBatting.csv,1\nlast,row\n"
    );
}

#[test]
fn header_row_count_is_the_total_line_count() {
    let text = tempfile::tempdir().unwrap();
    let odb = tempfile::tempdir().unwrap();
    write_tree(text.path(), SchemaVersion::V22);
    encode_with(text.path(), odb.path(), &encode_opts(SchemaVersion::V22), NoProgress).unwrap();

    let major = ContainerReader::open(&odb.path().join(MAJOR_ODB)).unwrap();
    let declared = major.declared_rows();
    let records = major.count() as u32;
    assert_eq!(declared, records);
    // 23 named slots, three lines each except slot 6 with two
    assert_eq!(records, 22 * 3 + 2);
}

#[test]
fn detection_follows_the_fingerprints() {
    for version in SchemaVersion::KNOWN {
        let text = tempfile::tempdir().unwrap();
        let odb = tempfile::tempdir().unwrap();
        write_tree(text.path(), version);
        encode_with(text.path(), odb.path(), &encode_opts(version), NoProgress).unwrap();

        let d = detect_version(&odb.path().join(MAJOR_ODB), &odb.path().join(MINOR_ODB)).unwrap();
        assert_eq!(d.version, version);
        assert_eq!(
            d.minor_tables,
            table_names(version, Database::Minor).unwrap().len()
        );
    }
}

#[test]
fn unrecognised_containers_decode_to_placeholders() {
    let text = tempfile::tempdir().unwrap();
    let odb = tempfile::tempdir().unwrap();
    let decoded = tempfile::tempdir().unwrap();

    // three major tables, none in slot 6, and two minor tables
    let cfg = DatabaseConfig::parse(
        "Version=unknown\nTable_0=A.csv\nTable_1=B.csv\nTable_4=E.csv\nMiLBTable_0=M.csv\nMiLBTable_1=N.csv\n",
    )
    .unwrap();
    cfg.write(text.path()).unwrap();
    for name in ["A.csv", "B.csv", "E.csv", "M.csv", "N.csv"] {
        fs::write(text.path().join(name), format!("{name}\n")).unwrap();
    }
    fs::write(text.path().join(LINEUPS_CSV), "l\n").unwrap();
    fs::write(text.path().join(TRANSACTIONS_CSV), "t\n").unwrap();

    start_encode(text.path(), odb.path(), NoProgress).unwrap();

    let dec = start_decode(odb.path(), decoded.path(), NoProgress).unwrap();
    assert_eq!(dec.version, SchemaVersion::Unknown);
    assert_eq!(
        fs::read_to_string(decoded.path().join("Unknown_5.csv")).unwrap(),
        "E.csv\n"
    );
    assert_eq!(
        fs::read_to_string(decoded.path().join("MiLB_Unknown_2.csv")).unwrap(),
        "N.csv\n"
    );
    assert!(!decoded.path().join("Unknown_3.csv").exists());

    let written = DatabaseConfig::load(decoded.path()).unwrap().unwrap();
    assert_eq!(written.version, SchemaVersion::Unknown);
    assert_eq!(written.major.get(4), Some("Unknown_5.csv"));
    assert_eq!(written.major.get(2), None);

    // the placeholder tree encodes back to the same containers
    let again = tempfile::tempdir().unwrap();
    start_encode(decoded.path(), again.path(), NoProgress).unwrap();
    for name in CONTAINER_FILES {
        assert_eq!(
            fs::read(odb.path().join(name)).unwrap(),
            fs::read(again.path().join(name)).unwrap(),
            "{name}"
        );
    }
}

#[test]
fn truncated_container_fails_the_decode() {
    let text = tempfile::tempdir().unwrap();
    let odb = tempfile::tempdir().unwrap();
    let decoded = tempfile::tempdir().unwrap();
    write_tree(text.path(), SchemaVersion::V26);
    encode_with(text.path(), odb.path(), &encode_opts(SchemaVersion::V26), NoProgress).unwrap();

    let lineups = odb.path().join("historical_lineups.odb");
    let mut bytes = fs::read(&lineups).unwrap();
    bytes.truncate(bytes.len() - 2);
    fs::write(&lineups, bytes).unwrap();

    let opts = DecodeOptions {
        schema: Some(SchemaVersion::V26),
        ..DecodeOptions::default()
    };
    let err = decode_with(odb.path(), decoded.path(), &opts, NoProgress).unwrap_err();
    assert!(matches!(err, OdbError::UnexpectedEof(_)), "{err}");
}

#[test]
fn missing_inputs_are_listed_together() {
    let text = tempfile::tempdir().unwrap();
    let odb = tempfile::tempdir().unwrap();
    write_tree(text.path(), SchemaVersion::V25);
    fs::remove_file(text.path().join("PitchingRatings.csv")).unwrap();
    fs::remove_file(text.path().join("MiLBLeagues.csv")).unwrap();

    let err = encode_with(text.path(), odb.path(), &encode_opts(SchemaVersion::V25), NoProgress)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing Files: PitchingRatings.csv, MiLBLeagues.csv."
    );
}
