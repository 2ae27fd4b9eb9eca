mod common;

use std::io::{self, Write};

use common::*;
use roster_docs::config::ReportConfig;
use roster_docs::export::ALL_PLAYERS_FILENAME;
use roster_docs::model::{PlayerRecord, Team};
use roster_docs::store::{MemoryStore, RosterStore};
use roster_docs::{Artifact, Error, ExportKind, Missing, all_players_workbook, team_report, write_artifact};

#[test]
fn team_report_dispatches_by_kind() {
    init_logger();
    let store = store_with(roster(3));
    let source = StubSource::png();
    let config = ReportConfig::default();

    let cases = [
        (ExportKind::Pdf, "application/pdf", "pdf", &b"%PDF-"[..]),
        (
            ExportKind::Xlsx,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xlsx",
            &b"PK"[..],
        ),
        (
            ExportKind::Docx,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "docx",
            &b"PK"[..],
        ),
    ];
    for (kind, mime, ext, magic) in cases {
        let artifact = team_report(&store, OFFICIAL_ID, kind, &source, &config).unwrap();
        assert_eq!(artifact.content_type, mime);
        assert_eq!(artifact.filename, format!("Reporte_{TEAM}.{ext}"));
        assert_eq!(
            artifact.content_disposition(),
            format!("attachment; filename=\"Reporte_{TEAM}.{ext}\"")
        );
        assert!(artifact.bytes.starts_with(magic), "{kind:?}");
    }
}

#[test]
fn unknown_official_fails_before_any_fetch() {
    let store = store_with(roster(3));
    let source = StubSource::png();
    let err = team_report(&store, "nobody", ExportKind::Pdf, &source, &ReportConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(Missing::Official(ref id)) if id == "nobody"));
    assert!(source.calls().is_empty());
}

#[test]
fn team_roster_is_ordered_by_last_name() {
    let players = vec![
        player("Ana", "zapata", 1),
        player("Luis", "Zapata", 2),
        player("Pedro", "Andrade", 3),
        player("Otro", "Baca", 4),
    ];
    let mut store = store_with(players);
    store.players[3].team = "Otro Equipo".to_string();

    let ordered: Vec<String> = store
        .find_players_by_team(TEAM)
        .into_iter()
        .map(|p| p.last_name)
        .collect();
    // Byte order: upper case sorts before lower case.
    assert_eq!(ordered, ["Andrade", "Zapata", "zapata"]);
}

#[test]
fn all_players_workbook_uses_registration_order() {
    let mut late: PlayerRecord = player("Zoe", "Alvarez", 9);
    late.registered_at = late.registered_at + chrono::Duration::days(1);
    let mut players = roster(2);
    players.insert(0, late);
    let store = store_with(players);

    let order: Vec<String> = store.all_players().into_iter().map(|p| p.last_name).collect();
    assert_eq!(order, ["Apellido01", "Apellido02", "Alvarez"]);

    let source = StubSource::timeout();
    let artifact = all_players_workbook(&store, &source, &ReportConfig::default()).unwrap();
    assert_eq!(artifact.filename, ALL_PLAYERS_FILENAME);
    assert_eq!(artifact.content_type, ExportKind::Xlsx.content_type());
    assert!(zip_names(&artifact.bytes).iter().any(|n| n == "xl/worksheets/sheet1.xml"));
}

#[test]
fn second_team_cannot_borrow_an_existing_name() {
    let mut store = store_with(roster(2));
    let err = store
        .add_team(Team {
            id: "t2".to_string(),
            name: TEAM.to_string(),
            code: Some("OTHER".to_string()),
            official_id: None,
        })
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateTeamName(ref name) if name == TEAM));
    assert!(matches!(
        store.find_team_by_code("OTHER"),
        Err(Error::NotFound(Missing::Team(_)))
    ));
    assert_eq!(store.find_players_by_team(TEAM).len(), 2);
}

#[test]
fn removed_players_leave_the_team_report() {
    let mut store = store_with(roster(3));
    let removed = store.remove_player("p2").unwrap();
    assert_eq!(removed.last_name, "Apellido02");
    assert_eq!(store.count_players(TEAM), 2);
    assert!(!store.jersey_taken(TEAM, 2, None));

    let source = StubSource::png();
    let artifact =
        team_report(&store, OFFICIAL_ID, ExportKind::Docx, &source, &ReportConfig::default())
            .unwrap();
    let document = zip_entry(&artifact.bytes, "word/document.xml").unwrap();
    assert!(document.contains("Apellido01"));
    assert!(!document.contains("Apellido02"));
}

#[test]
fn deleting_the_official_orphans_the_report() {
    let mut store = store_with(roster(1));
    store.delete_official(OFFICIAL_ID).unwrap();
    assert_eq!(store.teams[0].official_id, None);
    assert_eq!(store.find_team_by_code(TEAM_CODE).unwrap().name, TEAM);
    let err = team_report(&store, OFFICIAL_ID, ExportKind::Pdf, &StubSource::png(), &ReportConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(Missing::Official(_))));
}

#[test]
fn roster_snapshot_round_trips_through_json() {
    let store = store_with(roster(2));
    let dir = std::env::temp_dir().join(format!("roster-docs-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("roster.json");
    store.save(&path).unwrap();

    let loaded = MemoryStore::load(&path).unwrap();
    assert_eq!(loaded.players, store.players);
    assert_eq!(loaded.find_team_by_code(TEAM_CODE).unwrap().name, TEAM);
    std::fs::remove_dir_all(&dir).unwrap();
}

/// Accepts `limit` bytes, then fails every write and flush.
struct BrokenPipe {
    written: Vec<u8>,
    limit: usize,
    flushes: usize,
}

impl Write for BrokenPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.limit - self.written.len();
        if room == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"));
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
    }
}

#[test]
fn mid_stream_failure_reports_only_the_write_error() {
    init_logger();
    let artifact = Artifact {
        filename: "Reporte_X.pdf".to_string(),
        content_type: ExportKind::Pdf.content_type(),
        bytes: vec![7u8; 64],
    };
    let mut sink = BrokenPipe {
        written: Vec::new(),
        limit: 10,
        flushes: 0,
    };
    let err = write_artifact(&artifact, &mut sink).unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    assert_eq!(sink.written.len(), 10);
    assert_eq!(sink.flushes, 1);

    let mut ok = Vec::new();
    write_artifact(&artifact, &mut ok).unwrap();
    assert_eq!(ok, artifact.bytes);
}

#[test]
fn quotes_in_team_names_do_not_break_the_header() {
    let artifact = Artifact {
        filename: "Reporte_Los \"Tigres\".pdf".to_string(),
        content_type: ExportKind::Pdf.content_type(),
        bytes: Vec::new(),
    };
    assert_eq!(
        artifact.content_disposition(),
        "attachment; filename=\"Reporte_Los _Tigres_.pdf\""
    );
}
