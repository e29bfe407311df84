// Integration tests for the export pipelines.
//
// These drive `run_season` and `run_roster` end to end against the CSV
// fixtures in tests/fixtures, an in-memory source, and the row cache a
// previous run leaves behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use gridfeed_core::assemble::ExclusionCounts;
use gridfeed_core::config::{parse_config, Config, SourceKind};
use gridfeed_core::model::{RawRosterRow, RawWeeklyStatRow, SeasonDocument};
use gridfeed_core::pipeline::{self, RunOptions};
use gridfeed_core::source::{self, CacheSource, RosterKind, RowSource, SourceError};

// ===========================================================================
// Test helpers
// ===========================================================================

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Configuration that reads CSV files from `csv_dir` and writes every
/// artifact under `out`.
fn config_for(csv_dir: &Path, out: &Path) -> Config {
    let out = out.display();
    let text = format!(
        r#"
seasons = [2024]

[source]
kind = "csv"
roster_url = "https://example.org/rosters/roster_{{season}}.csv"
weekly_roster_url = "https://example.org/weekly_rosters/roster_weekly_{{season}}.csv"
stats_url = "https://example.org/player_stats/player_stats_{{season}}.csv"
csv_dir = '{csv_dir}'

[season]
output = '{out}/players_{{season}}.json'
cache = '{out}/season_rows_{{season}}.sqlite'
positions = ["QB", "RB", "WR", "TE", "K", "DST"]
fold_fullback = false

[roster]
output = '{out}/roster_{{season}}.json'
cache = '{out}/nfl_rosters_{{season}}.sqlite'
positions = ["QB", "RB", "WR", "TE"]
fold_fullback = true

[teams.aliases]
LA = "LAR"
JAC = "JAX"
"#,
        csv_dir = csv_dir.display(),
    );
    parse_config(&text, Path::new("test.toml")).unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn player<'a>(players: &'a [Value], raw_id: &str) -> &'a Value {
    players
        .iter()
        .find(|p| p["rawId"] == raw_id)
        .unwrap_or_else(|| panic!("no player with rawId {raw_id}"))
}

fn roster_row(id: &str, position: &str, team: &str) -> RawRosterRow {
    RawRosterRow {
        player_id: Some(id.to_string()),
        player_name: Some(format!("Player {id}")),
        position: Some(position.to_string()),
        team: Some(team.to_string()),
        ..Default::default()
    }
}

/// Rows held in memory; either table can be made to fail.
#[derive(Default)]
struct MemorySource {
    roster: Vec<RawRosterRow>,
    stats: Vec<RawWeeklyStatRow>,
    fail_roster: bool,
    fail_stats: bool,
}

fn unavailable(what: &str) -> SourceError {
    SourceError::Io {
        path: what.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "unavailable"),
    }
}

#[async_trait]
impl RowSource for MemorySource {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn roster_rows(
        &self,
        _season: u16,
        _kind: RosterKind,
    ) -> Result<Vec<RawRosterRow>, SourceError> {
        if self.fail_roster {
            return Err(unavailable("roster"));
        }
        Ok(self.roster.clone())
    }

    async fn weekly_stats(&self, _season: u16) -> Result<Vec<RawWeeklyStatRow>, SourceError> {
        if self.fail_stats {
            return Err(unavailable("stats"));
        }
        Ok(self.stats.clone())
    }
}

// ===========================================================================
// Season document
// ===========================================================================

#[tokio::test]
async fn season_export_from_csv_fixtures() {
    let out = tempfile::tempdir().unwrap();
    let config = config_for(&fixtures_dir(), out.path());
    let source = source::build_source(&config.source, config.season.cache.as_deref()).unwrap();

    let summary = pipeline::run_season(&config, source.as_ref(), 2024, RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.season, 2024);
    assert_eq!(summary.count, 5);
    assert_eq!(summary.output, out.path().join("players_2024.json"));
    assert_eq!(
        summary.excluded,
        ExclusionCounts {
            missing_id: 1,
            position: 2,
            team: 2,
            duplicate: 1,
        }
    );

    let doc = read_json(&summary.output);
    assert_eq!(doc["season"], 2024);
    assert_eq!(doc["count"], 5);
    assert!(doc["updated"].as_str().unwrap().contains('T'));

    let players = doc["players"].as_array().unwrap();
    assert_eq!(players.len(), 5);
    let order: Vec<&str> = players.iter().map(|p| p["rawId"].as_str().unwrap()).collect();
    assert_eq!(order, vec!["00-0036900", "00-1", "00-2", "00-3", "00-4"]);

    // Team defense with no stat rows.
    let defense = player(players, "00-1");
    assert_eq!(defense["id"], "player-00-1");
    assert_eq!(defense["position"], "DST");
    assert_eq!(defense["team"], "KC");
    assert_eq!(defense["teamName"], "Kansas City Chiefs");
    assert_eq!(defense["points"].as_f64(), Some(0.0));
    assert_eq!(defense["avgPoints"].as_f64(), Some(0.0));
    assert_eq!(defense["status"], "Active");

    // A null week still counts as a game.
    let kittle = player(players, "00-2");
    assert_eq!(kittle["points"].as_f64(), Some(15.0));
    assert_eq!(kittle["avgPoints"].as_f64(), Some(5.0));

    let chase = player(players, "00-0036900");
    assert_eq!(chase["name"], "Ja'Marr Chase");
    assert_eq!(chase["points"].as_f64(), Some(51.0));
    assert_eq!(chase["avgPoints"].as_f64(), Some(25.5));
    assert_eq!(chase["byeWeek"], 12);

    let injured = player(players, "00-3");
    assert_eq!(injured["status"], "Out");
    assert_eq!(injured["points"].as_f64(), Some(0.0));

    let rams = player(players, "00-4");
    assert_eq!(rams["team"], "LAR");
    assert_eq!(rams["teamName"], "Los Angeles Rams");

    assert!(players.iter().all(|p| p["team"] != "FA"));
    assert!(players.iter().all(|p| p["rawId"] != "00-5"));
}

#[tokio::test]
async fn season_document_count_matches_players() {
    let out = tempfile::tempdir().unwrap();
    let config = config_for(&fixtures_dir(), out.path());
    let source = MemorySource {
        roster: vec![
            roster_row("a", "QB", "BUF"),
            roster_row("b", "WR", "MIA"),
            roster_row("a", "QB", "BUF"),
            roster_row("c", "K", "DEN"),
            roster_row("b", "WR", "NE"),
        ],
        ..Default::default()
    };
    let options = RunOptions { write_cache: false };

    let summary = pipeline::run_season(&config, &source, 2024, options)
        .await
        .unwrap();

    let doc: SeasonDocument =
        serde_json::from_str(&std::fs::read_to_string(&summary.output).unwrap()).unwrap();
    assert_eq!(doc.count, doc.players.len());
    assert_eq!(doc.count, 3);
    assert_eq!(summary.excluded.duplicate, 2);
    assert!(summary.cache.is_none());
    assert!(!out.path().join("season_rows_2024.sqlite").exists());

    let mut ids: Vec<&str> = doc.players.iter().map(|p| p.raw_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), doc.players.len());
}

#[tokio::test]
async fn failed_fetch_writes_nothing() {
    let out = tempfile::tempdir().unwrap();
    let config = config_for(&fixtures_dir(), out.path());
    let source = MemorySource {
        roster: vec![roster_row("a", "QB", "BUF")],
        fail_stats: true,
        ..Default::default()
    };

    let err = pipeline::run_season(&config, &source, 2024, RunOptions::default())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("stats"), "{err:#}");
    assert!(!out.path().join("players_2024.json").exists());
    assert!(!out.path().join("season_rows_2024.sqlite").exists());
}

#[tokio::test]
async fn failed_roster_fetch_keeps_previous_roster_file() {
    let out = tempfile::tempdir().unwrap();
    let config = config_for(&fixtures_dir(), out.path());
    let previous = out.path().join("roster_2024.json");
    std::fs::write(&previous, "[]").unwrap();
    let source = MemorySource {
        fail_roster: true,
        ..Default::default()
    };

    assert!(pipeline::run_roster(&config, &source, 2024, RunOptions::default())
        .await
        .is_err());
    assert_eq!(std::fs::read_to_string(&previous).unwrap(), "[]");
}

#[tokio::test]
async fn missing_csv_file_is_an_error() {
    let empty = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = config_for(empty.path(), out.path());
    let source = source::build_source(&config.source, None).unwrap();

    let err = pipeline::run_season(&config, source.as_ref(), 2024, RunOptions::default())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("roster_2024.csv"), "{err:#}");
    assert!(!out.path().join("players_2024.json").exists());
}

#[tokio::test]
async fn malformed_stat_row_aborts_the_run() {
    let raw = tempfile::tempdir().unwrap();
    std::fs::copy(
        fixtures_dir().join("roster_2024.csv"),
        raw.path().join("roster_2024.csv"),
    )
    .unwrap();
    std::fs::write(
        raw.path().join("player_stats_2024.csv"),
        "player_id,week,fantasy_points_ppr\n00-2,one,10.0\n",
    )
    .unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = config_for(raw.path(), out.path());
    let source = source::build_source(&config.source, None).unwrap();

    let err = pipeline::run_season(&config, source.as_ref(), 2024, RunOptions::default())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("week"), "{err:#}");
    assert!(!out.path().join("players_2024.json").exists());
}

// ===========================================================================
// Roster export
// ===========================================================================

#[tokio::test]
async fn roster_export_from_weekly_fixture() {
    let out = tempfile::tempdir().unwrap();
    let config = config_for(&fixtures_dir(), out.path());
    let source = source::build_source(&config.source, config.roster.cache.as_deref()).unwrap();

    let summary = pipeline::run_roster(&config, source.as_ref(), 2024, RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.count, 4);
    assert_eq!(summary.excluded.duplicate, 1);
    assert_eq!(summary.excluded.position, 1);

    let value = read_json(&summary.output);
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.get("points").is_none()));

    let chase = player(records, "00-0036900");
    assert_eq!(chase["firstName"], "Ja'Marr");
    assert_eq!(chase["lastName"], "Chase");
    let ids = &chase["externalIds"];
    assert_eq!(ids["app_id"], "player-00-0036900");
    assert_eq!(ids["player_id"], "00-0036900");
    assert_eq!(ids["gsis_id"], "00-0036900");
    assert_eq!(ids["pfr_id"], "ChasJa00");
    assert_eq!(ids["yahoo_id"], "33389");
    assert!(ids.get("espn_id").is_none());

    let fullback = player(records, "00-5");
    assert_eq!(fullback["position"], "RB");

    let lawrence = player(records, "00-0036971");
    assert_eq!(lawrence["team"], "JAX");
    assert_eq!(lawrence["teamName"], "Jacksonville Jaguars");

    let kittle = player(records, "00-2");
    assert_eq!(kittle["name"], "George Kittle");
    assert_eq!(kittle["status"], "Active");
}

// ===========================================================================
// Row cache
// ===========================================================================

#[tokio::test]
async fn cached_rows_replay_to_the_same_season_document() {
    let out = tempfile::tempdir().unwrap();
    let config = config_for(&fixtures_dir(), out.path());
    let csv = source::build_source(&config.source, None).unwrap();

    let first = pipeline::run_season(&config, csv.as_ref(), 2024, RunOptions::default())
        .await
        .unwrap();
    let cache_path = first.cache.clone().unwrap();
    assert!(cache_path.exists());
    let original = read_json(&first.output);

    let cache_template = config.season.cache.clone().unwrap();
    let replay = CacheSource::new(&cache_template);
    let options = RunOptions { write_cache: false };
    let second = pipeline::run_season(&config, &replay, 2024, options)
        .await
        .unwrap();

    assert_eq!(second.count, first.count);
    assert_eq!(second.excluded, first.excluded);
    let replayed = read_json(&second.output);
    assert_eq!(replayed["players"], original["players"]);
}

#[tokio::test]
async fn roster_cache_replays_external_ids() {
    let out = tempfile::tempdir().unwrap();
    let config = config_for(&fixtures_dir(), out.path());
    let csv = source::build_source(&config.source, None).unwrap();

    let first = pipeline::run_roster(&config, csv.as_ref(), 2024, RunOptions::default())
        .await
        .unwrap();
    assert_eq!(
        first.cache.as_deref(),
        Some(out.path().join("nfl_rosters_2024.sqlite").as_path())
    );
    let original = read_json(&first.output);

    let mut replay_config = config.source.clone();
    replay_config.kind = SourceKind::Cache;
    let replay = source::build_source(&replay_config, config.roster.cache.as_deref()).unwrap();
    let options = RunOptions { write_cache: false };
    let second = pipeline::run_roster(&config, replay.as_ref(), 2024, options)
        .await
        .unwrap();

    assert_eq!(read_json(&second.output), original);
}

#[tokio::test]
async fn unwritable_cache_keeps_the_season_document() {
    let out = tempfile::tempdir().unwrap();
    let mut config = config_for(&fixtures_dir(), out.path());
    let blocker = out.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();
    config.season.cache = Some(blocker.join("rows_{season}.sqlite").display().to_string());
    let source = MemorySource {
        roster: vec![roster_row("a", "QB", "BUF")],
        ..Default::default()
    };

    let summary = pipeline::run_season(&config, &source, 2024, RunOptions::default())
        .await
        .unwrap();

    assert!(summary.cache.is_none());
    assert_eq!(summary.count, 1);
    assert_eq!(read_json(&summary.output)["count"], 1);
}

#[tokio::test]
async fn unwritable_cache_keeps_the_roster_export() {
    let out = tempfile::tempdir().unwrap();
    let mut config = config_for(&fixtures_dir(), out.path());
    let blocker = out.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();
    config.roster.cache = Some(blocker.join("rows_{season}.sqlite").display().to_string());
    let source = MemorySource {
        roster: vec![roster_row("a", "QB", "BUF")],
        ..Default::default()
    };

    let summary = pipeline::run_roster(&config, &source, 2024, RunOptions::default())
        .await
        .unwrap();

    assert!(summary.cache.is_none());
    assert_eq!(read_json(&summary.output).as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_cache_is_an_error() {
    let out = tempfile::tempdir().unwrap();
    let config = config_for(&fixtures_dir(), out.path());
    let replay = CacheSource::new(&config.roster.cache.clone().unwrap());

    let err = pipeline::run_roster(&config, &replay, 2024, RunOptions::default())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("nfl_rosters_2024.sqlite"), "{err:#}");
    assert!(!out.path().join("roster_2024.json").exists());
}
