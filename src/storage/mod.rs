//! Filesystem tournament store.
//!
//! Layout under the data directory:
//! - `tournaments/<id>/tournament.json`: metadata and roster
//! - `tournaments/<id>/rounds.jsonl`: one round per line

pub mod jsonl;

use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::models::{Round, Tournament, TournamentId};
use jsonl::{JsonlReader, JsonlWriter};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn tournaments_dir(&self) -> PathBuf {
        self.data_dir.join("tournaments")
    }

    pub fn tournament_dir(&self, id: &TournamentId) -> PathBuf {
        self.tournaments_dir().join(id.as_str())
    }

    pub fn metadata_path(&self, id: &TournamentId) -> PathBuf {
        self.tournament_dir(id).join("tournament.json")
    }

    pub fn rounds_path(&self, id: &TournamentId) -> PathBuf {
        self.tournament_dir(id).join("rounds.jsonl")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Reads and writes tournaments.
#[derive(Debug, Clone)]
pub struct TournamentStore {
    config: StorageConfig,
}

impl TournamentStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn exists(&self, id: &TournamentId) -> bool {
        self.config.metadata_path(id).exists()
    }

    /// Write metadata and the full round log.
    pub fn save(&self, tournament: &Tournament) -> Result<(), StorageError> {
        self.save_metadata(tournament)?;
        JsonlWriter::new(self.config.rounds_path(&tournament.id)).write_all(&tournament.rounds)?;
        Ok(())
    }

    /// Write metadata only, leaving the round log alone.
    pub fn save_metadata(&self, tournament: &Tournament) -> Result<(), StorageError> {
        let dir = self.config.tournament_dir(&tournament.id);
        fs::create_dir_all(&dir)?;

        let metadata = Tournament {
            rounds: Vec::new(),
            ..tournament.clone()
        };
        let json = serde_json::to_string_pretty(&metadata)?;
        fs::write(self.config.metadata_path(&tournament.id), json)?;

        info!("Saved tournament {} to {:?}", tournament.id, dir);
        Ok(())
    }

    /// Append one round to the log.
    pub fn append_round(&self, id: &TournamentId, round: &Round) -> Result<(), StorageError> {
        JsonlWriter::new(self.config.rounds_path(id)).append(round)
    }

    pub fn load(&self, id: &TournamentId) -> Result<Tournament, StorageError> {
        let path = self.config.metadata_path(id);
        if !path.exists() {
            return Err(StorageError::TournamentNotFound(id.clone()));
        }

        let contents = fs::read_to_string(&path)?;
        let mut tournament: Tournament = serde_json::from_str(&contents)?;
        let mut rounds: Vec<Round> = JsonlReader::new(self.config.rounds_path(id)).read_all()?;
        rounds.sort_by_key(|r| r.number);
        tournament.rounds = rounds;

        Ok(tournament)
    }

    /// Ids of stored tournaments, sorted.
    pub fn list(&self) -> Result<Vec<TournamentId>, StorageError> {
        let dir = self.config.tournaments_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                let id = TournamentId::from(name);
                if self.exists(&id) {
                    ids.push(id);
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityId, GameResult, TournamentFormat, TournamentStatus};
    use crate::pairing::Variant;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample(id: &str) -> Tournament {
        let mut t = Tournament::new(
            EntityId::from(id),
            "Autumn Open",
            TournamentFormat::Swiss {
                variant: Variant::Uscf,
            },
            5,
            Utc.with_ymd_and_hms(2024, 9, 14, 9, 30, 0).unwrap(),
        );
        let a = crate::models::Competitor::register(&t.id, "Ann", Some(1650));
        let b = crate::models::Competitor::register(&t.id, "Ben", None);
        let mut game = crate::models::Pairing::game(1, 1, &a, &b, false);
        game.result = Some(GameResult::Draw);
        t.competitors = vec![a, b];
        t.rounds = vec![Round::new(1, vec![game], false, 0)];
        t.current_round = 1;
        t.status = TournamentStatus::InProgress;
        t
    }

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));
        let id = EntityId::from("t1");

        assert_eq!(config.tournaments_dir(), PathBuf::from("/data/tournaments"));
        assert_eq!(
            config.metadata_path(&id),
            PathBuf::from("/data/tournaments/t1/tournament.json")
        );
        assert_eq!(
            config.rounds_path(&id),
            PathBuf::from("/data/tournaments/t1/rounds.jsonl")
        );
        assert_eq!(StorageConfig::default().data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = TournamentStore::new(StorageConfig::new(temp_dir.path().to_path_buf()));
        let t = sample("t-save");

        store.save(&t).unwrap();
        let loaded = store.load(&t.id).unwrap();

        assert_eq!(loaded.name, t.name);
        assert_eq!(loaded.format, t.format);
        assert_eq!(loaded.competitors, t.competitors);
        assert_eq!(loaded.rounds, t.rounds);
        assert_eq!(loaded.created_at, t.created_at);

        let metadata = fs::read_to_string(store.config().metadata_path(&t.id)).unwrap();
        assert!(!metadata.contains("boardNumber"));
    }

    #[test]
    fn test_append_round() {
        let temp_dir = TempDir::new().unwrap();
        let store = TournamentStore::new(StorageConfig::new(temp_dir.path().to_path_buf()));
        let t = sample("t-append");
        store.save(&t).unwrap();

        store.append_round(&t.id, &Round::new(2, Vec::new(), false, 0)).unwrap();
        let loaded = store.load(&t.id).unwrap();
        let numbers: Vec<u32> = loaded.rounds.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_list_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = TournamentStore::new(StorageConfig::new(temp_dir.path().to_path_buf()));
        assert!(store.list().unwrap().is_empty());

        store.save(&sample("t-b")).unwrap();
        store.save(&sample("t-a")).unwrap();
        fs::create_dir_all(store.config().tournaments_dir().join("stray")).unwrap();

        let ids: Vec<String> = store.list().unwrap().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["t-a", "t-b"]);

        assert!(matches!(
            store.load(&EntityId::from("nope")),
            Err(StorageError::TournamentNotFound(_))
        ));
    }
}
