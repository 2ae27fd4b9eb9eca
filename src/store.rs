//! Roster persistence seam and the JSON-snapshot store used by the CLI and tests.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Missing};
use crate::model::{Official, PlayerRecord, Team};
use crate::registration::RegistrationError;

pub trait RosterStore {
    fn find_team_by_code(&self, code: &str) -> Result<Team, Error>;

    /// Players of `team` ordered by last name, byte-wise (so case-sensitive).
    fn find_players_by_team(&self, team: &str) -> Vec<PlayerRecord>;

    fn find_official_by_id(&self, id: &str) -> Result<Official, Error>;

    fn find_player(&self, id: &str) -> Result<PlayerRecord, Error>;

    /// Every player in registration order.
    fn all_players(&self) -> Vec<PlayerRecord>;

    fn count_players(&self, team: &str) -> usize;

    /// Whether another player of `team` (other than `except`) wears `number`.
    fn jersey_taken(&self, team: &str, number: u32, except: Option<&str>) -> bool;

    fn identification_taken(&self, identification: &str, except: Option<&str>) -> bool;

    /// Store a new player and return its assigned id.
    fn insert_player(&mut self, player: PlayerRecord) -> Result<String, Error>;

    fn update_player(&mut self, player: PlayerRecord) -> Result<(), Error>;

    fn remove_player(&mut self, id: &str) -> Result<PlayerRecord, Error>;

    /// Set or clear a team's registration code. Codes are unique among teams that have one.
    fn assign_team_code(&mut self, team_id: &str, code: Option<String>) -> Result<(), Error>;

    /// Rename a team. Names are unique; renaming a team to its own name is a no-op.
    fn rename_team(&mut self, team_id: &str, name: &str) -> Result<(), Error>;

    /// Add an official and link them to the team named `official.team_name`, creating
    /// that team without a code when it does not exist yet.
    fn create_official(&mut self, official: Official) -> Result<(), Error>;

    /// Remove an official. Their team is kept and left without an official.
    fn delete_official(&mut self, id: &str) -> Result<Official, Error>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub officials: Vec<Official>,
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(default)]
    next_player: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(content: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        let store = Self::from_json(&content)?;
        log::debug!(
            "loaded roster {}: {} teams, {} officials, {} players",
            path.display(),
            store.teams.len(),
            store.officials.len(),
            store.players.len()
        );
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn add_team(&mut self, team: Team) -> Result<(), Error> {
        if self.teams.iter().any(|t| t.name == team.name) {
            return Err(Error::DuplicateTeamName(team.name));
        }
        if let Some(code) = &team.code
            && self.teams.iter().any(|t| t.code.as_ref() == Some(code))
        {
            return Err(Error::DuplicateTeamCode(code.clone()));
        }
        self.teams.push(team);
        Ok(())
    }

    fn unused_team_id(&self) -> String {
        let mut n = self.teams.len();
        loop {
            n += 1;
            let id = format!("t{n}");
            if !self.teams.iter().any(|t| t.id == id) {
                return id;
            }
        }
    }
}

impl RosterStore for MemoryStore {
    fn find_team_by_code(&self, code: &str) -> Result<Team, Error> {
        self.teams
            .iter()
            .find(|t| t.code.as_deref() == Some(code))
            .cloned()
            .ok_or_else(|| Error::NotFound(Missing::Team(code.to_string())))
    }

    fn find_players_by_team(&self, team: &str) -> Vec<PlayerRecord> {
        let mut players: Vec<PlayerRecord> =
            self.players.iter().filter(|p| p.team == team).cloned().collect();
        players.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        players
    }

    fn find_official_by_id(&self, id: &str) -> Result<Official, Error> {
        self.officials
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(Missing::Official(id.to_string())))
    }

    fn find_player(&self, id: &str) -> Result<PlayerRecord, Error> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(Missing::Player(id.to_string())))
    }

    fn all_players(&self) -> Vec<PlayerRecord> {
        let mut players = self.players.clone();
        players.sort_by_key(|p| p.registered_at);
        players
    }

    fn count_players(&self, team: &str) -> usize {
        self.players.iter().filter(|p| p.team == team).count()
    }

    fn jersey_taken(&self, team: &str, number: u32, except: Option<&str>) -> bool {
        self.players.iter().any(|p| {
            p.team == team && p.jersey_number == number && Some(p.id.as_str()) != except
        })
    }

    fn identification_taken(&self, identification: &str, except: Option<&str>) -> bool {
        self.players
            .iter()
            .any(|p| p.identification == identification && Some(p.id.as_str()) != except)
    }

    fn insert_player(&mut self, mut player: PlayerRecord) -> Result<String, Error> {
        if self.identification_taken(&player.identification, None) {
            return Err(RegistrationError::IdentificationTaken(player.identification).into());
        }
        let id = loop {
            self.next_player += 1;
            let candidate = format!("p{}", self.next_player);
            if !self.players.iter().any(|p| p.id == candidate) {
                break candidate;
            }
        };
        player.id = id.clone();
        log::info!(
            "registered {} {} as {id} in {}",
            player.first_name,
            player.last_name,
            player.team
        );
        self.players.push(player);
        Ok(id)
    }

    fn update_player(&mut self, player: PlayerRecord) -> Result<(), Error> {
        if self.identification_taken(&player.identification, Some(&player.id)) {
            return Err(RegistrationError::IdentificationTaken(player.identification).into());
        }
        let slot = self
            .players
            .iter_mut()
            .find(|p| p.id == player.id)
            .ok_or_else(|| Error::NotFound(Missing::Player(player.id.clone())))?;
        *slot = player;
        Ok(())
    }

    fn remove_player(&mut self, id: &str) -> Result<PlayerRecord, Error> {
        let pos = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(Missing::Player(id.to_string())))?;
        let removed = self.players.remove(pos);
        log::info!("removed player {id} from {}", removed.team);
        Ok(removed)
    }

    fn assign_team_code(&mut self, team_id: &str, code: Option<String>) -> Result<(), Error> {
        if let Some(code) = &code
            && self
                .teams
                .iter()
                .any(|t| t.id != team_id && t.code.as_ref() == Some(code))
        {
            return Err(Error::DuplicateTeamCode(code.clone()));
        }
        let team = self
            .teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or_else(|| Error::NotFound(Missing::Team(team_id.to_string())))?;
        team.code = code;
        Ok(())
    }

    fn rename_team(&mut self, team_id: &str, name: &str) -> Result<(), Error> {
        if self.teams.iter().any(|t| t.id != team_id && t.name == name) {
            return Err(Error::DuplicateTeamName(name.to_string()));
        }
        let team = self
            .teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or_else(|| Error::NotFound(Missing::Team(team_id.to_string())))?;
        team.name = name.to_string();
        Ok(())
    }

    fn create_official(&mut self, official: Official) -> Result<(), Error> {
        if self.officials.iter().any(|o| o.username == official.username) {
            return Err(Error::DuplicateUsername(official.username));
        }
        match self.teams.iter_mut().find(|t| t.name == official.team_name) {
            Some(team) => team.official_id = Some(official.id.clone()),
            None => {
                let id = self.unused_team_id();
                log::debug!("creating team {id} ({}) without code", official.team_name);
                self.teams.push(Team {
                    id,
                    name: official.team_name.clone(),
                    code: None,
                    official_id: Some(official.id.clone()),
                });
            }
        }
        self.officials.push(official);
        Ok(())
    }

    fn delete_official(&mut self, id: &str) -> Result<Official, Error> {
        let pos = self
            .officials
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| Error::NotFound(Missing::Official(id.to_string())))?;
        for team in self.teams.iter_mut().filter(|t| t.official_id.as_deref() == Some(id)) {
            team.official_id = None;
        }
        Ok(self.officials.remove(pos))
    }
}
