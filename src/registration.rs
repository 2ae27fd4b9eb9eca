//! Registration rules for new players and partial edits of existing ones.

use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::PlayerRecord;
use crate::store::RosterStore;

pub const MIN_AGE: u32 = 14;
pub const ADULT_AGE: u32 = 18;
pub const MAX_PLAYERS_PER_TEAM: usize = 20;
pub const JERSEY_RANGE: std::ops::RangeInclusive<u32> = 1..=99;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-zÁÉÍÓÚáéíóúÑñ\s]+$").expect("name pattern"));
static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-]+$").expect("identification pattern"));
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("iso date pattern"));
static DMY_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("dmy date pattern"));

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistrationError {
    #[error("team code is required")]
    MissingTeamCode,
    #[error("team code {0:?} does not match any team")]
    UnknownTeamCode(String),
    #[error("invalid first name")]
    InvalidFirstName,
    #[error("invalid last name")]
    InvalidLastName,
    #[error("invalid identification")]
    InvalidIdentification,
    #[error("date of birth is required")]
    MissingBirthDate,
    #[error("invalid date of birth {0:?}, expected YYYY-MM-DD or DD/MM/YYYY")]
    InvalidBirthDate(String),
    #[error("players must be at least 14 years old (got {0})")]
    Underage(u32),
    #[error("guardian authorization required for players aged 14-17 (got {0})")]
    AuthorizationRequired(u32),
    #[error("jersey number must be between 1 and 99")]
    InvalidJerseyNumber,
    #[error("jersey number {number} already registered in {team}")]
    JerseyTaken { number: u32, team: String },
    #[error("{0} already has 20 registered players")]
    RosterFull(String),
    #[error("identification {0:?} already registered")]
    IdentificationTaken(String),
    #[error("front ID, back ID and selfie images are all required")]
    MissingImages,
}

/// A registration as submitted by a team official. Image fields hold references to
/// already-uploaded files.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub team_code: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub identification: String,
    #[serde(default)]
    pub jersey_number: Option<u32>,
    #[serde(default)]
    pub id_front_url: Option<String>,
    #[serde(default)]
    pub id_back_url: Option<String>,
    #[serde(default)]
    pub selfie_url: Option<String>,
    #[serde(default)]
    pub authorization_url: Option<String>,
}

/// Fields of an edit. `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub identification: Option<String>,
    #[serde(default)]
    pub jersey_number: Option<u32>,
    #[serde(default)]
    pub id_front_url: Option<String>,
    #[serde(default)]
    pub id_back_url: Option<String>,
    #[serde(default)]
    pub selfie_url: Option<String>,
    #[serde(default)]
    pub authorization_url: Option<String>,
}

fn present(reference: &Option<String>) -> bool {
    reference.as_deref().is_some_and(|r| !r.trim().is_empty())
}

/// Accepts exactly `YYYY-MM-DD` or `DD/MM/YYYY`.
pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, RegistrationError> {
    let raw = raw.trim();
    let parsed = if ISO_DATE_RE.is_match(raw) {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    } else if DMY_DATE_RE.is_match(raw) {
        NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
    } else {
        None
    };
    parsed.ok_or_else(|| RegistrationError::InvalidBirthDate(raw.to_string()))
}

/// Completed years between `dob` and `today`. A date in the future counts as zero.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(dob).unwrap_or(0)
}

fn check_jersey(number: Option<u32>) -> Result<u32, RegistrationError> {
    match number {
        Some(n) if JERSEY_RANGE.contains(&n) => Ok(n),
        _ => Err(RegistrationError::InvalidJerseyNumber),
    }
}

/// Validate a registration against the roster and build the record to insert.
///
/// Rules are checked in a fixed order and the first violation is returned.
pub fn validate_registration(
    form: &RegistrationForm,
    store: &dyn RosterStore,
    today: NaiveDate,
) -> Result<PlayerRecord, Error> {
    let code = form
        .team_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(RegistrationError::MissingTeamCode)?;
    let team = store
        .find_team_by_code(code)
        .map_err(|_| RegistrationError::UnknownTeamCode(code.to_string()))?;

    if !NAME_RE.is_match(&form.first_name) {
        return Err(RegistrationError::InvalidFirstName.into());
    }
    if !NAME_RE.is_match(&form.last_name) {
        return Err(RegistrationError::InvalidLastName.into());
    }
    if !IDENT_RE.is_match(&form.identification) {
        return Err(RegistrationError::InvalidIdentification.into());
    }
    let raw_dob = form
        .dob
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .ok_or(RegistrationError::MissingBirthDate)?;
    let jersey_number = check_jersey(form.jersey_number)?;

    if store.count_players(&team.name) >= MAX_PLAYERS_PER_TEAM {
        return Err(RegistrationError::RosterFull(team.name).into());
    }
    if store.jersey_taken(&team.name, jersey_number, None) {
        return Err(RegistrationError::JerseyTaken {
            number: jersey_number,
            team: team.name,
        }
        .into());
    }
    if store.identification_taken(&form.identification, None) {
        return Err(RegistrationError::IdentificationTaken(form.identification.clone()).into());
    }

    let dob = parse_birth_date(raw_dob)?;
    let age = age_on(dob, today);
    if age < MIN_AGE {
        return Err(RegistrationError::Underage(age).into());
    }

    if !(present(&form.id_front_url) && present(&form.id_back_url) && present(&form.selfie_url)) {
        return Err(RegistrationError::MissingImages.into());
    }

    let authorization_url = if age < ADULT_AGE {
        if !present(&form.authorization_url) {
            return Err(RegistrationError::AuthorizationRequired(age).into());
        }
        form.authorization_url.clone()
    } else {
        None
    };

    log::debug!(
        "registration accepted: {} {} ({age}) #{jersey_number} for {}",
        form.first_name,
        form.last_name,
        team.name
    );

    Ok(PlayerRecord {
        id: String::new(),
        team: team.name,
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        dob,
        age,
        identification: form.identification.clone(),
        jersey_number,
        id_front_url: form.id_front_url.clone(),
        id_back_url: form.id_back_url.clone(),
        selfie_url: form.selfie_url.clone(),
        authorization_url,
        registered_at: Utc::now(),
    })
}

/// Apply a partial edit to `existing` under the registration rules.
///
/// Uniqueness checks exclude the edited player itself. A new birth date recomputes the
/// age; an adult age drops any stored authorization, a minor age needs one on file or in
/// the update.
pub fn apply_update(
    existing: &PlayerRecord,
    update: &PlayerUpdate,
    store: &dyn RosterStore,
    today: NaiveDate,
) -> Result<PlayerRecord, Error> {
    let mut player = existing.clone();
    let except = Some(existing.id.as_str());

    if let Some(first_name) = &update.first_name {
        if !NAME_RE.is_match(first_name) {
            return Err(RegistrationError::InvalidFirstName.into());
        }
        player.first_name = first_name.clone();
    }
    if let Some(last_name) = &update.last_name {
        if !NAME_RE.is_match(last_name) {
            return Err(RegistrationError::InvalidLastName.into());
        }
        player.last_name = last_name.clone();
    }
    if let Some(identification) = &update.identification {
        if !IDENT_RE.is_match(identification) {
            return Err(RegistrationError::InvalidIdentification.into());
        }
        if store.identification_taken(identification, except) {
            return Err(RegistrationError::IdentificationTaken(identification.clone()).into());
        }
        player.identification = identification.clone();
    }
    if update.jersey_number.is_some() {
        let number = check_jersey(update.jersey_number)?;
        if store.jersey_taken(&player.team, number, except) {
            return Err(RegistrationError::JerseyTaken {
                number,
                team: player.team.clone(),
            }
            .into());
        }
        player.jersey_number = number;
    }

    if present(&update.authorization_url) {
        player.authorization_url = update.authorization_url.clone();
    }
    if let Some(raw_dob) = update.dob.as_deref().filter(|d| !d.trim().is_empty()) {
        let dob = parse_birth_date(raw_dob)?;
        let age = age_on(dob, today);
        if age < MIN_AGE {
            return Err(RegistrationError::Underage(age).into());
        }
        if age < ADULT_AGE {
            if !present(&player.authorization_url) {
                return Err(RegistrationError::AuthorizationRequired(age).into());
            }
        } else {
            player.authorization_url = None;
        }
        player.dob = dob;
        player.age = age;
    }

    let images = [
        (&update.id_front_url, &mut player.id_front_url),
        (&update.id_back_url, &mut player.id_back_url),
        (&update.selfie_url, &mut player.selfie_url),
    ];
    for (new, stored) in images {
        if present(new) {
            *stored = new.clone();
        }
    }

    Ok(player)
}
