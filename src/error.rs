use std::fmt;

use crate::registration::RegistrationError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("payload from {url} is not a PNG or JPEG image")]
    InvalidImageFormat { url: String },

    #[error("{0} not found")]
    NotFound(Missing),

    #[error("team code {0:?} is already assigned to another team")]
    DuplicateTeamCode(String),

    #[error("a team named {0:?} already exists")]
    DuplicateTeamName(String),

    #[error("username {0:?} is already taken")]
    DuplicateUsername(String),

    #[error("registration rejected: {0}")]
    Validation(#[from] RegistrationError),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("roster snapshot error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// What a lookup failed to find.
#[derive(Debug, Clone, PartialEq)]
pub enum Missing {
    Team(String),
    Official(String),
    Player(String),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Team(code) => write!(f, "team with code {code:?}"),
            Missing::Official(id) => write!(f, "official {id:?}"),
            Missing::Player(id) => write!(f, "player {id:?}"),
        }
    }
}
