use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Image bytes whose leading signature has been checked.
#[derive(Clone, Debug)]
pub struct RasterImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

/// A raster image with known pixel dimensions, ready to be placed on a page or in a cell.
#[derive(Clone, Debug)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Why an image cell fell back to its placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaceholderReason {
    MissingReference,
    Fetch(String),
    InvalidFormat,
    Undecodable(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub id: String,
    pub team: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub age: u32,
    pub identification: String,
    pub jersey_number: u32,
    #[serde(default)]
    pub id_front_url: Option<String>,
    #[serde(default)]
    pub id_back_url: Option<String>,
    #[serde(default)]
    pub selfie_url: Option<String>,
    #[serde(default)]
    pub authorization_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub registered_at: DateTime<Utc>,
}

impl PlayerRecord {
    pub fn birth_date_label(&self) -> String {
        self.dob.format("%d/%m/%Y").to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// Registration code handed to the team official. Unique among teams that have one.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub official_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Official {
    pub id: String,
    pub username: String,
    /// Name of the team this official manages.
    pub team_name: String,
}

/// One team's roster, already ordered by last name.
#[derive(Clone, Debug)]
pub struct TeamReportRequest {
    pub team: String,
    pub players: Vec<PlayerRecord>,
}
