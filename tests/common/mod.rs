#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{Cursor, Read};

use chrono::{NaiveDate, TimeZone, Utc};
use roster_docs::Error;
use roster_docs::media::ImageSource;
use roster_docs::model::{Official, PlayerRecord, Team, TeamReportRequest};
use roster_docs::store::{MemoryStore, RosterStore};

pub const TEAM: &str = "Deportivo Calderón";
pub const TEAM_CODE: &str = "DC-2025";
pub const OFFICIAL_ID: &str = "off-1";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn selfie_url(n: u32) -> String {
    format!("https://res.cloudinary.com/liga/image/upload/v1712/selfie_{n}.jpg")
}

/// A fully populated adult player. `n` drives the jersey number and identification.
pub fn player(first: &str, last: &str, n: u32) -> PlayerRecord {
    PlayerRecord {
        id: format!("p{n}"),
        team: TEAM.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        dob: NaiveDate::from_ymd_opt(1998, 4, 21).unwrap(),
        age: 26,
        identification: format!("17{n:08}"),
        jersey_number: n,
        id_front_url: Some(format!("https://res.cloudinary.com/liga/image/upload/v1712/front_{n}.jpg")),
        id_back_url: Some(format!("https://res.cloudinary.com/liga/image/upload/v1712/back_{n}.jpg")),
        selfie_url: Some(selfie_url(n)),
        authorization_url: None,
        registered_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, n).unwrap(),
    }
}

pub fn roster(count: u32) -> Vec<PlayerRecord> {
    (1..=count)
        .map(|n| player("Juan", &format!("Apellido{n:02}"), n))
        .collect()
}

pub fn request(count: u32) -> TeamReportRequest {
    TeamReportRequest {
        team: TEAM.to_string(),
        players: roster(count),
    }
}

pub fn store_with(players: Vec<PlayerRecord>) -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .add_team(Team {
            id: "t1".to_string(),
            name: TEAM.to_string(),
            code: Some(TEAM_CODE.to_string()),
            official_id: Some(OFFICIAL_ID.to_string()),
        })
        .unwrap();
    store
        .create_official(Official {
            id: OFFICIAL_ID.to_string(),
            username: "dirigente".to_string(),
            team_name: TEAM.to_string(),
        })
        .unwrap();
    store.players = players;
    store
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([20, 40, 110]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

type Reply = Box<dyn Fn(&str) -> Result<Vec<u8>, Error>>;

/// Scripted image source that records every URL it is asked for.
pub struct StubSource {
    reply: Reply,
    calls: RefCell<Vec<String>>,
}

impl StubSource {
    pub fn new(reply: impl Fn(&str) -> Result<Vec<u8>, Error> + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn png() -> Self {
        let data = png_bytes(30, 20);
        Self::new(move |_| Ok(data.clone()))
    }

    pub fn jpeg() -> Self {
        let data = jpeg_bytes(30, 20);
        Self::new(move |_| Ok(data.clone()))
    }

    pub fn timeout() -> Self {
        Self::new(|url| {
            Err(Error::Fetch {
                url: url.to_string(),
                reason: "operation timed out".to_string(),
            })
        })
    }

    /// A host answering with an HTML error page and a success status.
    pub fn html() -> Self {
        Self::new(|_| Ok(b"<!DOCTYPE html><html>Not found</html>".to_vec()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ImageSource for StubSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        self.calls.borrow_mut().push(url.to_string());
        (self.reply)(url)
    }
}

/// Read one entry of a zip package (XLSX or DOCX) as text.
pub fn zip_entry(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    Some(content)
}

pub fn zip_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}
