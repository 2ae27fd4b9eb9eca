pub mod config;
pub mod docx;
mod error;
pub mod export;
pub mod fonts;
pub mod media;
pub mod model;
pub mod pdf;
pub mod registration;
pub mod store;
pub mod wording;
pub mod xlsx;

pub use error::{Error, Missing};
pub use export::{Artifact, ExportKind, all_players_workbook, team_report, write_artifact};
