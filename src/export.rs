//! Entry points that turn a roster lookup into a downloadable artifact.

use std::io::Write;
use std::time::Instant;

use crate::config::ReportConfig;
use crate::docx::DocumentBuilder;
use crate::error::Error;
use crate::media::{ImageSource, ReportAssets};
use crate::model::TeamReportRequest;
use crate::pdf::render_team_report;
use crate::store::RosterStore;
use crate::xlsx::WorkbookBuilder;

pub const ALL_PLAYERS_FILENAME: &str = "players_export.xlsx";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Pdf,
    Xlsx,
    Docx,
}

impl ExportKind {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportKind::Pdf => "application/pdf",
            ExportKind::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Pdf => "pdf",
            ExportKind::Xlsx => "xlsx",
            ExportKind::Docx => "docx",
        }
    }
}

/// Finished report bytes plus what an HTTP layer needs to serve them.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename=\"{}\"",
            self.filename.replace(['"', '\\'], "_")
        )
    }
}

/// Resolve official, team and roster, then build one team report.
///
/// Lookup failures surface as [`Error::NotFound`] before any image is fetched.
pub fn team_report(
    store: &dyn RosterStore,
    official_id: &str,
    kind: ExportKind,
    source: &dyn ImageSource,
    config: &ReportConfig,
) -> Result<Artifact, Error> {
    let t0 = Instant::now();
    let official = store.find_official_by_id(official_id)?;
    let request = TeamReportRequest {
        players: store.find_players_by_team(&official.team_name),
        team: official.team_name,
    };
    log::info!(
        "{kind:?} report for {:?} requested by {}: {} players",
        request.team,
        official.username,
        request.players.len()
    );

    let bytes = match kind {
        ExportKind::Pdf => {
            let assets = ReportAssets::load(config);
            render_team_report(&request, source, &assets, config)?
        }
        ExportKind::Xlsx => WorkbookBuilder::new(source, config).build(&request.players)?,
        ExportKind::Docx => DocumentBuilder::new(source, config).build(&request)?,
    };

    log::info!(
        "{kind:?} report for {:?} done in {:.1}ms",
        request.team,
        t0.elapsed().as_secs_f64() * 1000.0
    );
    Ok(Artifact {
        filename: format!("{}{}.{}", config.filename_prefix, request.team, kind.extension()),
        content_type: kind.content_type(),
        bytes,
    })
}

/// Spreadsheet of every registered player, in registration order.
pub fn all_players_workbook(
    store: &dyn RosterStore,
    source: &dyn ImageSource,
    config: &ReportConfig,
) -> Result<Artifact, Error> {
    let players = store.all_players();
    let bytes = WorkbookBuilder::new(source, config).build(&players)?;
    Ok(Artifact {
        filename: ALL_PLAYERS_FILENAME.to_string(),
        content_type: ExportKind::Xlsx.content_type(),
        bytes,
    })
}

/// Stream an artifact to `writer`.
///
/// A failure part-way through is logged and the writer flushed on a best-effort basis;
/// only the original write error is returned.
pub fn write_artifact(artifact: &Artifact, writer: &mut dyn Write) -> Result<(), Error> {
    if let Err(e) = writer.write_all(&artifact.bytes) {
        log::error!("writing {} failed mid-stream: {e}", artifact.filename);
        if let Err(flush_err) = writer.flush() {
            log::debug!("flush after failed write of {} also failed: {flush_err}", artifact.filename);
        }
        return Err(e.into());
    }
    writer.flush()?;
    log::debug!("wrote {} ({} bytes)", artifact.filename, artifact.bytes.len());
    Ok(())
}
