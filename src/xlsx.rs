//! Spreadsheet export: one row per player with ID photos and selfie embedded in cells.

use std::time::Instant;

use rust_xlsxwriter::{Format, FormatAlign, Image, Workbook, Worksheet};

use crate::config::ReportConfig;
use crate::error::Error;
use crate::media::{ImageSource, TransformProfile, resolve_image};
use crate::model::PlayerRecord;

/// Column titles and widths (character units), in sheet order.
pub const COLUMNS: [(&str, f64); 10] = [
    ("NAMES", 20.0),
    ("SURNAMES", 20.0),
    ("AGE", 10.0),
    ("BIRTH_DATE", 15.0),
    ("ID_NUMBER", 18.0),
    ("PLAYER_NUMBER", 15.0),
    ("TEAM", 20.0),
    ("ID_FRONT_PHOTO", 18.0),
    ("ID_BACK_PHOTO", 18.0),
    ("SELFIE_PHOTO", 18.0),
];

const FRONT_COL: u16 = 7;
const BACK_COL: u16 = 8;
const SELFIE_COL: u16 = 9;

const IMAGE_WIDTH: u32 = 120;
const IMAGE_HEIGHT: u32 = 80;
const IMAGE_ROW_HEIGHT: f64 = 80.0;

pub const SHEET_NAME: &str = "Players";

/// Spreadsheet builder. Image failures leave the cell blank and never abort the export.
pub struct WorkbookBuilder<'a> {
    source: &'a dyn ImageSource,
    config: &'a ReportConfig,
    profile: TransformProfile,
}

impl<'a> WorkbookBuilder<'a> {
    pub fn new(source: &'a dyn ImageSource, config: &'a ReportConfig) -> Self {
        Self {
            source,
            config,
            profile: TransformProfile::spreadsheet(),
        }
    }

    /// Override the raster variant requested for the image cells.
    pub fn profile(mut self, profile: TransformProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn build(&self, players: &[PlayerRecord]) -> Result<Vec<u8>, Error> {
        let t0 = Instant::now();
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        write_header(sheet)?;

        let mut embedded = 0usize;
        let mut skipped = 0usize;
        for (i, player) in players.iter().enumerate() {
            let row = (i + 1) as u32;
            write_player(sheet, row, player)?;
            sheet.set_row_height(row, IMAGE_ROW_HEIGHT)?;

            let cells = [
                (FRONT_COL, player.id_front_url.as_deref()),
                (BACK_COL, player.id_back_url.as_deref()),
                (SELFIE_COL, player.selfie_url.as_deref()),
            ];
            for (col, reference) in cells {
                if reference.is_none() {
                    continue;
                }
                if self.insert_cell_image(sheet, row, col, reference) {
                    embedded += 1;
                } else {
                    skipped += 1;
                }
            }
        }

        let bytes = workbook.save_to_buffer()?;
        log::info!(
            "XLSX export: {} players, {} images embedded, {} skipped, {:.1}ms, {} bytes",
            players.len(),
            embedded,
            skipped,
            t0.elapsed().as_secs_f64() * 1000.0,
            bytes.len(),
        );
        Ok(bytes)
    }

    fn insert_cell_image(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        col: u16,
        reference: Option<&str>,
    ) -> bool {
        let embedded = match resolve_image(self.source, reference, self.profile, self.config) {
            Ok(img) => img,
            Err(reason) => {
                log::warn!("row {row} col {col}: image skipped ({reason:?})");
                return false;
            }
        };
        let placed = Image::new_from_buffer(&embedded.data)
            .map(|image| image.set_scale_to_size(IMAGE_WIDTH, IMAGE_HEIGHT, false))
            .and_then(|image| sheet.insert_image(row, col, &image).map(|_| ()));
        match placed {
            Ok(()) => true,
            Err(e) => {
                log::warn!("row {row} col {col}: image not embedded ({e})");
                false
            }
        }
    }
}

fn write_header(sheet: &mut Worksheet) -> Result<(), Error> {
    let bold = Format::new().set_bold().set_align(FormatAlign::Center);
    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &bold)?;
        sheet.set_column_width(col, *width)?;
    }
    Ok(())
}

fn write_player(sheet: &mut Worksheet, row: u32, player: &PlayerRecord) -> Result<(), Error> {
    sheet.write_string(row, 0, &player.first_name)?;
    sheet.write_string(row, 1, &player.last_name)?;
    sheet.write_string(row, 2, format!("{} YEARS", player.age))?;
    sheet.write_string(row, 3, player.birth_date_label())?;
    sheet.write_string(row, 4, &player.identification)?;
    sheet.write_number(row, 5, player.jersey_number)?;
    sheet.write_string(row, 6, &player.team)?;
    Ok(())
}
