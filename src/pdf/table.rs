use crate::fonts::{Font, clip_to_width};
use crate::model::{PlaceholderReason, PlayerRecord};
use crate::wording::NO_IMAGE;

use super::canvas::{Canvas, DrawOp, PlacedImage, Rgb};
use super::layout::{COLOR_TEXT, LayoutCursor, MARGINS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKey {
    FirstName,
    LastName,
    Age,
    BirthDate,
    Identification,
    JerseyNumber,
    Team,
    Selfie,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSpec {
    pub key: ColumnKey,
    pub title: &'static str,
    pub width: f32,
}

pub const COLUMNS: [ColumnSpec; 8] = [
    ColumnSpec { key: ColumnKey::FirstName, title: "Names", width: 80.0 },
    ColumnSpec { key: ColumnKey::LastName, title: "Surnames", width: 70.0 },
    ColumnSpec { key: ColumnKey::Age, title: "Age", width: 30.0 },
    ColumnSpec { key: ColumnKey::BirthDate, title: "Birth date", width: 60.0 },
    ColumnSpec { key: ColumnKey::Identification, title: "ID", width: 75.0 },
    ColumnSpec { key: ColumnKey::JerseyNumber, title: "Number", width: 40.0 },
    ColumnSpec { key: ColumnKey::Team, title: "Team", width: 75.0 },
    ColumnSpec { key: ColumnKey::Selfie, title: "Selfie", width: 62.0 },
];

pub const COLUMN_GAP: f32 = 6.0;
pub const FONT_SIZE: f32 = 9.0;

const HEADER_FILL: Rgb = Rgb::hex(0xf5f5f5);
const HEADER_TEXT: Rgb = Rgb::hex(0x111111);
const HEADER_RULE: Rgb = Rgb::hex(0xd9d9d9);
const ROW_RULE: Rgb = Rgb::hex(0xeeeeee);

const THUMB_MAX_W: f32 = 58.0;
const THUMB_MAX_H: f32 = 42.0;
const THUMB_Y_OFFSET: f32 = -2.0;
const MIN_ROW_HEIGHT: f32 = 14.0;

impl ColumnKey {
    fn cell_text(self, player: &PlayerRecord) -> String {
        match self {
            ColumnKey::FirstName => player.first_name.clone(),
            ColumnKey::LastName => player.last_name.clone(),
            ColumnKey::Age => player.age.to_string(),
            ColumnKey::BirthDate => player.birth_date_label(),
            ColumnKey::Identification => player.identification.clone(),
            ColumnKey::JerseyNumber => player.jersey_number.to_string(),
            ColumnKey::Team => player.team.clone(),
            ColumnKey::Selfie => String::new(),
        }
    }
}

pub fn table_left() -> f32 {
    MARGINS.left
}

pub fn table_width() -> f32 {
    COLUMNS.iter().map(|c| c.width).sum::<f32>() + COLUMN_GAP * (COLUMNS.len() - 1) as f32
}

/// Left edge of every column: widths accumulated plus the inter-column gap.
pub fn column_offsets() -> [f32; 8] {
    let mut x = table_left();
    COLUMNS.map(|c| {
        let at = x;
        x += c.width + COLUMN_GAP;
        at
    })
}

pub(super) fn draw_column_header(canvas: &mut Canvas, cursor: &mut LayoutCursor) {
    let start_x = table_left();
    let width = table_width();
    canvas.push(DrawOp::FillRect {
        x: start_x - 2.0,
        y: cursor.y - 2.0,
        width: width + 4.0,
        height: 18.0,
        color: HEADER_FILL,
    });
    for (col, x) in COLUMNS.iter().zip(column_offsets()) {
        canvas.push(DrawOp::Text {
            x,
            y: cursor.y,
            text: clip_to_width(col.title, Font::Bold, FONT_SIZE, col.width),
            font: Font::Bold,
            size: FONT_SIZE,
            color: HEADER_TEXT,
            word_spacing: 0.0,
        });
    }
    cursor.advance(16.0);
    canvas.push(DrawOp::Rule {
        x1: start_x,
        x2: start_x + width,
        y: cursor.y,
        width: 0.7,
        color: HEADER_RULE,
    });
    cursor.advance(6.0);
}

/// Draw one player row and advance the cursor past it. A thumbnail that could not be
/// resolved renders as the placeholder text.
pub(super) fn draw_player_row(
    canvas: &mut Canvas,
    cursor: &mut LayoutCursor,
    player: &PlayerRecord,
    thumbnail: Result<PlacedImage, PlaceholderReason>,
) {
    let offsets = column_offsets();
    for (col, &x) in COLUMNS.iter().zip(offsets.iter()).take(COLUMNS.len() - 1) {
        let text = clip_to_width(&col.key.cell_text(player), Font::Regular, FONT_SIZE, col.width);
        if text.is_empty() {
            continue;
        }
        canvas.push(DrawOp::Text {
            x,
            y: cursor.y,
            text,
            font: Font::Regular,
            size: FONT_SIZE,
            color: COLOR_TEXT,
            word_spacing: 0.0,
        });
    }

    let selfie = &COLUMNS[COLUMNS.len() - 1];
    let selfie_x = offsets[COLUMNS.len() - 1];
    let drawn_height = match thumbnail {
        Ok(placed) => {
            let (w, h) = placed.fit(selfie.width.min(THUMB_MAX_W), THUMB_MAX_H);
            canvas.push(DrawOp::Image {
                id: placed.id,
                x: selfie_x,
                y: cursor.y + THUMB_Y_OFFSET,
                width: w,
                height: h,
                opacity: 1.0,
            });
            THUMB_MAX_H
        }
        Err(_) => {
            canvas.push(DrawOp::Text {
                x: selfie_x,
                y: cursor.y,
                text: NO_IMAGE.to_string(),
                font: Font::Regular,
                size: FONT_SIZE,
                color: COLOR_TEXT,
                word_spacing: 0.0,
            });
            0.0
        }
    };

    let row_height = if drawn_height > 0.0 {
        MIN_ROW_HEIGHT.max(drawn_height + 4.0)
    } else {
        MIN_ROW_HEIGHT
    };
    cursor.advance(row_height);

    canvas.push(DrawOp::Rule {
        x1: table_left(),
        x2: table_left() + table_width(),
        y: cursor.y,
        width: 0.5,
        color: ROW_RULE,
    });
    cursor.advance(4.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_accumulate_widths_and_gap() {
        let offsets = column_offsets();
        assert_eq!(offsets[0], 36.0);
        assert_eq!(offsets[1], 36.0 + 80.0 + 6.0);
        assert_eq!(offsets[7], 36.0 + 430.0 + 7.0 * 6.0);
        assert_eq!(table_width(), 492.0 + 42.0);
    }
}
