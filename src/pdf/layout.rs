use crate::config::{Branding, ReportConfig};
use crate::fonts::{Font, clip_to_width, text_width, wrap_lines};
use crate::media::{ImageSource, ReportAssets, TransformProfile, resolve_image};
use crate::model::{Alignment, PlaceholderReason, TeamReportRequest};
use crate::wording;

use super::canvas::{Canvas, DrawOp, PageRole, PlacedImage, Rgb};
use super::table::{draw_column_header, draw_player_row, table_left, table_width};

/// A4 portrait, in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
}

/// The top margin leaves room for the institutional header band.
pub const MARGINS: Margins = Margins {
    top: 54.0,
    left: 36.0,
    right: 36.0,
    bottom: 36.0,
};

/// Worst-case height of a row carrying a thumbnail.
pub const ROW_RESERVE: f32 = 130.0;
/// Room the declaration and signature block need on one page.
pub const DECLARATION_RESERVE: f32 = 180.0;

const TEAM_TITLE_GAP: f32 = 28.0;
const GAP_BEFORE_DECLARATION: f32 = 22.0;
const GAP_AFTER_DECLARATION: f32 = 70.0;

const WATERMARK_OPACITY: f32 = 0.06;
const LOGO_WIDTH: f32 = 52.0;
/// Tallest header logo that still ends above the band rule.
const LOGO_MAX_HEIGHT: f32 = 56.0;

pub(super) const COLOR_PRIMARY: Rgb = Rgb::hex(0xc62828);
pub(super) const COLOR_SECOND: Rgb = Rgb::hex(0x0b2a6d);
pub(super) const COLOR_TEXT: Rgb = Rgb::hex(0x222222);
const COLOR_BAND_RULE: Rgb = Rgb::hex(0xe0e0e0);

/// Vertical write position on the active page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutCursor {
    pub y: f32,
    /// First usable offset below the header band.
    pub top: f32,
    /// Page height minus the bottom margin.
    pub bottom: f32,
    pub page: usize,
}

impl LayoutCursor {
    pub fn new(bottom: f32) -> Self {
        Self {
            y: 0.0,
            top: 0.0,
            bottom,
            page: 0,
        }
    }

    fn reset(&mut self, page: usize, top: f32) {
        self.page = page;
        self.top = top;
        self.y = top;
    }

    pub fn advance(&mut self, dy: f32) {
        debug_assert!(dy >= 0.0, "cursor never moves up within a page");
        self.y += dy;
    }

    /// True while at least `reserve` points remain above the bottom margin.
    pub fn fits(&self, reserve: f32) -> bool {
        self.y <= self.bottom - reserve
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum LayoutState {
    PageHeaderDrawn,
    TableHeaderDrawn,
    EmittingRows,
    NewPageRows,
    DeclarationBlock,
    Done,
}

impl LayoutState {
    fn can_enter(self, next: LayoutState) -> bool {
        use LayoutState::*;
        matches!(
            (self, next),
            (PageHeaderDrawn, TableHeaderDrawn)
                | (TableHeaderDrawn | EmittingRows, EmittingRows | NewPageRows | DeclarationBlock)
                | (NewPageRows, EmittingRows)
                | (DeclarationBlock, Done)
        )
    }
}

fn enter(state: &mut LayoutState, next: LayoutState, cursor: &LayoutCursor) {
    debug_assert!(state.can_enter(next), "illegal layout transition {state:?} -> {next:?}");
    log::trace!("layout {:?} -> {:?} page={} y={:.1}", state, next, cursor.page, cursor.y);
    *state = next;
}

/// What every page repeats: watermark and the branded header band.
struct PageChrome<'a> {
    logo: Option<PlacedImage>,
    branding: &'a Branding,
}

fn draw_watermark(canvas: &mut Canvas, logo: Option<PlacedImage>) {
    let Some(logo) = logo else {
        return;
    };
    let side = (PAGE_WIDTH * 0.45).min(320.0);
    let (width, height) = logo.fit(side, side);
    canvas.push(DrawOp::Image {
        id: logo.id,
        x: (PAGE_WIDTH - width) / 2.0,
        y: (PAGE_HEIGHT - height) / 2.0,
        width,
        height,
        opacity: WATERMARK_OPACITY,
    });
}

/// Draw the branded band and return the offset where page content starts.
fn draw_institutional_header(canvas: &mut Canvas, chrome: &PageChrome) -> f32 {
    let start_y = MARGINS.top - 6.0;
    let logo_w = if chrome.logo.is_some() { LOGO_WIDTH } else { 0.0 };
    let indent = if logo_w > 0.0 { logo_w + 12.0 } else { 0.0 };
    let title_x = MARGINS.left + indent;
    let title_w = PAGE_WIDTH - MARGINS.left - MARGINS.right - indent;

    if let Some(logo) = chrome.logo {
        let (width, height) = logo.fit(LOGO_WIDTH, LOGO_MAX_HEIGHT);
        canvas.push(DrawOp::Image {
            id: logo.id,
            x: MARGINS.left,
            y: start_y - 4.0,
            width,
            height,
            opacity: 1.0,
        });
    }

    let lines = [
        (&chrome.branding.league, 0.0, Font::Bold, 14.0, COLOR_PRIMARY),
        (&chrome.branding.charter, 20.0, Font::Regular, 10.0, COLOR_TEXT),
        (&chrome.branding.tournament, 36.0, Font::Bold, 11.0, COLOR_SECOND),
    ];
    for (text, dy, font, size, color) in lines {
        let text = clip_to_width(text, font, size, title_w);
        canvas.text_line(&text, title_x, start_y + dy, title_w, Alignment::Left, font, size, color);
    }

    let line_y = start_y + 56.0;
    canvas.push(DrawOp::Rule {
        x1: MARGINS.left,
        x2: PAGE_WIDTH - MARGINS.right,
        y: line_y,
        width: 1.0,
        color: COLOR_BAND_RULE,
    });
    line_y + 12.0
}

fn begin_page(canvas: &mut Canvas, cursor: &mut LayoutCursor, role: PageRole, chrome: &PageChrome) {
    let index = canvas.start_page(role);
    draw_watermark(canvas, chrome.logo);
    let top = draw_institutional_header(canvas, chrome);
    cursor.reset(index, top);
    log::debug!("page {} ({:?}) content starts at y={:.1}", index + 1, role, top);
}

fn draw_team_title(canvas: &mut Canvas, cursor: &mut LayoutCursor, team: &str) {
    let width = PAGE_WIDTH - MARGINS.left - MARGINS.right;
    let title = clip_to_width(&wording::team_title(team), Font::Bold, 16.0, width);
    canvas.text_line(&title, MARGINS.left, cursor.y, width, Alignment::Center, Font::Bold, 16.0, COLOR_TEXT);
    cursor.advance(TEAM_TITLE_GAP);
}

/// Justified declaration paragraph followed by the centered signature block.
fn draw_declaration(canvas: &mut Canvas, cursor: &mut LayoutCursor) {
    let size = 10.0;
    let line_h = Font::line_height(size);
    let x = table_left();
    let width = table_width();

    let lines = wrap_lines(wording::DECLARATION, Font::Regular, size, width);
    let last = lines.len().saturating_sub(1);
    for (i, line) in lines.iter().enumerate() {
        let gaps = line.matches(' ').count();
        let word_spacing = if i < last && gaps > 0 {
            (width - text_width(line, Font::Regular, size)) / gaps as f32
        } else {
            0.0
        };
        canvas.push(DrawOp::Text {
            x,
            y: cursor.y,
            text: line.clone(),
            font: Font::Regular,
            size,
            color: COLOR_TEXT,
            word_spacing,
        });
        cursor.advance(line_h);
    }

    cursor.advance(GAP_AFTER_DECLARATION);

    let centered = |canvas: &mut Canvas, cursor: &mut LayoutCursor, text: &str| {
        canvas.text_line(text, x, cursor.y, width, Alignment::Center, Font::Regular, size, COLOR_TEXT);
        cursor.advance(line_h);
    };
    centered(canvas, cursor, wording::SIGNATURE_RULE);
    centered(canvas, cursor, wording::SIGNATURE_LABEL);
    cursor.advance(line_h * 1.2);
    centered(canvas, cursor, wording::OFFICIAL_NAME_LINE);
    centered(canvas, cursor, wording::OFFICIAL_ID_LINE);
}

/// Lay out the full roster report for one team.
///
/// Rows go strictly in input order. Each selfie is fetched through `source` while its row
/// is laid out; a failed fetch only costs that row its thumbnail.
pub fn layout_roster(
    request: &TeamReportRequest,
    source: &dyn ImageSource,
    assets: &ReportAssets,
    config: &ReportConfig,
) -> Canvas {
    let mut canvas = Canvas::new(PAGE_WIDTH, PAGE_HEIGHT);
    let logo = assets.logo.clone().map(|img| canvas.add_image(img));
    let chrome = PageChrome {
        logo,
        branding: &config.branding,
    };
    let mut cursor = LayoutCursor::new(PAGE_HEIGHT - MARGINS.bottom);
    let mut state = LayoutState::PageHeaderDrawn;

    begin_page(&mut canvas, &mut cursor, PageRole::First, &chrome);
    draw_team_title(&mut canvas, &mut cursor, &request.team);
    draw_column_header(&mut canvas, &mut cursor);
    enter(&mut state, LayoutState::TableHeaderDrawn, &cursor);

    for player in &request.players {
        if !cursor.fits(ROW_RESERVE) {
            enter(&mut state, LayoutState::NewPageRows, &cursor);
            begin_page(&mut canvas, &mut cursor, PageRole::RowsContinuation, &chrome);
            draw_column_header(&mut canvas, &mut cursor);
        }
        enter(&mut state, LayoutState::EmittingRows, &cursor);

        let thumbnail = resolve_image(
            source,
            player.selfie_url.as_deref(),
            TransformProfile::ReportThumbnail,
            config,
        );
        match &thumbnail {
            Ok(_) => {}
            Err(PlaceholderReason::MissingReference) => {
                log::debug!("{} {} has no selfie on file", player.first_name, player.last_name);
            }
            Err(reason) => {
                log::warn!(
                    "selfie for {} {} unavailable, using placeholder: {reason:?}",
                    player.first_name,
                    player.last_name
                );
            }
        }
        let thumbnail = thumbnail.map(|img| canvas.add_image(img));

        log::debug!("row {} {} at page={} y={:.1}", player.last_name, player.first_name, cursor.page + 1, cursor.y);
        draw_player_row(&mut canvas, &mut cursor, player, thumbnail);
    }

    cursor.advance(GAP_BEFORE_DECLARATION);
    if !cursor.fits(DECLARATION_RESERVE) {
        begin_page(&mut canvas, &mut cursor, PageRole::DeclarationOnly, &chrome);
    }
    enter(&mut state, LayoutState::DeclarationBlock, &cursor);
    draw_declaration(&mut canvas, &mut cursor);
    enter(&mut state, LayoutState::Done, &cursor);

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_fit_is_inclusive() {
        let mut cursor = LayoutCursor::new(800.0);
        cursor.reset(0, 100.0);
        cursor.advance(570.0);
        assert!(cursor.fits(130.0));
        cursor.advance(0.5);
        assert!(!cursor.fits(130.0));
    }

    #[test]
    fn layout_transitions_follow_the_page_flow() {
        use LayoutState::*;
        assert!(PageHeaderDrawn.can_enter(TableHeaderDrawn));
        assert!(TableHeaderDrawn.can_enter(DeclarationBlock));
        assert!(TableHeaderDrawn.can_enter(NewPageRows));
        assert!(EmittingRows.can_enter(EmittingRows));
        assert!(NewPageRows.can_enter(EmittingRows));
        assert!(DeclarationBlock.can_enter(Done));

        assert!(!PageHeaderDrawn.can_enter(EmittingRows));
        assert!(!NewPageRows.can_enter(NewPageRows));
        assert!(!NewPageRows.can_enter(DeclarationBlock));
        assert!(!DeclarationBlock.can_enter(EmittingRows));
        assert!(!Done.can_enter(DeclarationBlock));
    }
}
