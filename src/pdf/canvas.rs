use crate::fonts::{Font, LINE_HEIGHT_RATIO, text_width};
use crate::model::{Alignment, EmbeddedImage};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn hex(v: u32) -> Self {
        Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    pub(super) fn unit(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub(crate) usize);

/// An image registered on the canvas, with the pixel size needed to fit it in a box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedImage {
    pub id: ImageId,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl PlacedImage {
    /// Largest size with the image's aspect ratio inside `max_w` x `max_h`.
    pub fn fit(&self, max_w: f32, max_h: f32) -> (f32, f32) {
        let (pw, ph) = (self.pixel_width as f32, self.pixel_height as f32);
        let scale = (max_w / pw).min(max_h / ph);
        (pw * scale, ph * scale)
    }
}

/// One drawing instruction. Coordinates are top-down points from the page's top-left
/// corner; `y` of a text op is the top of its line box.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        font: Font,
        size: f32,
        color: Rgb,
        word_spacing: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        width: f32,
        color: Rgb,
    },
    Image {
        id: ImageId,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        opacity: f32,
    },
}

impl DrawOp {
    /// Lowest point this op marks on the page.
    pub fn bottom(&self) -> f32 {
        match self {
            DrawOp::Text { y, size, .. } => y + size * LINE_HEIGHT_RATIO,
            DrawOp::FillRect { y, height, .. } => y + height,
            DrawOp::Rule { y, width, .. } => y + width / 2.0,
            DrawOp::Image { y, height, .. } => y + height,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DrawOp::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Why a page was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageRole {
    First,
    RowsContinuation,
    DeclarationOnly,
}

#[derive(Clone, Debug)]
pub struct Page {
    pub role: PageRole,
    pub ops: Vec<DrawOp>,
}

/// Display list for a whole report, serialized to PDF by [`super::render`].
pub struct Canvas {
    pub width: f32,
    pub height: f32,
    pages: Vec<Page>,
    images: Vec<EmbeddedImage>,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pages: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn images(&self) -> &[EmbeddedImage] {
        &self.images
    }

    pub(super) fn start_page(&mut self, role: PageRole) -> usize {
        self.pages.push(Page {
            role,
            ops: Vec::new(),
        });
        self.pages.len() - 1
    }

    pub(super) fn add_image(&mut self, image: EmbeddedImage) -> PlacedImage {
        let placed = PlacedImage {
            id: ImageId(self.images.len()),
            pixel_width: image.pixel_width,
            pixel_height: image.pixel_height,
        };
        self.images.push(image);
        placed
    }

    pub(super) fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Place one line of text inside a box of `width`, resolving the alignment to an x.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn text_line(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        width: f32,
        alignment: Alignment,
        font: Font,
        size: f32,
        color: Rgb,
    ) {
        let tw = text_width(text, font, size);
        let x = x + match alignment {
            Alignment::Center => ((width - tw) / 2.0).max(0.0),
            Alignment::Right => (width - tw).max(0.0),
            Alignment::Left | Alignment::Justify => 0.0,
        };
        self.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            font,
            size,
            color,
            word_spacing: 0.0,
        });
    }
}
