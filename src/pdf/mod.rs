mod canvas;
mod layout;
mod table;

use std::collections::HashMap;
use std::io::Cursor;
use std::time::Instant;

use image::ImageDecoder;
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::config::ReportConfig;
use crate::error::Error;
use crate::fonts::{ASCENT, register_fonts, to_winansi_bytes};
use crate::media::{ImageSource, ReportAssets};
use crate::model::{EmbeddedImage, ImageFormat, TeamReportRequest};

pub use canvas::{Canvas, DrawOp, ImageId, Page, PageRole, PlacedImage, Rgb};
pub use layout::{
    DECLARATION_RESERVE, LayoutCursor, MARGINS, Margins, PAGE_HEIGHT, PAGE_WIDTH, ROW_RESERVE,
    layout_roster,
};
pub use table::{COLUMN_GAP, COLUMNS, ColumnKey, ColumnSpec, column_offsets, table_width};

/// Lay out and serialize the roster report of one team.
pub fn render_team_report(
    request: &TeamReportRequest,
    source: &dyn ImageSource,
    assets: &ReportAssets,
    config: &ReportConfig,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();
    let canvas = layout_roster(request, source, assets, config);
    let t_layout = t0.elapsed();

    let bytes = render(&canvas)?;
    let t_total = t0.elapsed();

    log::info!(
        "PDF report {:?}: layout+fetch={:.1}ms, serialize={:.1}ms, {} players, {} pages, {} bytes",
        request.team,
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        request.players.len(),
        canvas.pages().len(),
        bytes.len(),
    );
    Ok(bytes)
}

/// Write one image XObject. Returns `None` when the pixels cannot be decoded; ops that
/// reference such an image are skipped.
fn embed_image(
    img: &EmbeddedImage,
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<Ref> {
    let xobj_ref = alloc();
    match img.format {
        ImageFormat::Jpeg => {
            let decoder = image::codecs::jpeg::JpegDecoder::new(Cursor::new(&img.data)).ok()?;
            let gray = decoder.color_type() == image::ColorType::L8;
            let mut xobj = pdf.image_xobject(xobj_ref, &img.data);
            xobj.filter(Filter::DctDecode);
            xobj.width(img.pixel_width as i32);
            xobj.height(img.pixel_height as i32);
            if gray {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        ImageFormat::Png => {
            let decoded = image::load_from_memory_with_format(&img.data, image::ImageFormat::Png).ok()?;
            let rgba = decoded.to_rgba8();
            let (w, h) = rgba.dimensions();
            let (color, alpha) = split_alpha(&rgba);

            let smask_ref = alpha.map(|alpha| {
                let mask_ref = alloc();
                let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&alpha, 6);
                write_flate_image(pdf, mask_ref, &compressed, w, h, true);
                mask_ref
            });
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&color, 6);
            let mut xobj = write_flate_image(pdf, xobj_ref, &compressed, w, h, false);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    Some(xobj_ref)
}

/// Interleaved RGB samples plus a separate alpha plane, or `None` when every pixel is
/// opaque.
fn split_alpha(rgba: &image::RgbaImage) -> (Vec<u8>, Option<Vec<u8>>) {
    let pixels = (rgba.width() * rgba.height()) as usize;
    let mut color = Vec::with_capacity(pixels * 3);
    let mut alpha = Vec::with_capacity(pixels);
    for image::Rgba([r, g, b, a]) in rgba.pixels() {
        color.extend_from_slice(&[*r, *g, *b]);
        alpha.push(*a);
    }
    let translucent = alpha.iter().any(|&a| a < u8::MAX);
    (color, translucent.then_some(alpha))
}

fn write_flate_image<'a>(
    pdf: &'a mut Pdf,
    id: Ref,
    compressed: &'a [u8],
    width: u32,
    height: u32,
    gray: bool,
) -> pdf_writer::writers::ImageXObject<'a> {
    let mut xobj = pdf.image_xobject(id, compressed);
    xobj.filter(Filter::FlateDecode);
    xobj.width(width as i32);
    xobj.height(height as i32);
    if gray {
        xobj.color_space().device_gray();
    } else {
        xobj.color_space().device_rgb();
    }
    xobj.bits_per_component(8);
    xobj
}

fn opacity_key(opacity: f32) -> u32 {
    opacity.to_bits()
}

fn write_page_content(
    page: &Page,
    page_height: f32,
    image_names: &HashMap<ImageId, String>,
    alpha_states: &HashMap<u32, String>,
) -> Content {
    let mut content = Content::new();
    // Canvas coordinates grow downward; PDF user space grows upward.
    let flip = |y: f32| page_height - y;

    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                text,
                font,
                size,
                color,
                word_spacing,
            } => {
                let (r, g, b) = color.unit();
                content.save_state();
                content.set_fill_rgb(r, g, b);
                content.begin_text();
                content.set_font(Name(font.pdf_name().as_bytes()), *size);
                if *word_spacing != 0.0 {
                    content.set_word_spacing(*word_spacing);
                }
                content.next_line(*x, flip(y + size * ASCENT));
                content.show(Str(&to_winansi_bytes(text)));
                content.end_text();
                content.restore_state();
            }
            DrawOp::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                let (r, g, b) = color.unit();
                content.save_state();
                content.set_fill_rgb(r, g, b);
                content.rect(*x, flip(y + height), *width, *height);
                content.fill_nonzero();
                content.restore_state();
            }
            DrawOp::Rule {
                x1,
                x2,
                y,
                width,
                color,
            } => {
                let (r, g, b) = color.unit();
                content.save_state();
                content.set_line_width(*width);
                content.set_stroke_rgb(r, g, b);
                content.move_to(*x1, flip(*y));
                content.line_to(*x2, flip(*y));
                content.stroke();
                content.restore_state();
            }
            DrawOp::Image {
                id,
                x,
                y,
                width,
                height,
                opacity,
            } => {
                let Some(name) = image_names.get(id) else {
                    continue;
                };
                content.save_state();
                if let Some(gs) = alpha_states.get(&opacity_key(*opacity)) {
                    content.set_parameters(Name(gs.as_bytes()));
                }
                content.transform([*width, 0.0, 0.0, *height, *x, flip(y + height)]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
            }
        }
    }
    content
}

/// Serialize a laid-out canvas to PDF bytes.
pub fn render(canvas: &Canvas) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let fonts = register_fonts(&mut pdf, &mut alloc);

    let mut image_names: HashMap<ImageId, String> = HashMap::new();
    let mut image_xobjects: Vec<(String, Ref)> = Vec::new();
    for (i, img) in canvas.images().iter().enumerate() {
        match embed_image(img, &mut pdf, &mut alloc) {
            Some(xobj_ref) => {
                let name = format!("Im{}", image_xobjects.len() + 1);
                image_names.insert(ImageId(i), name.clone());
                image_xobjects.push((name, xobj_ref));
            }
            None => log::warn!("image {i} could not be decoded; leaving its box empty"),
        }
    }

    let mut alpha_states: HashMap<u32, String> = HashMap::new();
    let mut ext_states: Vec<(String, Ref)> = Vec::new();
    for op in canvas.pages().iter().flat_map(|p| p.ops.iter()) {
        if let DrawOp::Image { opacity, .. } = op
            && *opacity < 1.0
            && !alpha_states.contains_key(&opacity_key(*opacity))
        {
            let gs_ref = alloc();
            pdf.ext_graphics(gs_ref).non_stroking_alpha(*opacity);
            let name = format!("GS{}", ext_states.len() + 1);
            alpha_states.insert(opacity_key(*opacity), name.clone());
            ext_states.push((name, gs_ref));
        }
    }

    let t_images = t0.elapsed();

    let n = canvas.pages().len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, page) in canvas.pages().iter().enumerate() {
        let content = write_page_content(page, canvas.height, &image_names, &alpha_states);
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, canvas.width, canvas.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for (font, font_ref) in &fonts {
                font_dict.pair(Name(font.pdf_name().as_bytes()), *font_ref);
            }
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
        if !ext_states.is_empty() {
            let mut states = resources.ext_g_states();
            for (name, gs_ref) in &ext_states {
                states.pair(Name(name.as_bytes()), *gs_ref);
            }
        }
    }

    log::debug!(
        "PDF assembly: images={:.1}ms, total={:.1}ms, {} pages, {} images",
        t_images.as_secs_f64() * 1000.0,
        t0.elapsed().as_secs_f64() * 1000.0,
        n,
        image_xobjects.len(),
    );

    Ok(pdf.finish())
}
