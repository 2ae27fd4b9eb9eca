mod parts;

use std::io::{Cursor, Write};
use std::time::Instant;

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::config::ReportConfig;
use crate::error::Error;
use crate::media::{ImageSource, TransformProfile, resolve_image};
use crate::model::{Alignment, EmbeddedImage, PlayerRecord, TeamReportRequest};
use crate::wording;

use parts::{DML_NS, PIC_NS, REL_NS, WML_NS, WPD_NS};

/// A4 in twentieths of a point.
pub const PAGE_WIDTH_TWIPS: u32 = 11906;
pub const PAGE_HEIGHT_TWIPS: u32 = 16838;
/// Half an inch on every side.
pub const MARGIN_TWIPS: u32 = 720;

pub const HEADER_TITLES: [&str; 8] = [
    "Names",
    "Surnames",
    "Age",
    "Birth date",
    "ID",
    "Number",
    "Team",
    "Selfie",
];

const SELFIE_WIDTH_PX: u64 = 120;
const SELFIE_HEIGHT_PX: u64 = 80;
const EMU_PER_PX: u64 = 9525;
/// Table body text size in half-points.
const BODY_SIZE: u32 = 20;

fn twips_to_pts(twips: f32) -> f32 {
    twips / 20.0
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn jc(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

#[derive(Default)]
struct ParagraphProps {
    style: Option<&'static str>,
    alignment: Option<Alignment>,
    space_before: Option<u32>,
}

#[derive(Default)]
struct RunProps {
    bold: bool,
    size: Option<u32>,
}

fn run(text: &str, props: &RunProps) -> String {
    let mut rpr = String::new();
    if props.bold {
        rpr.push_str("<w:b/>");
    }
    if let Some(sz) = props.size {
        rpr.push_str(&format!(r#"<w:sz w:val="{sz}"/><w:szCs w:val="{sz}"/>"#));
    }
    let rpr = if rpr.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{rpr}</w:rPr>")
    };
    format!(r#"<w:r>{rpr}<w:t xml:space="preserve">{}</w:t></w:r>"#, escape(text))
}

fn paragraph(props: &ParagraphProps, runs: &str) -> String {
    let mut ppr = String::new();
    if let Some(style) = props.style {
        ppr.push_str(&format!(r#"<w:pStyle w:val="{style}"/>"#));
    }
    if let Some(before) = props.space_before {
        ppr.push_str(&format!(r#"<w:spacing w:before="{before}"/>"#));
    }
    if let Some(alignment) = props.alignment {
        ppr.push_str(&format!(r#"<w:jc w:val="{}"/>"#, jc(alignment)));
    }
    if ppr.is_empty() {
        format!("<w:p>{runs}</w:p>")
    } else {
        format!("<w:p><w:pPr>{ppr}</w:pPr>{runs}</w:p>")
    }
}

fn text_paragraph(text: &str, alignment: Alignment) -> String {
    paragraph(
        &ParagraphProps {
            alignment: Some(alignment),
            ..Default::default()
        },
        &run(text, &RunProps::default()),
    )
}

fn spacer(before: u32) -> String {
    paragraph(
        &ParagraphProps {
            space_before: Some(before),
            ..Default::default()
        },
        "",
    )
}

fn cell(content: &str) -> String {
    format!(r#"<w:tc><w:tcPr><w:tcW w:w="0" w:type="auto"/></w:tcPr>{content}</w:tc>"#)
}

fn header_cell(title: &str) -> String {
    cell(&paragraph(
        &ParagraphProps {
            alignment: Some(Alignment::Center),
            ..Default::default()
        },
        &run(title, &RunProps { bold: true, size: None }),
    ))
}

fn text_cell(text: &str) -> String {
    cell(&paragraph(
        &ParagraphProps::default(),
        &run(
            text,
            &RunProps {
                bold: false,
                size: Some(BODY_SIZE),
            },
        ),
    ))
}

/// Inline picture run referencing relationship `rel_id`.
fn drawing(rel_id: &str, doc_pr_id: usize, file_name: &str) -> String {
    let cx = SELFIE_WIDTH_PX * EMU_PER_PX;
    let cy = SELFIE_HEIGHT_PX * EMU_PER_PX;
    format!(
        r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/><wp:docPr id="{doc_pr_id}" name="Picture {doc_pr_id}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic><a:graphicData uri="{PIC_NS}"><pic:pic><pic:nvPicPr><pic:cNvPr id="{doc_pr_id}" name="{file_name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
    )
}

struct MediaPart {
    rel_id: String,
    path: String,
    data: Vec<u8>,
}

/// Word-processor roster document. Selfies that cannot be fetched become "No image".
pub struct DocumentBuilder<'a> {
    source: &'a dyn ImageSource,
    config: &'a ReportConfig,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(source: &'a dyn ImageSource, config: &'a ReportConfig) -> Self {
        Self { source, config }
    }

    fn selfie_cell(&self, player: &PlayerRecord, media: &mut Vec<MediaPart>) -> String {
        let image: EmbeddedImage = match resolve_image(
            self.source,
            player.selfie_url.as_deref(),
            TransformProfile::ArchivePng,
            self.config,
        ) {
            Ok(img) => img,
            Err(reason) => {
                log::warn!(
                    "selfie for {} {} not embedded: {reason:?}",
                    player.first_name,
                    player.last_name
                );
                return text_cell(wording::NO_IMAGE);
            }
        };

        let n = media.len() + 1;
        // rId1 is the styles part.
        let rel_id = format!("rId{}", n + 1);
        let file_name = format!("image{n}.{}", image.format.extension());
        let picture = drawing(&rel_id, n, &file_name);
        media.push(MediaPart {
            rel_id,
            path: format!("media/{file_name}"),
            data: image.data,
        });
        cell(&paragraph(
            &ParagraphProps {
                alignment: Some(Alignment::Center),
                ..Default::default()
            },
            &picture,
        ))
    }

    fn roster_table(&self, players: &[PlayerRecord], media: &mut Vec<MediaPart>) -> String {
        let text_width = PAGE_WIDTH_TWIPS - 2 * MARGIN_TWIPS;
        let col_w = text_width / HEADER_TITLES.len() as u32;

        let mut out = String::from(
            r#"<w:tbl><w:tblPr><w:tblW w:w="5000" w:type="pct"/><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders><w:tblLayout w:type="autofit"/></w:tblPr><w:tblGrid>"#,
        );
        for _ in HEADER_TITLES {
            out.push_str(&format!(r#"<w:gridCol w:w="{col_w}"/>"#));
        }
        out.push_str("</w:tblGrid>");

        out.push_str("<w:tr>");
        for title in HEADER_TITLES {
            out.push_str(&header_cell(title));
        }
        out.push_str("</w:tr>");

        for player in players {
            out.push_str("<w:tr>");
            out.push_str(&text_cell(&player.first_name));
            out.push_str(&text_cell(&player.last_name));
            out.push_str(&text_cell(&player.age.to_string()));
            out.push_str(&text_cell(&player.birth_date_label()));
            out.push_str(&text_cell(&player.identification));
            out.push_str(&text_cell(&player.jersey_number.to_string()));
            out.push_str(&text_cell(&player.team));
            out.push_str(&self.selfie_cell(player, media));
            out.push_str("</w:tr>");
        }
        out.push_str("</w:tbl>");
        out
    }

    fn document_xml(&self, request: &TeamReportRequest, media: &mut Vec<MediaPart>) -> String {
        let mut body = String::new();
        body.push_str(&paragraph(
            &ParagraphProps {
                style: Some("Heading1"),
                alignment: Some(Alignment::Center),
                ..Default::default()
            },
            &run(&request.team, &RunProps::default()),
        ));
        body.push_str(&paragraph(
            &ParagraphProps {
                style: Some("Heading2"),
                alignment: Some(Alignment::Center),
                ..Default::default()
            },
            &run("Player list", &RunProps::default()),
        ));
        body.push_str(&self.roster_table(&request.players, media));
        body.push_str(&spacer(600));
        body.push_str(&text_paragraph(wording::DECLARATION, Alignment::Justify));
        body.push_str(&spacer(800));
        body.push_str(&text_paragraph(wording::SIGNATURE_RULE, Alignment::Center));
        body.push_str(&text_paragraph(wording::SIGNATURE_LABEL, Alignment::Center));
        body.push_str(&spacer(300));
        body.push_str(&text_paragraph(wording::OFFICIAL_NAME_LINE, Alignment::Center));
        body.push_str(&text_paragraph(wording::OFFICIAL_ID_LINE, Alignment::Center));

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{WML_NS}" xmlns:r="{REL_NS}" xmlns:wp="{WPD_NS}" xmlns:a="{DML_NS}" xmlns:pic="{PIC_NS}"><w:body>{body}<w:sectPr><w:pgSz w:w="{PAGE_WIDTH_TWIPS}" w:h="{PAGE_HEIGHT_TWIPS}"/><w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
            m = MARGIN_TWIPS,
        )
    }

    pub fn build(&self, request: &TeamReportRequest) -> Result<Vec<u8>, Error> {
        let t0 = Instant::now();
        let mut media = Vec::new();
        let document = self.document_xml(request, &mut media);
        let t_body = t0.elapsed();

        let rels: Vec<(String, String)> = media
            .iter()
            .map(|m| (m.rel_id.clone(), m.path.clone()))
            .collect();

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let text_parts = [
            ("[Content_Types].xml", parts::content_types()),
            ("_rels/.rels", parts::package_rels()),
            ("word/_rels/document.xml.rels", parts::document_rels(&rels)),
            ("word/styles.xml", parts::styles()),
            ("word/document.xml", document),
        ];
        for (name, xml) in &text_parts {
            zip.start_file(*name, options)?;
            zip.write_all(xml.as_bytes())?;
        }
        for part in &media {
            zip.start_file(format!("word/{}", part.path), options)?;
            zip.write_all(&part.data)?;
        }
        let bytes = zip.finish()?.into_inner();

        log::info!(
            "DOCX report {:?}: body+fetch={:.1}ms, package={:.1}ms, {} players, {} images, {} bytes ({}x{}pt page)",
            request.team,
            t_body.as_secs_f64() * 1000.0,
            (t0.elapsed() - t_body).as_secs_f64() * 1000.0,
            request.players.len(),
            media.len(),
            bytes.len(),
            twips_to_pts(PAGE_WIDTH_TWIPS as f32),
            twips_to_pts(PAGE_HEIGHT_TWIPS as f32),
        );
        Ok(bytes)
    }
}
