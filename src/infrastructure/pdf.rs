// PDF composition - one landscape page with the chart and its insight
use crate::infrastructure::config::PdfSettings;
use printpdf::image_crate::{self, DynamicImage, ImageFormat};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rgb,
};
use thiserror::Error;

pub const INSIGHT_HEADING: &str = "Insights:";

const PT_TO_MM: f32 = 0.352_778;
const MM_PER_INCH: f32 = 25.4;
const IMAGE_DPI: f32 = 300.0;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH_EM: f32 = 0.5;
const RULE_GAP_MM: f32 = 3.0;
const ELLIPSIS: &str = "...";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("chart image could not be decoded: {0}")]
    Image(String),

    #[error("failed to build PDF document: {0}")]
    Document(String),
}

/// Top-down rectangle in millimetres from the page's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightBlock {
    /// Top of the text region; nothing from the image reaches below the image bottom.
    pub top: f32,
    pub heading_baseline: f32,
    pub rule_y: f32,
    pub first_baseline: f32,
    pub line_height: f32,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub image: Rect,
    pub insight: Option<InsightBlock>,
}

fn line_height(font_pt: f32, settings: &PdfSettings) -> f32 {
    font_pt * PT_TO_MM * settings.line_spacing
}

/// Greedy word wrap using an average glyph width. Paragraph breaks are kept
/// and words longer than a line are split.
pub fn wrap_text(text: &str, max_width_mm: f32, font_pt: f32) -> Vec<String> {
    let glyph = font_pt * GLYPH_WIDTH_EM * PT_TO_MM;
    let max_chars = ((max_width_mm / glyph).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }

    lines
}

/// Places the image at the print width and the insight below it. The image
/// shrinks (keeping its aspect ratio) so the two regions never overlap; text
/// that still does not fit is cut with an ellipsis.
pub fn layout(settings: &PdfSettings, image_aspect: f32, insight: Option<&str>) -> PageLayout {
    let print_width = settings.page_width_mm - 2.0 * settings.margin_mm;
    let available = settings.page_height_mm - 2.0 * settings.margin_mm;
    let natural_height = print_width / image_aspect.max(f32::EPSILON);

    let Some(text) = insight else {
        let height = natural_height.min(available);
        return PageLayout {
            image: centered(settings, height, image_aspect, print_width),
            insight: None,
        };
    };

    let heading_height = line_height(settings.heading_font_pt, settings);
    let body_height = line_height(settings.body_font_pt, settings);
    let mut lines = wrap_text(text, print_width, settings.body_font_pt);
    let text_needed = settings.section_gap_mm
        + heading_height
        + RULE_GAP_MM
        + body_height * lines.len() as f32;

    let image_height = natural_height
        .min(available - text_needed)
        .max(settings.min_image_height_mm)
        .min(available);
    let image = centered(settings, image_height, image_aspect, print_width);

    let top = image.bottom() + settings.section_gap_mm;
    let heading_baseline = top + settings.heading_font_pt * PT_TO_MM;
    let rule_y = top + heading_height;
    let first_baseline = rule_y + RULE_GAP_MM + settings.body_font_pt * PT_TO_MM;

    let page_bottom = settings.page_height_mm - settings.margin_mm;
    let room = (page_bottom - (rule_y + RULE_GAP_MM)).max(0.0);
    let max_lines = ((room + 0.01) / body_height).floor() as usize;
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let max_chars = ((print_width / (settings.body_font_pt * GLYPH_WIDTH_EM * PT_TO_MM)).floor()
                as usize)
                .max(ELLIPSIS.len());
            let keep = max_chars - ELLIPSIS.len();
            if last.chars().count() > keep {
                *last = last.chars().take(keep).collect();
            }
            last.push_str(ELLIPSIS);
        }
    }

    PageLayout {
        image,
        insight: Some(InsightBlock {
            top,
            heading_baseline,
            rule_y,
            first_baseline,
            line_height: body_height,
            lines,
        }),
    }
}

fn centered(settings: &PdfSettings, height: f32, aspect: f32, print_width: f32) -> Rect {
    let width = (height * aspect).min(print_width);
    let height = width / aspect.max(f32::EPSILON);
    Rect {
        x: (settings.page_width_mm - width) / 2.0,
        top: settings.margin_mm,
        width,
        height,
    }
}

fn gray(level: u8) -> Color {
    let v = level as f32 / 255.0;
    Color::Rgb(Rgb::new(v, v, v, None))
}

/// Builds the PDF bytes for a chart snapshot and optional insight text.
pub fn compose(png: &[u8], insight: Option<&str>, settings: &PdfSettings) -> Result<Vec<u8>, PdfError> {
    let decoded = image_crate::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(|e| PdfError::Image(e.to_string()))?;
    let rgb = decoded.to_rgb8();
    let (px_width, px_height) = rgb.dimensions();
    if px_width == 0 || px_height == 0 {
        return Err(PdfError::Image("empty image".to_string()));
    }

    let page = layout(settings, px_width as f32 / px_height as f32, insight);
    let page_height = settings.page_height_mm;

    let (doc, page_index, layer_index) = PdfDocument::new(
        "Chart Export",
        Mm(settings.page_width_mm),
        Mm(page_height),
        "Layer 1",
    );
    let layer = doc.get_page(page_index).get_layer(layer_index);

    let natural_width = px_width as f32 / IMAGE_DPI * MM_PER_INCH;
    let natural_height = px_height as f32 / IMAGE_DPI * MM_PER_INCH;
    Image::from_dynamic_image(&DynamicImage::ImageRgb8(rgb)).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(page.image.x)),
            translate_y: Some(Mm(page_height - page.image.bottom())),
            scale_x: Some(page.image.width / natural_width),
            scale_y: Some(page.image.height / natural_height),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );

    if let Some(block) = &page.insight {
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| PdfError::Document(e.to_string()))?;
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| PdfError::Document(e.to_string()))?;
        draw_insight(&layer, block, settings, &bold, &regular);
    }

    doc.save_to_bytes()
        .map_err(|e| PdfError::Document(e.to_string()))
}

fn draw_insight(
    layer: &PdfLayerReference,
    block: &InsightBlock,
    settings: &PdfSettings,
    bold: &IndirectFontRef,
    regular: &IndirectFontRef,
) {
    let page_height = settings.page_height_mm;
    let left = settings.margin_mm;
    let right = settings.page_width_mm - settings.margin_mm;

    layer.set_fill_color(gray(0x2e));
    layer.use_text(
        INSIGHT_HEADING,
        settings.heading_font_pt,
        Mm(left),
        Mm(page_height - block.heading_baseline),
        bold,
    );

    layer.set_outline_color(gray(0x88));
    layer.set_outline_thickness(0.5);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(left), Mm(page_height - block.rule_y)), false),
            (Point::new(Mm(right), Mm(page_height - block.rule_y)), false),
        ],
        is_closed: false,
    });

    layer.set_fill_color(gray(0x44));
    for (i, line) in block.lines.iter().enumerate() {
        let baseline = block.first_baseline + block.line_height * i as f32;
        layer.use_text(
            line.as_str(),
            settings.body_font_pt,
            Mm(left),
            Mm(page_height - baseline),
            regular,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::render::raster::Rasterizer;

    fn chart_png() -> Vec<u8> {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="80" height="60"><rect width="80" height="60" fill="#3b82f6"/></svg>"##;
        Rasterizer::headless()
            .rasterize(svg, 80, 60)
            .unwrap()
            .encode_png()
            .unwrap()
    }

    #[test]
    fn test_wrap_keeps_words_and_paragraphs() {
        // 12pt => ~2.1mm per glyph, 21mm holds 10 glyphs
        let lines = wrap_text("alpha beta gamma\ndelta", 21.2, 12.0);
        assert_eq!(lines, vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_text("abcdefghijklmno", 21.2, 12.0);
        assert_eq!(lines, vec!["abcdefghij", "klmno"]);
    }

    #[test]
    fn test_image_and_text_never_overlap() {
        let settings = PdfSettings::default();
        let long = "Revenue grew steadily across every quarter. ".repeat(40);
        for insight in ["Short insight.", long.as_str()] {
            let page = layout(&settings, 800.0 / 600.0, Some(insight));
            let block = page.insight.unwrap();
            assert!(page.image.bottom() <= block.top);
            let last_baseline = block.first_baseline + block.line_height * (block.lines.len() as f32 - 1.0);
            assert!(last_baseline <= settings.page_height_mm - settings.margin_mm + 0.01);
        }
    }

    #[test]
    fn test_overflowing_text_is_truncated() {
        let settings = PdfSettings::default();
        let long = "word ".repeat(2000);
        let page = layout(&settings, 4.0 / 3.0, Some(&long));
        let lines = page.insight.unwrap().lines;
        assert!(lines.last().unwrap().ends_with(ELLIPSIS));
    }

    #[test]
    fn test_image_fills_print_width_without_insight() {
        let settings = PdfSettings::default();
        let page = layout(&settings, 4.0, None);
        let print_width = settings.page_width_mm - 2.0 * settings.margin_mm;
        assert!((page.image.width - print_width).abs() < 0.01);
        assert!(page.insight.is_none());
    }

    #[test]
    fn test_compose_produces_pdf() {
        let settings = PdfSettings::default();
        let bytes = compose(&chart_png(), Some("Sales peaked in March."), &settings).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_compose_rejects_non_png() {
        let err = compose(b"not a png", None, &PdfSettings::default()).unwrap_err();
        assert!(matches!(err, PdfError::Image(_)));
    }
}
