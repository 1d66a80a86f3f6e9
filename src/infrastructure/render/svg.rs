// Minimal SVG document builder shared by the chart renderers
use crate::domain::color::Rgba;
use std::fmt::Write;

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";
const TEXT_COLOR: &str = "#374151";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Fill and stroke for one shape. `None` means "none".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Paint {
    pub fill: Option<Rgba>,
    pub stroke: Option<(Rgba, f64)>,
}

impl Paint {
    pub fn fill(color: Rgba) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }

    pub fn stroke(color: Rgba, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some((color, width)),
        }
    }

    pub fn with_stroke(mut self, color: Rgba, width: f64) -> Self {
        if width > 0.0 {
            self.stroke = Some((color, width));
        }
        self
    }

    fn attributes(&self) -> String {
        let mut attrs = String::new();
        match self.fill {
            Some(color) => {
                let _ = write!(attrs, " fill=\"{}\" fill-opacity=\"{}\"", color.hex(), color.alpha);
            }
            None => attrs.push_str(" fill=\"none\""),
        }
        if let Some((color, width)) = self.stroke {
            let _ = write!(
                attrs,
                " stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{}\"",
                color.hex(),
                color.alpha,
                fmt_num(width)
            );
        }
        attrs
    }
}

/// Accumulates SVG elements over a white background.
#[derive(Debug)]
pub struct SvgDocument {
    width: u32,
    height: u32,
    animated: bool,
    body: String,
}

impl SvgDocument {
    pub fn new(width: u32, height: u32) -> Self {
        let mut doc = Self {
            width,
            height,
            animated: false,
            body: String::new(),
        };
        doc.rect(
            0.0,
            0.0,
            width as f64,
            height as f64,
            Paint::fill(Rgba::new(255, 255, 255, 1.0)),
        );
        doc
    }

    /// Data shapes fade in when animated. Rasterizers ignore the animation.
    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    pub fn width(&self) -> f64 {
        self.width as f64
    }

    pub fn height(&self) -> f64 {
        self.height as f64
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: Paint) {
        let _ = write!(
            self.body,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{}/>",
            fmt_num(x),
            fmt_num(y),
            fmt_num(width.max(0.0)),
            fmt_num(height.max(0.0)),
            paint.attributes()
        );
    }

    /// A data shape; carries the fade-in animation when enabled.
    pub fn data_rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: Paint) {
        let _ = write!(
            self.body,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{}>{}</rect>",
            fmt_num(x),
            fmt_num(y),
            fmt_num(width.max(0.0)),
            fmt_num(height.max(0.0)),
            paint.attributes(),
            self.animation()
        );
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Rgba, width: f64) {
        let _ = write!(
            self.body,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"{}/>",
            fmt_num(x1),
            fmt_num(y1),
            fmt_num(x2),
            fmt_num(y2),
            Paint::stroke(color, width).attributes()
        );
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], paint: Paint) {
        let _ = write!(
            self.body,
            "<polyline points=\"{}\"{} stroke-linejoin=\"round\">{}</polyline>",
            fmt_points(points),
            paint.attributes(),
            self.animation()
        );
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], paint: Paint) {
        let _ = write!(
            self.body,
            "<polygon points=\"{}\"{}>{}</polygon>",
            fmt_points(points),
            paint.attributes(),
            self.animation()
        );
    }

    pub fn path(&mut self, d: &str, paint: Paint) {
        let _ = write!(
            self.body,
            "<path d=\"{}\"{}>{}</path>",
            d,
            paint.attributes(),
            self.animation()
        );
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, paint: Paint) {
        let _ = write!(
            self.body,
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"{}/>",
            fmt_num(cx),
            fmt_num(cy),
            fmt_num(r.max(0.0)),
            paint.attributes()
        );
    }

    pub fn text(&mut self, x: f64, y: f64, size: f64, anchor: TextAnchor, content: &str) {
        self.styled_text(x, y, size, anchor, content, false, None);
    }

    pub fn bold_text(&mut self, x: f64, y: f64, size: f64, anchor: TextAnchor, content: &str) {
        self.styled_text(x, y, size, anchor, content, true, None);
    }

    /// Text rotated by `degrees` around its anchor point.
    pub fn rotated_text(
        &mut self,
        x: f64,
        y: f64,
        size: f64,
        degrees: f64,
        content: &str,
    ) {
        self.styled_text(x, y, size, TextAnchor::Middle, content, false, Some(degrees));
    }

    pub fn colored_text(&mut self, x: f64, y: f64, size: f64, color: Rgba, content: &str) {
        let _ = write!(
            self.body,
            "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" text-anchor=\"middle\" fill=\"{}\">{}</text>",
            fmt_num(x),
            fmt_num(y),
            FONT_FAMILY,
            fmt_num(size),
            color.hex(),
            escape_xml(content)
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn styled_text(
        &mut self,
        x: f64,
        y: f64,
        size: f64,
        anchor: TextAnchor,
        content: &str,
        bold: bool,
        rotation: Option<f64>,
    ) {
        if content.is_empty() {
            return;
        }
        let weight = if bold { " font-weight=\"bold\"" } else { "" };
        let transform = rotation
            .map(|deg| {
                format!(
                    " transform=\"rotate({} {} {})\"",
                    fmt_num(deg),
                    fmt_num(x),
                    fmt_num(y)
                )
            })
            .unwrap_or_default();
        let _ = write!(
            self.body,
            "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" text-anchor=\"{}\" fill=\"{}\"{}{}>{}</text>",
            fmt_num(x),
            fmt_num(y),
            FONT_FAMILY,
            fmt_num(size),
            anchor.as_str(),
            TEXT_COLOR,
            weight,
            transform,
            escape_xml(content)
        );
    }

    fn animation(&self) -> &'static str {
        if self.animated {
            "<animate attributeName=\"opacity\" from=\"0\" to=\"1\" dur=\"0.6s\" fill=\"freeze\"/>"
        } else {
            ""
        }
    }

    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">{body}</svg>",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Two decimals, trailing zeros trimmed.
pub fn fmt_num(value: f64) -> String {
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

fn fmt_points(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", fmt_num(*x), fmt_num(*y)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_num_trims() {
        assert_eq!(fmt_num(3.5), "3.5");
        assert_eq!(fmt_num(7.0), "7");
        assert_eq!(fmt_num(-0.001), "0");
        assert_eq!(fmt_num(1.756), "1.76");
    }

    #[test]
    fn test_text_is_escaped() {
        let mut doc = SvgDocument::new(10, 10);
        doc.text(0.0, 0.0, 12.0, TextAnchor::Start, "a < b & c");
        let svg = doc.finish();
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn test_animation_only_when_enabled() {
        let mut still = SvgDocument::new(10, 10);
        still.data_rect(0.0, 0.0, 1.0, 1.0, Paint::fill(Rgba::new(0, 0, 0, 1.0)));
        assert!(!still.finish().contains("<animate"));

        let mut moving = SvgDocument::new(10, 10).animated(true);
        moving.data_rect(0.0, 0.0, 1.0, 1.0, Paint::fill(Rgba::new(0, 0, 0, 1.0)));
        assert!(moving.finish().contains("<animate"));
    }
}
