// SVG rasterization with resvg
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RasterError {
    #[error("cannot allocate a {width}x{height} surface")]
    InvalidSize { width: u32, height: u32 },

    #[error("failed to parse chart SVG: {0}")]
    Parse(String),

    #[error("failed to encode PNG: {0}")]
    Encode(String),
}

/// Parses SVG documents and draws them onto pixel buffers.
/// Cheap to clone; the font database is shared.
#[derive(Clone)]
pub struct Rasterizer {
    fontdb: Arc<fontdb::Database>,
}

impl Rasterizer {
    pub fn with_system_fonts() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        tracing::info!("Loaded {} font faces for chart rasterization", db.len());
        Self { fontdb: Arc::new(db) }
    }

    /// No fonts: shapes render, text is skipped. Used where fonts are unavailable.
    pub fn headless() -> Self {
        Self {
            fontdb: Arc::new(fontdb::Database::new()),
        }
    }

    fn parse(&self, svg: &str) -> Result<Tree, RasterError> {
        let options = Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        Tree::from_str(svg, &options).map_err(|e| RasterError::Parse(e.to_string()))
    }

    /// Draws `svg` scaled to fill `pixmap`.
    pub fn rasterize_into(&self, svg: &str, pixmap: &mut Pixmap) -> Result<(), RasterError> {
        let tree = self.parse(svg)?;
        let size = tree.size();
        let transform = Transform::from_scale(
            pixmap.width() as f32 / size.width(),
            pixmap.height() as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        Ok(())
    }

    pub fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Surface, RasterError> {
        let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::InvalidSize { width, height })?;
        self.rasterize_into(svg, &mut pixmap)?;
        Ok(Surface { pixmap })
    }
}

impl std::fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer")
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

/// The pixel buffer behind a mounted chart.
#[derive(Debug, Clone)]
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        encode_png(&self.pixmap)
    }
}

pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, RasterError> {
    pixmap.encode_png().map_err(|e| RasterError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_rasterize_scales_to_surface() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#ff0000"/></svg>"##;
        let surface = Rasterizer::headless().rasterize(svg, 40, 20).unwrap();
        assert_eq!((surface.width(), surface.height()), (40, 20));

        let png = surface.encode_png().unwrap();
        assert_eq!(&png[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_rejects_zero_size_and_bad_svg() {
        let rasterizer = Rasterizer::headless();
        assert_eq!(
            rasterizer.rasterize("<svg/>", 0, 10).unwrap_err(),
            RasterError::InvalidSize { width: 0, height: 10 }
        );
        assert!(matches!(
            rasterizer.rasterize("not svg", 10, 10),
            Err(RasterError::Parse(_))
        ));
    }
}
