// Export service - PNG and PDF artifacts from mounted or off-screen charts
use crate::application::render_adapter::{render, unsupported_message, RenderOptions, RenderOutcome};
use crate::domain::artifact::{Artifact, ArtifactFormat};
use crate::domain::chart::ChartConfig;
use crate::infrastructure::config::{DisplaySettings, ExportSettings};
use crate::infrastructure::pdf::{self, PdfError};
use crate::infrastructure::render::offscreen::OffscreenRegistry;
use crate::infrastructure::render::raster::{RasterError, Rasterizer, Surface};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("chart {0} is not on screen")]
    MissingSurface(String),

    #[error("failed to create off-screen chart: {0}")]
    OffscreenConstruction(#[source] RasterError),

    #[error("chart cannot be rendered: {0}")]
    Unrenderable(String),

    #[error("off-screen chart did not finish drawing within {0:?}")]
    SettleTimeout(Duration),

    #[error("failed to rasterize chart: {0}")]
    Rasterize(#[source] RasterError),

    #[error("failed to encode chart image: {0}")]
    Encode(#[source] RasterError),

    #[error(transparent)]
    Pdf(#[from] PdfError),
}

#[derive(Clone)]
pub struct ExportService {
    rasterizer: Rasterizer,
    offscreen: OffscreenRegistry,
    settings: ExportSettings,
}

impl ExportService {
    pub fn new(rasterizer: Rasterizer, offscreen: OffscreenRegistry, settings: ExportSettings) -> Self {
        Self {
            rasterizer,
            offscreen,
            settings,
        }
    }

    pub fn live_offscreen(&self) -> usize {
        self.offscreen.live()
    }

    /// Draws a chart for display. Charts that cannot render have no surface.
    pub fn mount(&self, chart: &ChartConfig, display: &DisplaySettings) -> Option<Surface> {
        let options = RenderOptions::new(display.width, display.height)
            .with_axis_labels(chart.x_label.as_deref(), chart.y_label.as_deref());
        let outcome = render(&chart.chart_type, chart.chart_data.as_ref(), &options);
        let rendered = outcome.into_rendered()?;

        match self.rasterizer.rasterize(&rendered.svg, rendered.width, rendered.height) {
            Ok(surface) => Some(surface),
            Err(e) => {
                tracing::warn!("Failed to mount chart {}: {}", chart.id, e);
                None
            }
        }
    }

    /// Encodes the pixels of a mounted chart. The surface is only read.
    pub fn png_from_surface(&self, chart_key: &str, surface: Option<&Surface>) -> Result<Artifact, ExportError> {
        let surface = surface.ok_or_else(|| ExportError::MissingSurface(chart_key.to_string()))?;
        let png = surface.encode_png().map_err(ExportError::Encode)?;
        Ok(Artifact::for_chart(chart_key, ArtifactFormat::Png, png))
    }

    pub async fn png_offscreen(&self, chart: &ChartConfig) -> Result<Artifact, ExportError> {
        let png = self.snapshot_offscreen(chart).await?;
        Ok(Artifact::for_chart(&chart.id, ArtifactFormat::Png, png))
    }

    pub async fn pdf(&self, chart: &ChartConfig, insight: Option<&str>) -> Result<Artifact, ExportError> {
        let png = self.snapshot_offscreen(chart).await?;
        let bytes = pdf::compose(&png, insight, &self.settings.pdf)?;
        Ok(Artifact::for_chart(&chart.id, ArtifactFormat::Pdf, bytes))
    }

    /// Create, draw, settle, rasterize. The instance is destroyed on every
    /// path, including early returns, because it is dropped at scope exit.
    async fn snapshot_offscreen(&self, chart: &ChartConfig) -> Result<Vec<u8>, ExportError> {
        let (width, height) = (self.settings.width, self.settings.height);
        let mut instance = self
            .offscreen
            .create(width, height)
            .map_err(ExportError::OffscreenConstruction)?;

        let options = RenderOptions::new(width, height)
            .with_axis_labels(chart.x_label.as_deref(), chart.y_label.as_deref())
            .without_animation();
        let rendered = match render(&chart.chart_type, chart.chart_data.as_ref(), &options) {
            RenderOutcome::Rendered(rendered) => rendered,
            RenderOutcome::Unsupported { chart_type, .. } => {
                return Err(ExportError::Unrenderable(unsupported_message(&chart_type)));
            }
            RenderOutcome::InvalidData { reason, .. } => {
                return Err(ExportError::Unrenderable(reason.to_string()));
            }
        };

        instance
            .draw(&self.rasterizer, &rendered.svg)
            .map_err(ExportError::Rasterize)?;

        let max_wait = Duration::from_millis(self.settings.settle_delay_ms);
        if !instance.settle(max_wait).await {
            return Err(ExportError::SettleTimeout(max_wait));
        }

        let png = instance.snapshot().map_err(ExportError::Encode)?;
        instance.destroy();
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::chart;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

    fn service(width: u32, height: u32) -> ExportService {
        ExportService::new(
            Rasterizer::headless(),
            OffscreenRegistry::new(),
            ExportSettings {
                width,
                height,
                settle_delay_ms: 200,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_unmounted_chart_has_no_surface() {
        let service = service(80, 60);
        let err = service.png_from_surface("c1", None).unwrap_err();
        assert!(matches!(err, ExportError::MissingSurface(id) if id == "c1"));
    }

    #[test]
    fn test_mounted_chart_exports_its_pixels() {
        let service = service(80, 60);
        let display = DisplaySettings { width: 64, height: 48 };
        let surface = service.mount(&chart("c1", "line"), &display).unwrap();
        assert_eq!((surface.width(), surface.height()), (64, 48));

        let artifact = service.png_from_surface("c1", Some(&surface)).unwrap();
        assert_eq!(artifact.filename, "chart-c1.png");
        assert!(artifact.bytes.starts_with(PNG_MAGIC));
    }

    #[test]
    fn test_unsupported_chart_does_not_mount() {
        let service = service(80, 60);
        assert!(service.mount(&chart("c1", "scatter3d"), &DisplaySettings::default()).is_none());
    }

    #[tokio::test]
    async fn test_offscreen_success_releases_instance() {
        let service = service(80, 60);
        let before = service.live_offscreen();

        let artifact = service.png_offscreen(&chart("c1", "bar")).await.unwrap();

        assert!(artifact.bytes.starts_with(PNG_MAGIC));
        assert_eq!(service.live_offscreen(), before);
    }

    #[tokio::test]
    async fn test_induced_failures_release_instance() {
        let service = service(80, 60);
        let before = service.live_offscreen();

        let err = service.png_offscreen(&chart("c1", "scatter3d")).await.unwrap_err();
        assert!(matches!(err, ExportError::Unrenderable(_)));
        assert_eq!(service.live_offscreen(), before);

        let mut broken = chart("c2", "bar");
        broken.chart_data = None;
        let err = service.pdf(&broken, Some("text")).await.unwrap_err();
        assert!(matches!(err, ExportError::Unrenderable(_)));
        assert_eq!(service.live_offscreen(), before);
    }

    #[tokio::test]
    async fn test_construction_failure_is_reported() {
        let service = service(0, 0);
        let err = service.png_offscreen(&chart("c1", "bar")).await.unwrap_err();
        assert!(matches!(err, ExportError::OffscreenConstruction(_)));
        assert_eq!(service.live_offscreen(), 0);
    }

    #[tokio::test]
    async fn test_pdf_export() {
        let service = service(160, 120);
        let artifact = service
            .pdf(&chart("c1", "doughnut"), Some("Feb sales were double January."))
            .await
            .unwrap();
        assert_eq!(artifact.filename, "chart-c1.pdf");
        assert!(artifact.bytes.starts_with(b"%PDF"));
        assert_eq!(service.live_offscreen(), 0);
    }
}
