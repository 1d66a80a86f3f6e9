// Off-screen chart instances - detached surfaces that are always destroyed
use super::raster::{encode_png, RasterError, Rasterizer};
use resvg::tiny_skia::Pixmap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Hands out off-screen instances and counts how many are alive.
#[derive(Debug, Clone, Default)]
pub struct OffscreenRegistry {
    live: Arc<AtomicUsize>,
}

impl OffscreenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Allocates a detached surface. Nothing is counted if allocation fails.
    pub fn create(&self, width: u32, height: u32) -> Result<OffscreenChart, RasterError> {
        let pixmap = Pixmap::new(width, height).ok_or(RasterError::InvalidSize { width, height })?;
        self.live.fetch_add(1, Ordering::SeqCst);
        let (drawn_tx, drawn_rx) = watch::channel(false);
        tracing::debug!("Created off-screen chart ({}x{})", width, height);
        Ok(OffscreenChart {
            pixmap,
            live: self.live.clone(),
            drawn_tx,
            drawn_rx,
        })
    }
}

/// A chart drawn onto its own pixel buffer. Dropping it releases the
/// buffer and decrements the live count, on every path.
pub struct OffscreenChart {
    pixmap: Pixmap,
    live: Arc<AtomicUsize>,
    drawn_tx: watch::Sender<bool>,
    drawn_rx: watch::Receiver<bool>,
}

impl OffscreenChart {
    /// Draws the chart and raises the render-complete signal.
    pub fn draw(&mut self, rasterizer: &Rasterizer, svg: &str) -> Result<(), RasterError> {
        rasterizer.rasterize_into(svg, &mut self.pixmap)?;
        self.drawn_tx.send_replace(true);
        Ok(())
    }

    /// Waits for the render-complete signal, at most `max_wait`.
    pub async fn settle(&self, max_wait: Duration) -> bool {
        let mut rx = self.drawn_rx.clone();
        matches!(
            tokio::time::timeout(max_wait, rx.wait_for(|drawn| *drawn)).await,
            Ok(Ok(_))
        )
    }

    pub fn snapshot(&self) -> Result<Vec<u8>, RasterError> {
        encode_png(&self.pixmap)
    }

    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for OffscreenChart {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!("Destroyed off-screen chart");
    }
}
