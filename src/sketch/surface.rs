use crate::sketch::background::BackgroundRef;
use crate::sketch::composite::{clear_transparent, draw_over, stretch_to};
use crate::sketch::model::{Point, ToolState};
use crate::sketch::raster::{draw_joint, draw_segment, DirtyRect, Pen};
use crate::sketch::snapshot::{encode_png, Snapshot};
use anyhow::Result;
use image::RgbaImage;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveStroke {
    last: Point,
    segments: u32,
}

/// The live pixel buffer and the stroke being drawn into it.
#[derive(Debug, Clone)]
pub struct Surface {
    buffer: RgbaImage,
    background: Option<BackgroundRef>,
    stroke: Option<ActiveStroke>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: RgbaImage::new(width, height),
            background: None,
            stroke: None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn background(&self) -> Option<&BackgroundRef> {
        self.background.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn begin_stroke(&mut self, point: Point) -> bool {
        if self.stroke.is_some() {
            tracing::debug!("begin_stroke ignored: stroke already in progress");
            return false;
        }
        self.stroke = Some(ActiveStroke {
            last: point,
            segments: 0,
        });
        true
    }

    pub fn extend_stroke(&mut self, point: Point, tools: &ToolState) -> Option<DirtyRect> {
        let stroke = self.stroke.as_mut()?;
        let pen = Pen::from_tools(tools);
        let joint = if stroke.segments > 0 {
            draw_joint(&mut self.buffer, stroke.last, pen)
        } else {
            None
        };
        let segment = draw_segment(&mut self.buffer, stroke.last, point, pen);
        stroke.last = point;
        stroke.segments += 1;
        match (joint, segment) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }

    /// Finishes the stroke and captures the snapshot to commit.
    pub fn end_stroke(&mut self) -> Option<Result<Snapshot>> {
        self.stroke.take()?;
        Some(self.capture())
    }

    /// Wipes the buffer and drops the background selection.
    pub fn clear(&mut self) -> Result<Snapshot> {
        self.stroke = None;
        self.background = None;
        clear_transparent(&mut self.buffer);
        self.capture()
    }

    /// Starts a fresh layer: whatever was drawn is replaced by `image`
    /// stretched to the surface.
    pub fn apply_background(
        &mut self,
        background: BackgroundRef,
        image: &RgbaImage,
    ) -> Result<Snapshot> {
        self.stroke = None;
        self.background = Some(background);
        self.buffer = stretch_to(image, self.buffer.width(), self.buffer.height());
        self.capture()
    }

    /// Redraws `snapshot` over its background. Applying the same inputs twice
    /// yields identical pixels.
    pub fn restore(
        &mut self,
        snapshot: &Snapshot,
        pixels: &RgbaImage,
        background: Option<&RgbaImage>,
    ) {
        self.stroke = None;
        let (width, height) = self.buffer.dimensions();
        match background {
            Some(image) => self.buffer = stretch_to(image, width, height),
            None => clear_transparent(&mut self.buffer),
        }
        draw_over(&mut self.buffer, pixels);
        self.background = snapshot.background().cloned();
    }

    /// Decodes and restores in one step.
    pub fn restore_snapshot(
        &mut self,
        snapshot: &Snapshot,
        background: Option<&RgbaImage>,
    ) -> Result<()> {
        let pixels = snapshot.decode()?;
        self.restore(snapshot, &pixels, background);
        Ok(())
    }

    /// Reallocates a blank buffer. Returns `false` when the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.buffer.dimensions() == (width, height) {
            return false;
        }
        self.buffer = RgbaImage::new(width, height);
        self.stroke = None;
        true
    }

    pub fn reset_blank(&mut self) {
        self.stroke = None;
        self.background = None;
        clear_transparent(&mut self.buffer);
    }

    pub fn export_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.buffer)
    }

    fn capture(&self) -> Result<Snapshot> {
        Snapshot::capture(&self.buffer, self.background.clone())
    }
}
