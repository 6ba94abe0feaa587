use crate::settings::Settings;
use crate::sketch::background::{BackgroundLibrary, BackgroundRef};
use crate::sketch::history::History;
use crate::sketch::loader::{DecodeJob, DecodeMode, DecodeOutput, DecodeQueue, DecodeResult, DecodeTarget};
use crate::sketch::messages::SketchEvent;
use crate::sketch::model::{BrushCap, Point, Rgba, ToolState, PRESET_COLORS};
use crate::sketch::snapshot::Snapshot;
use crate::sketch::surface::Surface;
use anyhow::{anyhow, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct SketchbookConfig {
    pub width: u32,
    pub height: u32,
    pub tools: ToolState,
    pub palette: Vec<Rgba>,
    pub backgrounds: BackgroundLibrary,
    pub decode_mode: DecodeMode,
    pub history_limit: Option<usize>,
}

impl Default for SketchbookConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            tools: ToolState::default(),
            palette: PRESET_COLORS
                .iter()
                .filter_map(|hex| Rgba::from_hex(hex))
                .collect(),
            backgrounds: BackgroundLibrary::default(),
            decode_mode: DecodeMode::Background,
            history_limit: None,
        }
    }
}

impl SketchbookConfig {
    /// Builds a session config from user settings. Relative background paths
    /// resolve against `base_dir`.
    pub fn from_settings(settings: &Settings, base_dir: &Path) -> Self {
        let color = Rgba::from_hex(&settings.default_color).unwrap_or_else(|| {
            tracing::warn!(color = %settings.default_color, "invalid default color; using black");
            Rgba::BLACK
        });
        let palette: Vec<Rgba> = settings
            .palette
            .iter()
            .filter_map(|hex| {
                let parsed = Rgba::from_hex(hex);
                if parsed.is_none() {
                    tracing::warn!(%hex, "skipping invalid palette color");
                }
                parsed
            })
            .collect();
        Self {
            tools: ToolState::new(color, settings.default_line_width, settings.default_brush_cap),
            palette,
            backgrounds: BackgroundLibrary::from_presets(&settings.backgrounds, base_dir),
            decode_mode: if settings.decode_in_background {
                DecodeMode::Background
            } else {
                DecodeMode::Inline
            },
            history_limit: settings.history_limit,
            ..Self::default()
        }
    }
}

/// One drawing session: surface, history and tool state wired together.
///
/// Every change that should reach the screen is published as a
/// [`SketchEvent`]; callers drain them after each interaction.
pub struct Sketchbook {
    surface: Surface,
    history: History,
    tools: ToolState,
    palette: Vec<Rgba>,
    backgrounds: BackgroundLibrary,
    decoder: DecodeQueue,
    /// A restore was requested and the surface may still show older pixels.
    restore_pending: bool,
    events: Vec<SketchEvent>,
}

impl Sketchbook {
    pub fn new(config: SketchbookConfig) -> Self {
        Self {
            surface: Surface::new(config.width, config.height),
            history: History::with_limit(config.history_limit),
            tools: config.tools,
            palette: config.palette,
            backgrounds: config.backgrounds,
            decoder: DecodeQueue::new(config.decode_mode),
            restore_pending: false,
            events: Vec::new(),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.history.current()
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn palette(&self) -> &[Rgba] {
        &self.palette
    }

    pub fn backgrounds(&self) -> &[BackgroundRef] {
        self.backgrounds.presets()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// True while a background or restore decode has not been applied yet.
    pub fn is_decoding(&self) -> bool {
        self.decoder.is_busy()
    }

    pub fn drain_events(&mut self) -> Vec<SketchEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- tools ----

    pub fn set_color(&mut self, color: Rgba) {
        self.tools.set_color(color);
    }

    pub fn set_color_hex(&mut self, hex: &str) -> bool {
        let applied = self.tools.set_color_hex(hex);
        if !applied {
            tracing::debug!(hex, "ignoring malformed color");
        }
        applied
    }

    pub fn pick_palette_color(&mut self, index: usize) -> bool {
        match self.palette.get(index).copied() {
            Some(color) => {
                self.tools.set_color(color);
                true
            }
            None => false,
        }
    }

    pub fn set_line_width(&mut self, width: u32) {
        self.tools.set_line_width(width);
    }

    pub fn set_brush_cap(&mut self, cap: BrushCap) {
        self.tools.set_brush_cap(cap);
    }

    pub fn set_erasing(&mut self, erasing: bool) {
        self.tools.set_erasing(erasing);
    }

    pub fn toggle_eraser(&mut self) -> bool {
        self.tools.toggle_eraser()
    }

    // ---- pointer ----

    pub fn pointer_down(&mut self, point: impl Into<Point>) {
        if !self.surface.is_drawing() {
            self.settle_restore();
        }
        self.surface.begin_stroke(point.into());
    }

    pub fn pointer_move(&mut self, point: impl Into<Point>) {
        if self
            .surface
            .extend_stroke(point.into(), &self.tools)
            .is_some()
        {
            self.publish(SketchEvent::Repaint);
        }
    }

    pub fn pointer_up(&mut self) {
        if let Some(captured) = self.surface.end_stroke() {
            self.supersede_restore();
            self.commit(captured);
        }
    }

    // ---- canvas actions ----

    pub fn clear(&mut self) {
        self.supersede_restore();
        self.decoder.invalidate(DecodeTarget::Background);
        let captured = self.surface.clear();
        self.publish(SketchEvent::Repaint);
        self.commit(captured);
    }

    pub fn select_background(&mut self, index: usize) -> bool {
        match self.backgrounds.get(index).cloned() {
            Some(background) => {
                self.set_background(background);
                true
            }
            None => false,
        }
    }

    /// The surface keeps its content until the image has decoded; a load
    /// failure leaves it untouched.
    pub fn set_background(&mut self, background: BackgroundRef) {
        if let Some(image) = self.backgrounds.cached(&background) {
            self.decoder.invalidate(DecodeTarget::Background);
            self.apply_background(background, &image);
            return;
        }
        tracing::debug!(name = background.name(), "loading background");
        self.decoder
            .submit(DecodeTarget::Background, DecodeJob::Background { background });
    }

    /// A stroke still in progress is committed first, so undo removes it.
    pub fn undo(&mut self) -> bool {
        self.pointer_up();
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.publish_history();
        self.request_restore(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.pointer_up();
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.publish_history();
        self.request_restore(snapshot);
        true
    }

    /// Tracks a new container size. Never adds a history entry.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.surface.resize(width, height) {
            return;
        }
        tracing::debug!(width, height, "surface resized");
        match self.history.current().cloned() {
            Some(snapshot) => self.request_restore(snapshot),
            None => {
                self.surface.reset_blank();
                self.publish(SketchEvent::Repaint);
            }
        }
    }

    pub fn export_png(&self) -> Result<Vec<u8>> {
        self.surface.export_png()
    }

    pub fn save_png(&self, dir: &Path, file_name: &str) -> Result<PathBuf> {
        let bytes = self.export_png()?;
        if bytes.is_empty() {
            let (width, height) = self.surface.size();
            return Err(anyhow!("nothing to export: canvas is {width}x{height}"));
        }
        crate::sketch::export::write_png(&bytes, dir, file_name)
    }

    // ---- async completion ----

    /// Applies finished decodes. Returns whether anything visible changed.
    pub fn pump(&mut self) -> bool {
        let results = self.decoder.poll();
        self.apply_results(results)
    }

    /// Blocks up to `timeout` for outstanding decodes, then applies them.
    pub fn wait_for_decodes(&mut self, timeout: Duration) -> bool {
        let results = self.decoder.wait(timeout);
        self.apply_results(results)
    }

    fn apply_results(&mut self, results: Vec<DecodeResult>) -> bool {
        let mut changed = false;
        for result in results {
            changed |= self.apply_result(result);
        }
        changed
    }

    fn apply_result(&mut self, result: DecodeResult) -> bool {
        match result.output {
            DecodeOutput::Background {
                background,
                image: Ok(image),
            } => {
                let image = Arc::new(image);
                self.backgrounds.remember(background.clone(), Arc::clone(&image));
                self.apply_background(background, &image);
                true
            }
            DecodeOutput::Background {
                background,
                image: Err(err),
            } => {
                tracing::warn!(name = background.name(), error = %err, "background failed to load");
                self.publish(SketchEvent::BackgroundFailed {
                    name: background.name().to_owned(),
                    error: format!("{err:#}"),
                });
                false
            }
            DecodeOutput::Restore {
                snapshot,
                pixels,
                background,
            } => {
                self.restore_pending = false;
                self.show_snapshot(&snapshot, pixels, background);
                true
            }
        }
    }

    /// Puts `current()` on the surface right away if a requested restore has
    /// not landed yet, so new strokes never paint over superseded pixels.
    fn settle_restore(&mut self) {
        if !self.restore_pending {
            return;
        }
        self.supersede_restore();
        let Some(snapshot) = self.history.current().cloned() else {
            self.surface.reset_blank();
            self.publish(SketchEvent::Repaint);
            return;
        };
        tracing::debug!("applying pending restore before drawing");
        let pixels = snapshot.decode();
        let background = snapshot
            .background()
            .map(|reference| match self.backgrounds.cached(reference) {
                Some(image) => Ok(image),
                None => reference.source().load().map(Arc::new),
            });
        self.show_snapshot(&snapshot, pixels, background);
    }

    fn show_snapshot(
        &mut self,
        snapshot: &Snapshot,
        pixels: Result<RgbaImage>,
        background: Option<Result<Arc<RgbaImage>>>,
    ) {
        let pixels = match pixels {
            Ok(pixels) => pixels,
            Err(err) => {
                tracing::error!(error = %err, "snapshot could not be decoded");
                self.surface.reset_blank();
                self.publish(SketchEvent::Repaint);
                self.publish(SketchEvent::RestoreFailed {
                    error: format!("{err:#}"),
                });
                return;
            }
        };
        let background_image = match (snapshot.background(), background) {
            (Some(reference), Some(Ok(image))) => {
                self.backgrounds.remember(reference.clone(), Arc::clone(&image));
                Some(image)
            }
            (Some(reference), Some(Err(err))) => {
                tracing::warn!(name = reference.name(), error = %err, "background failed to load during restore");
                None
            }
            _ => None,
        };
        self.surface
            .restore(snapshot, &pixels, background_image.as_deref());
        self.publish(SketchEvent::Repaint);
    }

    fn supersede_restore(&mut self) {
        self.restore_pending = false;
        self.decoder.invalidate(DecodeTarget::Restore);
    }

    fn apply_background(&mut self, background: BackgroundRef, image: &RgbaImage) {
        tracing::info!(name = background.name(), "background applied");
        self.supersede_restore();
        let captured = self.surface.apply_background(background, image);
        self.publish(SketchEvent::Repaint);
        self.commit(captured);
    }

    fn request_restore(&mut self, snapshot: Snapshot) {
        self.restore_pending = true;
        let cached_background = snapshot
            .background()
            .and_then(|background| self.backgrounds.cached(background));
        self.decoder.submit(
            DecodeTarget::Restore,
            DecodeJob::Restore {
                snapshot,
                cached_background,
            },
        );
    }

    fn commit(&mut self, captured: Result<Snapshot>) {
        match captured {
            Ok(snapshot) => {
                self.history.commit(snapshot);
                self.publish_history();
            }
            Err(err) => tracing::error!(error = %err, "failed to capture snapshot"),
        }
    }

    fn publish_history(&mut self) {
        self.publish(SketchEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn publish(&mut self, event: SketchEvent) {
        if event == SketchEvent::Repaint && self.events.last() == Some(&SketchEvent::Repaint) {
            return;
        }
        self.events.push(event);
    }
}
