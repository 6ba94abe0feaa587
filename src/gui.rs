use crate::settings::Settings;
use crate::sketch::export::resolve_export_dir;
use crate::sketch::model::{BrushCap, Rgba, MAX_LINE_WIDTH, MIN_LINE_WIDTH};
use crate::sketch::{SketchEvent, Sketchbook, SketchbookConfig};
use eframe::egui::{
    self, Color32, ColorImage, PointerButton, Pos2, Rect, Sense, TextureHandle, TextureOptions,
};
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::path::PathBuf;
use std::time::Duration;

const SWATCH_SIZE: f32 = 18.0;

pub struct SketchbookApp {
    book: Sketchbook,
    settings: Settings,
    texture: Option<TextureHandle>,
    texture_dirty: bool,
    hex_input: String,
    toasts: Toasts,
}

impl SketchbookApp {
    pub fn new(settings: Settings, base_dir: PathBuf) -> Self {
        let book = Sketchbook::new(SketchbookConfig::from_settings(&settings, &base_dir));
        let hex_input = book.tools().color().to_hex();
        Self {
            book,
            settings,
            texture: None,
            texture_dirty: true,
            hex_input,
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_TOP, [10.0, 10.0]),
        }
    }

    fn toast(&mut self, text: String, kind: ToastKind) {
        if !self.settings.enable_toasts {
            return;
        }
        self.toasts.add(Toast {
            text: text.into(),
            kind,
            options: ToastOptions::default()
                .duration_in_seconds(self.settings.toast_duration as f64),
        });
    }

    fn handle_events(&mut self) {
        for event in self.book.drain_events() {
            match event {
                SketchEvent::Repaint => self.texture_dirty = true,
                SketchEvent::HistoryChanged { .. } => {}
                SketchEvent::BackgroundFailed { name, error } => {
                    self.toast(format!("Could not load {name}: {error}"), ToastKind::Error);
                }
                SketchEvent::RestoreFailed { error } => {
                    self.toast(format!("Could not restore drawing: {error}"), ToastKind::Error);
                }
            }
        }
    }

    fn save_image(&mut self) {
        let saved = resolve_export_dir(self.settings.export_dir.as_deref())
            .and_then(|dir| self.book.save_png(&dir, &self.settings.export_file_name));
        match saved {
            Ok(path) => self.toast(format!("Saved {}", path.display()), ToastKind::Success),
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                self.toast(format!("Failed to save image: {e:#}"), ToastKind::Error);
            }
        }
    }

    fn sync_hex_input(&mut self) {
        self.hex_input = self.book.tools().color().to_hex();
    }

    fn toolbox(&mut self, ui: &mut egui::Ui) {
        ui.heading("Tools");
        ui.separator();

        let current = self.book.tools().color();
        let mut picked = to_color32(current);
        ui.horizontal(|ui| {
            ui.label("Color");
            if ui.color_edit_button_srgba(&mut picked).changed() {
                self.book.set_color(from_color32(picked));
                self.sync_hex_input();
            }
            let response = ui.add(egui::TextEdit::singleline(&mut self.hex_input).desired_width(80.0));
            if response.lost_focus() && !self.book.set_color_hex(&self.hex_input) {
                self.sync_hex_input();
            }
        });

        ui.horizontal_wrapped(|ui| {
            for index in 0..self.book.palette().len() {
                let color = self.book.palette()[index];
                let swatch = egui::Button::new("")
                    .fill(to_color32(color))
                    .min_size(egui::vec2(SWATCH_SIZE, SWATCH_SIZE));
                if ui.add(swatch).on_hover_text(color.to_hex()).clicked() {
                    self.book.pick_palette_color(index);
                    self.sync_hex_input();
                }
            }
        });
        ui.separator();

        let mut width = self.book.tools().line_width();
        if ui
            .add(egui::Slider::new(&mut width, MIN_LINE_WIDTH..=MAX_LINE_WIDTH).text("Width"))
            .changed()
        {
            self.book.set_line_width(width);
        }

        let mut cap = self.book.tools().brush_cap();
        egui::ComboBox::from_label("Brush")
            .selected_text(cap.label())
            .show_ui(ui, |ui| {
                for option in BrushCap::ALL {
                    ui.selectable_value(&mut cap, option, option.label());
                }
            });
        if cap != self.book.tools().brush_cap() {
            self.book.set_brush_cap(cap);
        }

        let eraser_label = if self.book.tools().is_erasing() {
            "Draw"
        } else {
            "Erase"
        };
        if ui.button(eraser_label).clicked() {
            self.book.toggle_eraser();
        }
        ui.separator();

        if ui.button("Clear Canvas").clicked() {
            self.book.clear();
        }
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.book.can_undo(), egui::Button::new("Undo"))
                .clicked()
            {
                self.book.undo();
            }
            if ui
                .add_enabled(self.book.can_redo(), egui::Button::new("Redo"))
                .clicked()
            {
                self.book.redo();
            }
        });
        if ui.button("Save Image").clicked() {
            self.save_image();
        }
    }

    fn background_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Backgrounds");
        ui.separator();
        let mut chosen = None;
        for (index, background) in self.book.backgrounds().iter().enumerate() {
            let selected = self.book.surface().background() == Some(background);
            if ui.selectable_label(selected, background.name()).clicked() {
                chosen = Some(index);
            }
        }
        if let Some(index) = chosen {
            self.book.select_background(index);
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let available = ui.available_size();
        let (response, painter) = ui.allocate_painter(available, Sense::drag());
        let rect = response.rect;
        let width = rect.width().max(0.0).floor() as u32;
        let height = rect.height().max(0.0).floor() as u32;
        if self.book.surface().size() != (width, height) {
            self.book.resize(width, height);
            self.texture_dirty = true;
        }

        let origin = rect.min;
        let to_canvas = |pos: Pos2| ((pos.x - origin.x), (pos.y - origin.y));
        if response.drag_started_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.book.pointer_down(to_canvas(pos));
            }
        }
        if response.dragged_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.book.pointer_move(to_canvas(pos));
            }
        }
        if response.drag_stopped_by(PointerButton::Primary) {
            self.book.pointer_up();
        }
        self.handle_events();

        painter.rect_filled(rect, 0.0, Color32::WHITE);
        if let Some(texture) = self.upload_texture(ui.ctx()) {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    }

    fn upload_texture(&mut self, ctx: &egui::Context) -> Option<&TextureHandle> {
        let (width, height) = self.book.surface().size();
        if width == 0 || height == 0 {
            return None;
        }
        if self.texture_dirty || self.texture.is_none() {
            let image = ColorImage::from_rgba_unmultiplied(
                [width as usize, height as usize],
                self.book.surface().pixels().as_raw(),
            );
            if let Some(texture) = self.texture.as_mut() {
                texture.set(image, TextureOptions::LINEAR);
            } else {
                self.texture = Some(ctx.load_texture("sketch", image, TextureOptions::LINEAR));
            }
            self.texture_dirty = false;
        }
        self.texture.as_ref()
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed_undo = ctx.input(|i| {
            i.key_pressed(egui::Key::Z) && i.modifiers.ctrl && !i.modifiers.shift
        });
        let pressed_redo = ctx.input(|i| {
            (i.key_pressed(egui::Key::Y) && i.modifiers.ctrl)
                || (i.key_pressed(egui::Key::Z) && i.modifiers.ctrl && i.modifiers.shift)
        });
        if pressed_undo {
            self.book.undo();
        } else if pressed_redo {
            self.book.redo();
        }
    }
}

impl eframe::App for SketchbookApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.book.pump();
        self.handle_shortcuts(ctx);
        self.handle_events();

        egui::SidePanel::left("toolbox")
            .resizable(false)
            .show(ctx, |ui| self.toolbox(ui));
        egui::SidePanel::right("backgrounds")
            .resizable(false)
            .show(ctx, |ui| self.background_sidebar(ui));
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.canvas(ui));

        self.handle_events();
        self.toasts.show(ctx);

        if self.book.is_decoding() {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}

fn to_color32(color: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn from_color32(color: Color32) -> Rgba {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Rgba::rgba(r, g, b, a)
}
