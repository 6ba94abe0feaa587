use crate::sketch::background::{default_presets, BackgroundPreset};
use crate::sketch::export::EXPORT_FILE_NAME;
use crate::sketch::model::{BrushCap, DEFAULT_LINE_WIDTH, PRESET_COLORS};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "sketchbook_settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Initial window size. If absent, a default size is used.
    #[serde(default)]
    pub window_size: Option<(f32, f32)>,
    #[serde(default = "default_color")]
    pub default_color: String,
    #[serde(default = "default_line_width")]
    pub default_line_width: u32,
    #[serde(default)]
    pub default_brush_cap: BrushCap,
    /// Hex colors shown as quick picks under the color editor.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
    #[serde(default = "default_presets")]
    pub backgrounds: Vec<BackgroundPreset>,
    /// Folder for saved images. Defaults to `sketchbook_exports` next to the executable.
    #[serde(default)]
    pub export_dir: Option<String>,
    #[serde(default = "default_export_file_name")]
    pub export_file_name: String,
    /// Decode backgrounds and undo snapshots on a worker thread.
    #[serde(default = "default_true")]
    pub decode_in_background: bool,
    /// Maximum number of undo states. `None` keeps everything.
    #[serde(default)]
    pub history_limit: Option<usize>,
    /// Enable toast notifications in the UI.
    #[serde(default = "default_true")]
    pub enable_toasts: bool,
    /// Duration of toast notifications in seconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration: f32,
}

fn default_color() -> String {
    "#000000".into()
}

fn default_line_width() -> u32 {
    DEFAULT_LINE_WIDTH
}

fn default_palette() -> Vec<String> {
    PRESET_COLORS.iter().map(|hex| hex.to_string()).collect()
}

fn default_export_file_name() -> String {
    EXPORT_FILE_NAME.into()
}

fn default_true() -> bool {
    true
}

fn default_toast_duration() -> f32 {
    3.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            window_size: None,
            default_color: default_color(),
            default_line_width: default_line_width(),
            default_brush_cap: BrushCap::Round,
            palette: default_palette(),
            backgrounds: default_presets(),
            export_dir: None,
            export_file_name: default_export_file_name(),
            decode_in_background: true,
            history_limit: None,
            enable_toasts: true,
            toast_duration: default_toast_duration(),
        }
    }
}

impl Settings {
    /// Reads settings from `path`. A missing or empty file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("parse settings from {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("write settings to {}", path.display()))?;
        Ok(())
    }

    pub fn window_size(&self) -> [f32; 2] {
        match self.window_size {
            Some((w, h)) if w > 0.0 && h > 0.0 => [w, h],
            _ => [1200.0, 800.0],
        }
    }
}

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}
