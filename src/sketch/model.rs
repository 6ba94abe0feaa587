use serde::{Deserialize, Serialize};

pub const MIN_LINE_WIDTH: u32 = 1;
pub const MAX_LINE_WIDTH: u32 = 50;
pub const DEFAULT_LINE_WIDTH: u32 = 5;

/// Preset palette offered next to the color picker.
pub const PRESET_COLORS: [&str; 23] = [
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#FFA500", "#800080", "#008000", "#FFC0CB", "#A52A2A", "#FFD700", "#B0E0E6", "#DC143C",
    "#8A2BE2", "#00FA9A", "#FF4500", "#2E8B57", "#6A5ACD", "#D2691E", "#FF6347",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(px: [u8; 4]) -> Self {
        Self::rgba(px[0], px[1], px[2], px[3])
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`. The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() || !(digits.len() == 6 || digits.len() == 8) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushCap {
    #[default]
    Round,
    Square,
    /// Ends exactly at the segment endpoints (a canvas "butt" cap).
    #[serde(alias = "butt")]
    Flat,
}

impl BrushCap {
    pub const ALL: [BrushCap; 3] = [BrushCap::Round, BrushCap::Square, BrushCap::Flat];

    pub fn label(self) -> &'static str {
        match self {
            BrushCap::Round => "Round",
            BrushCap::Square => "Square",
            BrushCap::Flat => "Flat",
        }
    }
}

/// Surface-relative pointer position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Source-over with the tool color.
    Paint,
    /// Clears covered pixels to transparent.
    Erase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolState {
    color: Rgba,
    line_width: u32,
    brush_cap: BrushCap,
    is_erasing: bool,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            line_width: DEFAULT_LINE_WIDTH,
            brush_cap: BrushCap::Round,
            is_erasing: false,
        }
    }
}

impl ToolState {
    pub fn new(color: Rgba, line_width: u32, brush_cap: BrushCap) -> Self {
        Self {
            color,
            line_width: clamp_line_width(line_width),
            brush_cap,
            is_erasing: false,
        }
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn line_width(&self) -> u32 {
        self.line_width
    }

    pub fn brush_cap(&self) -> BrushCap {
        self.brush_cap
    }

    pub fn is_erasing(&self) -> bool {
        self.is_erasing
    }

    pub fn composite_mode(&self) -> CompositeMode {
        if self.is_erasing {
            CompositeMode::Erase
        } else {
            CompositeMode::Paint
        }
    }

    /// Picking a color always switches back to painting.
    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
        self.is_erasing = false;
    }

    /// Returns `false` and leaves the color untouched when `hex` is malformed.
    pub fn set_color_hex(&mut self, hex: &str) -> bool {
        match Rgba::from_hex(hex) {
            Some(color) => {
                self.set_color(color);
                true
            }
            None => false,
        }
    }

    pub fn set_line_width(&mut self, width: u32) {
        self.line_width = clamp_line_width(width);
    }

    pub fn set_brush_cap(&mut self, cap: BrushCap) {
        self.brush_cap = cap;
    }

    pub fn set_erasing(&mut self, erasing: bool) {
        self.is_erasing = erasing;
    }

    pub fn toggle_eraser(&mut self) -> bool {
        self.is_erasing = !self.is_erasing;
        self.is_erasing
    }
}

pub fn clamp_line_width(width: u32) -> u32 {
    width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH)
}
