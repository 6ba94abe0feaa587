use crate::sketch::composite::blend_pixel;
use crate::sketch::model::{BrushCap, CompositeMode, Point, Rgba, ToolState};
use image::RgbaImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub fn from_points(a: Point, b: Point, pad: f32) -> Self {
        let min_x = (a.x.min(b.x) - pad).floor() as i32;
        let max_x = (a.x.max(b.x) + pad).ceil() as i32;
        let min_y = (a.y.min(b.y) - pad).floor() as i32;
        let max_y = (a.y.max(b.y) + pad).ceil() as i32;
        Self {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1).max(1),
            height: (max_y - min_y + 1).max(1),
        }
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x: min_x,
            y: min_y,
            width: (max_x - min_x).max(1),
            height: (max_y - min_y).max(1),
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<DirtyRect> {
        let max_w = width as i32;
        let max_h = height as i32;
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = (self.x + self.width).clamp(0, max_w);
        let y1 = (self.y + self.height).clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Everything the rasterizer needs from the tool state for one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub color: Rgba,
    pub width: u32,
    pub cap: BrushCap,
    pub mode: CompositeMode,
}

impl Pen {
    pub fn from_tools(tools: &ToolState) -> Self {
        Self {
            color: tools.color(),
            width: tools.line_width(),
            cap: tools.brush_cap(),
            mode: tools.composite_mode(),
        }
    }

    fn radius(&self) -> f32 {
        (self.width.max(1) as f32 * 0.5).max(0.5)
    }
}

/// Rasterizes the segment `start..end` and returns the touched area.
///
/// Coverage is tested at pixel centers. `Flat` stops at the endpoints, `Square`
/// extends half the width past them and `Round` adds a disc at each end.
pub fn draw_segment(
    buffer: &mut RgbaImage,
    start: Point,
    end: Point,
    pen: Pen,
) -> Option<DirtyRect> {
    let radius = pen.radius();
    let pad = radius * std::f32::consts::SQRT_2 + 1.0;
    let bounds = DirtyRect::from_points(start, end, pad).clamp(buffer.width(), buffer.height())?;

    let vx = end.x - start.x;
    let vy = end.y - start.y;
    let length = (vx * vx + vy * vy).sqrt();
    let degenerate = length <= f32::EPSILON;
    if degenerate && pen.cap == BrushCap::Flat {
        return None;
    }
    let (ux, uy) = if degenerate {
        (1.0, 0.0)
    } else {
        (vx / length, vy / length)
    };

    let mut touched = false;
    for y in bounds.y..(bounds.y + bounds.height) {
        for x in bounds.x..(bounds.x + bounds.width) {
            let px = x as f32 + 0.5 - start.x;
            let py = y as f32 + 0.5 - start.y;
            let along = px * ux + py * uy;
            let across = (px * uy - py * ux).abs();
            let covered = match pen.cap {
                BrushCap::Round => {
                    let t = along.clamp(0.0, length);
                    let dx = px - ux * t;
                    let dy = py - uy * t;
                    dx * dx + dy * dy <= radius * radius
                }
                BrushCap::Square => {
                    along >= -radius && along <= length + radius && across <= radius
                }
                BrushCap::Flat => along >= 0.0 && along <= length && across <= radius,
            };
            if covered {
                write_pixel(buffer, x as u32, y as u32, pen);
                touched = true;
            }
        }
    }

    touched.then_some(bounds)
}

/// Fills the joint between two consecutive segments so flat and square
/// caps leave no notch on the outside of a turn.
pub fn draw_joint(buffer: &mut RgbaImage, at: Point, pen: Pen) -> Option<DirtyRect> {
    draw_segment(
        buffer,
        at,
        at,
        Pen {
            cap: BrushCap::Round,
            ..pen
        },
    )
}

fn write_pixel(buffer: &mut RgbaImage, x: u32, y: u32, pen: Pen) {
    let px = buffer.get_pixel_mut(x, y);
    px.0 = match pen.mode {
        CompositeMode::Paint => blend_pixel(Rgba::from_array(px.0), pen.color).to_array(),
        CompositeMode::Erase => Rgba::TRANSPARENT.to_array(),
    };
}
