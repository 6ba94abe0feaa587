use crate::sketch::model::Rgba;
use image::imageops::FilterType;
use image::RgbaImage;

pub fn clear_transparent(buffer: &mut RgbaImage) {
    for px in buffer.pixels_mut() {
        px.0 = Rgba::TRANSPARENT.to_array();
    }
}

/// Resamples `source` to exactly `width` x `height`, ignoring aspect ratio.
pub fn stretch_to(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if source.dimensions() == (width, height) {
        return source.clone();
    }
    if width == 0 || height == 0 || source.width() == 0 || source.height() == 0 {
        return RgbaImage::new(width, height);
    }
    image::imageops::resize(source, width, height, FilterType::Triangle)
}

/// Draws `top` over `base` at the origin. Pixels outside `base` are clipped.
pub fn draw_over(base: &mut RgbaImage, top: &RgbaImage) {
    let width = base.width().min(top.width());
    let height = base.height().min(top.height());
    for y in 0..height {
        for x in 0..width {
            let src = Rgba::from_array(top.get_pixel(x, y).0);
            if src.a == 0 {
                continue;
            }
            let dst = Rgba::from_array(base.get_pixel(x, y).0);
            base.get_pixel_mut(x, y).0 = blend_pixel(dst, src).to_array();
        }
    }
}

/// Porter-Duff source-over on unpremultiplied RGBA.
pub fn blend_pixel(bottom: Rgba, top: Rgba) -> Rgba {
    if top.a == 255 {
        return top;
    }
    let sa = top.a as f32 / 255.0;
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Rgba::TRANSPARENT;
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Rgba {
        r: blend(top.r, bottom.r),
        g: blend(top.g, bottom.g),
        b: blend(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}

pub fn is_blank(buffer: &RgbaImage) -> bool {
    buffer.pixels().all(|px| px.0[3] == 0)
}
