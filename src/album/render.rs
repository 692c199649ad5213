//! Raster primitives for the album page: blending, rectangles, the soft drop
//! shadow and the rotated card blit.

use crate::album::layout::Rect;
use image::{Rgba, RgbaImage};

pub fn blend_pixel(base: &mut Rgba<u8>, overlay: &Rgba<u8>) {
    let alpha = overlay[3] as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }

    let inv_alpha = 1.0 - alpha;
    for idx in 0..3 {
        base[idx] = (overlay[idx] as f32 * alpha + base[idx] as f32 * inv_alpha)
            .round()
            .clamp(0.0, 255.0) as u8;
    }
    base[3] = 255;
}

fn clamp_span(start: f32, end: f32, limit: u32) -> (u32, u32) {
    let lo = start.floor().max(0.0) as u32;
    let hi = (end.ceil().max(0.0) as u32).min(limit);
    (lo.min(limit), hi)
}

pub fn fill_rect(canvas: &mut RgbaImage, rect: &Rect, color: Rgba<u8>) {
    let (x0, x1) = clamp_span(rect.x, rect.right(), canvas.width());
    let (y0, y1) = clamp_span(rect.y, rect.bottom(), canvas.height());
    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = canvas.get_pixel_mut(x, y);
            if color[3] == 255 {
                *pixel = color;
            } else {
                blend_pixel(pixel, &color);
            }
        }
    }
}

pub fn stroke_rect(canvas: &mut RgbaImage, rect: &Rect, thickness: f32, color: Rgba<u8>) {
    if thickness <= 0.0 {
        return;
    }
    let edges = [
        Rect::new(rect.x, rect.y, rect.width, thickness),
        Rect::new(rect.x, rect.bottom() - thickness, rect.width, thickness),
        Rect::new(rect.x, rect.y + thickness, thickness, rect.height - 2.0 * thickness),
        Rect::new(
            rect.right() - thickness,
            rect.y + thickness,
            thickness,
            rect.height - 2.0 * thickness,
        ),
    ];
    for edge in edges.iter().filter(|e| e.width > 0.0 && e.height > 0.0) {
        fill_rect(canvas, edge, color);
    }
}

/// Copy `source` into `canvas` at integer offset, alpha-blended.
pub fn paste(canvas: &mut RgbaImage, source: &RgbaImage, x: i64, y: i64) {
    for (sx, sy, pixel) in source.enumerate_pixels() {
        let dx = x + sx as i64;
        let dy = y + sy as i64;
        if dx < 0 || dy < 0 || dx >= canvas.width() as i64 || dy >= canvas.height() as i64 {
            continue;
        }
        blend_pixel(canvas.get_pixel_mut(dx as u32, dy as u32), pixel);
    }
}

/// Rotation of a rectangle of size (`width`, `height`) about `center`.
#[derive(Debug, Clone, Copy)]
struct Placement {
    center: (f32, f32),
    half_width: f32,
    half_height: f32,
    cos: f32,
    sin: f32,
}

impl Placement {
    fn new(center: (f32, f32), width: f32, height: f32, angle: f32) -> Self {
        Self {
            center,
            half_width: width / 2.0,
            half_height: height / 2.0,
            cos: angle.cos(),
            sin: angle.sin(),
        }
    }

    /// Axis-aligned bounds of the rotated rectangle, widened by `margin`.
    fn bounds(&self, margin: f32) -> Rect {
        let ext_x = self.half_width * self.cos.abs() + self.half_height * self.sin.abs() + margin;
        let ext_y = self.half_width * self.sin.abs() + self.half_height * self.cos.abs() + margin;
        Rect::new(
            self.center.0 - ext_x,
            self.center.1 - ext_y,
            2.0 * ext_x,
            2.0 * ext_y,
        )
    }

    /// Page pixel center to rectangle-local coordinates (origin at center).
    fn to_local(&self, px: f32, py: f32) -> (f32, f32) {
        let dx = px - self.center.0;
        let dy = py - self.center.1;
        (dx * self.cos + dy * self.sin, -dx * self.sin + dy * self.cos)
    }

    /// Signed distance outside the rectangle; negative inside.
    fn outside_distance(&self, local: (f32, f32)) -> f32 {
        let qx = local.0.abs() - self.half_width;
        let qy = local.1.abs() - self.half_height;
        let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
        outside + qx.max(qy).min(0.0)
    }
}

/// Soft shadow of a rotated rectangle, fading out over `softness` pixels.
pub fn draw_shadow(
    canvas: &mut RgbaImage,
    center: (f32, f32),
    width: f32,
    height: f32,
    angle: f32,
    softness: f32,
    color: Rgba<u8>,
) {
    let placement = Placement::new(center, width, height, angle);
    let bounds = placement.bounds(softness);
    let (x0, x1) = clamp_span(bounds.x, bounds.right(), canvas.width());
    let (y0, y1) = clamp_span(bounds.y, bounds.bottom(), canvas.height());
    let softness = softness.max(1.0);

    for y in y0..y1 {
        for x in x0..x1 {
            let local = placement.to_local(x as f32 + 0.5, y as f32 + 0.5);
            let distance = placement.outside_distance(local);
            let falloff = (1.0 - (distance + softness / 2.0) / softness).clamp(0.0, 1.0);
            if falloff <= 0.0 {
                continue;
            }
            let alpha = (color[3] as f32 * falloff * falloff).round() as u8;
            blend_pixel(
                canvas.get_pixel_mut(x, y),
                &Rgba([color[0], color[1], color[2], alpha]),
            );
        }
    }
}

fn sample_bilinear(source: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let max_x = source.width().saturating_sub(1) as f32;
    let max_y = source.height().saturating_sub(1) as f32;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);
    let (x0, y0) = (x.floor(), y.floor());
    let (x1, y1) = ((x0 + 1.0).min(max_x), (y0 + 1.0).min(max_y));
    let (fx, fy) = (x - x0, y - y0);

    let p00 = source.get_pixel(x0 as u32, y0 as u32);
    let p10 = source.get_pixel(x1 as u32, y0 as u32);
    let p01 = source.get_pixel(x0 as u32, y1 as u32);
    let p11 = source.get_pixel(x1 as u32, y1 as u32);

    let mut out = [0u8; 4];
    for (c, slot) in out.iter_mut().enumerate() {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        *slot = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Draw `source` centered on `center`, rotated by `angle` radians.
///
/// Inverse mapping with bilinear sampling; edges get one pixel of coverage
/// antialiasing.
pub fn draw_rotated(canvas: &mut RgbaImage, source: &RgbaImage, center: (f32, f32), angle: f32) {
    if source.width() == 0 || source.height() == 0 {
        return;
    }
    let width = source.width() as f32;
    let height = source.height() as f32;
    let placement = Placement::new(center, width, height, angle);
    let bounds = placement.bounds(1.0);
    let (x0, x1) = clamp_span(bounds.x, bounds.right(), canvas.width());
    let (y0, y1) = clamp_span(bounds.y, bounds.bottom(), canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let local = placement.to_local(x as f32 + 0.5, y as f32 + 0.5);
            let coverage = (0.5 - placement.outside_distance(local)).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let mut pixel = sample_bilinear(
                source,
                local.0 + width / 2.0 - 0.5,
                local.1 + height / 2.0 - 0.5,
            );
            pixel[3] = (pixel[3] as f32 * coverage).round() as u8;
            blend_pixel(canvas.get_pixel_mut(x, y), &pixel);
        }
    }
}
