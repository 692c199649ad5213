//! Caption and header text via `rusttype`.

use crate::album::render::blend_pixel;
use crate::error::ApiError;
use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use std::path::Path;
use tracing::{debug, error, warn};

/// Bundled caption font, used when no font is configured or it fails to load
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

fn read_font(path: &Path) -> Option<Font<'static>> {
    let bytes = std::fs::read(path).ok()?;
    let font = Font::try_from_vec(bytes);
    if font.is_none() {
        warn!(path = %path.display(), "Font file could not be parsed");
    }
    font
}

/// Load the configured font, falling back to the bundled one.
pub fn load_font(configured: Option<&Path>) -> Result<Font<'static>, ApiError> {
    if let Some(path) = configured {
        match read_font(path) {
            Some(font) => {
                debug!(path = %path.display(), "Loaded album font");
                return Ok(font);
            }
            None => warn!(
                path = %path.display(),
                "Configured album font unavailable, using bundled font"
            ),
        }
    }

    Font::try_from_bytes(BUNDLED_FONT).ok_or_else(|| {
        error!("Bundled album font could not be parsed");
        ApiError::CompositionFailed("No album font could be loaded".to_string())
    })
}

/// Horizontal advance of `text` at `scale`, in pixels.
pub fn text_width(font: &Font, text: &str, scale: Scale) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Largest scale at or below `max_px` that fits `text` into `max_width`.
pub fn fit_scale(font: &Font, text: &str, max_px: f32, max_width: f32) -> Scale {
    let scale = Scale::uniform(max_px);
    let width = text_width(font, text, scale);
    if width <= max_width || width <= 0.0 {
        scale
    } else {
        Scale::uniform((max_px * max_width / width).max(1.0))
    }
}

/// Draw `text` with its top-left corner at (`x`, `y`).
pub fn draw_text(
    canvas: &mut RgbaImage,
    text: &str,
    font: &Font,
    scale: Scale,
    x: f32,
    y: f32,
    color: Rgba<u8>,
) {
    let v_metrics = font.v_metrics(scale);
    for glyph in font.layout(text, scale, point(x, y + v_metrics.ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 || px >= canvas.width() as i32 || py >= canvas.height() as i32 {
                    return;
                }
                let alpha = (coverage * color[3] as f32).round() as u8;
                let overlay = Rgba([color[0], color[1], color[2], alpha]);
                blend_pixel(canvas.get_pixel_mut(px as u32, py as u32), &overlay);
            });
        }
    }
}

/// Draw `text` horizontally centered on `center_x`, vertically centered in
/// the band starting at `top` with height `band`.
pub fn draw_text_centered(
    canvas: &mut RgbaImage,
    text: &str,
    font: &Font,
    scale: Scale,
    center_x: f32,
    top: f32,
    band: f32,
    color: Rgba<u8>,
) {
    let width = text_width(font, text, scale);
    let v_metrics = font.v_metrics(scale);
    let height = v_metrics.ascent - v_metrics.descent;
    draw_text(
        canvas,
        text,
        font,
        scale,
        center_x - width / 2.0,
        top + (band - height) / 2.0,
        color,
    );
}
