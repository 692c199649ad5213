//! Album page compositor
//!
//! Lays finished portraits out on a fixed portrait page: header band on top,
//! a grid of slightly rotated "instant photo" cards below, each captioned with
//! its label. The page is encoded as JPEG.

pub mod layout;
pub mod render;
pub mod text;

pub use layout::{compute_layout, AlbumLayout, CardLayout, Rect};

use crate::error::ApiError;
use crate::types::ImageData;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use indexmap::IndexMap;
use rand::Rng;
use rusttype::{Font, Scale};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Canvas dimensions above this are refused
const MAX_CANVAS_SIDE: u32 = 16_384;

const BACKGROUND: Rgba<u8> = Rgba([243, 238, 229, 255]);
const HEADER_FILL: Rgba<u8> = Rgba([38, 44, 52, 255]);
const HEADER_TEXT: Rgba<u8> = Rgba([250, 246, 238, 255]);
const HEADER_SUBTEXT: Rgba<u8> = Rgba([196, 186, 168, 255]);
const CARD_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const PHOTO_BORDER: Rgba<u8> = Rgba([214, 210, 204, 255]);
const CAPTION_TEXT: Rgba<u8> = Rgba([44, 44, 48, 255]);
const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 110]);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_header_height")]
    pub header_height: u32,
    #[serde(default = "default_padding")]
    pub padding: u32,
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Upper bound of the per-card tilt, radians
    #[serde(default = "default_max_rotation")]
    pub max_rotation_rad: f32,
    #[serde(default = "default_title")]
    pub title: String,
    /// TTF font for header and captions. The bundled font is used when unset.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

fn default_width() -> u32 {
    2480
}

fn default_height() -> u32 {
    3508
}

fn default_header_height() -> u32 {
    420
}

fn default_padding() -> u32 {
    90
}

fn default_columns() -> usize {
    2
}

fn default_rows() -> usize {
    3
}

fn default_jpeg_quality() -> u8 {
    92
}

fn default_max_rotation() -> f32 {
    0.04
}

fn default_title() -> String {
    "Squad Album".to_string()
}

impl Default for AlbumConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            header_height: default_header_height(),
            padding: default_padding(),
            columns: default_columns(),
            rows: default_rows(),
            jpeg_quality: default_jpeg_quality(),
            max_rotation_rad: default_max_rotation(),
            title: default_title(),
            font_path: None,
        }
    }
}

impl AlbumConfig {
    /// Number of cards a page holds
    pub fn capacity(&self) -> usize {
        self.columns * self.rows
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "Album canvas {}x{} has no area",
                self.width, self.height
            ));
        }
        if self.width > MAX_CANVAS_SIDE || self.height > MAX_CANVAS_SIDE {
            return Err(format!(
                "Album canvas {}x{} exceeds {} pixels per side",
                self.width, self.height, MAX_CANVAS_SIDE
            ));
        }
        if self.columns == 0 || self.rows == 0 {
            return Err("Album grid needs at least one column and one row".to_string());
        }
        if self.padding.saturating_mul(2) >= self.width
            || self.header_height.saturating_add(self.padding) >= self.height
        {
            return Err("Album header and padding leave no room for the grid".to_string());
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            ));
        }
        if !self.max_rotation_rad.is_finite() {
            return Err("Album card rotation must be finite".to_string());
        }
        Ok(())
    }
}

/// Ordered label → decoded raster mapping
#[derive(Debug, Clone, Default)]
pub struct AlbumImageSet {
    images: IndexMap<String, DynamicImage>,
}

impl AlbumImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every image, keeping input order. The first undecodable entry
    /// fails the whole set.
    pub fn decode<'a>(
        entries: impl IntoIterator<Item = (&'a String, &'a ImageData)>,
    ) -> Result<Self, ApiError> {
        let mut set = Self::new();
        for (label, data) in entries {
            let image = data.decode().map_err(|e| match e {
                ApiError::ImageDecode(message) => {
                    ApiError::ImageDecode(format!("{}: {}", label, message))
                }
                other => other,
            })?;
            set.insert(label.clone(), image);
        }
        Ok(set)
    }

    pub fn insert(&mut self, label: impl Into<String>, image: DynamicImage) {
        self.images.insert(label.into(), image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DynamicImage)> {
        self.images.iter()
    }
}

/// Encoded album page
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub image: ImageData,
}

pub struct AlbumCompositor {
    config: AlbumConfig,
    font: Option<Font<'static>>,
}

impl AlbumCompositor {
    pub fn new(config: AlbumConfig) -> Self {
        let font = text::load_font(config.font_path.as_deref()).ok();
        Self { config, font }
    }

    pub fn config(&self) -> &AlbumConfig {
        &self.config
    }

    /// Geometry for `images` without rendering.
    pub fn layout<R: Rng>(
        &self,
        images: &AlbumImageSet,
        rng: &mut R,
    ) -> Result<AlbumLayout, ApiError> {
        let entries: Vec<(&str, (u32, u32))> = images
            .iter()
            .map(|(label, image)| (label.as_str(), (image.width(), image.height())))
            .collect();
        compute_layout(&self.config, &entries, rng)
    }

    /// Compose with fresh randomness; two calls give different tilts.
    pub fn compose(&self, images: &AlbumImageSet) -> Result<EncodedImage, ApiError> {
        self.compose_with_rng(images, &mut rand::rng())
    }

    pub fn compose_with_rng<R: Rng>(
        &self,
        images: &AlbumImageSet,
        rng: &mut R,
    ) -> Result<EncodedImage, ApiError> {
        let page = self.render_with_rng(images, rng)?;
        let (width, height) = page.dimensions();
        let bytes = encode_jpeg(page, self.config.jpeg_quality)?;
        info!(
            cards = images.len(),
            width,
            height,
            bytes = bytes.len(),
            "Album page composed"
        );
        Ok(EncodedImage {
            width,
            height,
            image: ImageData::new("image/jpeg", bytes),
        })
    }

    /// Render the page raster without encoding.
    pub fn render_with_rng<R: Rng>(
        &self,
        images: &AlbumImageSet,
        rng: &mut R,
    ) -> Result<RgbaImage, ApiError> {
        let font = self.font.as_ref().ok_or_else(|| {
            ApiError::CompositionFailed("No album font could be loaded".to_string())
        })?;
        let layout = self.layout(images, rng)?;
        let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, BACKGROUND);
        self.draw_header(&mut canvas, &layout.header, font);

        let sources: Vec<&DynamicImage> = images.iter().map(|(_, image)| image).collect();
        for card in layout.draw_order() {
            let source = sources.get(card.index).ok_or_else(|| {
                ApiError::CompositionFailed(format!("No image for card {}", card.index))
            })?;
            debug!(
                index = card.index,
                label = %card.caption,
                rotation = card.rotation,
                "Drawing album card"
            );
            let face = self.render_card(card, source, font);
            let center = card.card.center();
            let offset = card.card.width * 0.015;
            render::draw_shadow(
                &mut canvas,
                (center.0 + offset, center.1 + offset * 1.5),
                card.card.width,
                card.card.height,
                card.rotation,
                card.card.width * 0.04,
                SHADOW,
            );
            render::draw_rotated(&mut canvas, &face, center, card.rotation);
        }
        Ok(canvas)
    }

    fn draw_header(&self, canvas: &mut RgbaImage, header: &Rect, font: &Font) {
        render::fill_rect(canvas, header, HEADER_FILL);
        let center_x = header.width / 2.0;
        let max_width = header.width * 0.85;
        let title_band = header.height * 0.6;
        let title_scale = text::fit_scale(font, &self.config.title, title_band * 0.55, max_width);
        text::draw_text_centered(
            canvas,
            &self.config.title,
            font,
            title_scale,
            center_x,
            header.y + header.height * 0.1,
            title_band,
            HEADER_TEXT,
        );

        let date = chrono::Local::now().format("%B %-d, %Y").to_string();
        let date_band = header.height * 0.25;
        text::draw_text_centered(
            canvas,
            &date,
            font,
            Scale::uniform(date_band * 0.6),
            center_x,
            header.y + header.height * 0.1 + title_band,
            date_band,
            HEADER_SUBTEXT,
        );
    }

    /// Unrotated card face: white frame, fitted photo, caption.
    fn render_card(&self, card: &CardLayout, source: &DynamicImage, font: &Font) -> RgbaImage {
        let width = card.card.width.round().max(1.0) as u32;
        let height = card.card.height.round().max(1.0) as u32;
        let mut face = RgbaImage::from_pixel(width, height, CARD_FILL);

        let photo_w = card.image.width.round().max(1.0) as u32;
        let photo_h = card.image.height.round().max(1.0) as u32;
        let photo = imageops::resize(&source.to_rgba8(), photo_w, photo_h, FilterType::CatmullRom);
        render::paste(
            &mut face,
            &photo,
            card.image.x.round() as i64,
            card.image.y.round() as i64,
        );
        render::stroke_rect(
            &mut face,
            &Rect::new(
                card.image.x - 1.0,
                card.image.y - 1.0,
                card.image.width + 2.0,
                card.image.height + 2.0,
            ),
            1.0,
            PHOTO_BORDER,
        );

        let area = &card.caption_area;
        let scale = text::fit_scale(font, &card.caption, area.height * 0.45, area.width);
        text::draw_text_centered(
            &mut face,
            &card.caption,
            font,
            scale,
            area.x + area.width / 2.0,
            area.y,
            area.height,
            CAPTION_TEXT,
        );
        face
    }
}

fn encode_jpeg(page: RgbaImage, quality: u8) -> Result<Vec<u8>, ApiError> {
    let rgb = DynamicImage::ImageRgba8(page).to_rgb8();
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| ApiError::CompositionFailed(format!("JPEG encoding failed: {}", e)))?;
    Ok(bytes)
}
