//! Album page geometry.
//!
//! Pure layout: given labels and natural image sizes, place every card in its
//! own grid cell. Positions follow the input order (row-major); only the
//! per-card rotation is random, drawn from the caller's RNG.

use crate::album::AlbumConfig;
use crate::error::ApiError;
use rand::Rng;

/// Card height relative to its width.
pub const CARD_ASPECT: f32 = 1.25;
/// Share of a grid cell a card may occupy on either axis.
pub const CELL_FILL: f32 = 0.9;
/// Share of the card width used by the photo box.
pub const IMAGE_BOX_FILL: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        const EPS: f32 = 1e-3;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Placement of one card
///
/// `image` and `caption` are relative to the card's top-left corner; the card
/// is rotated by `rotation` radians around its own center when drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub index: usize,
    pub caption: String,
    pub column: usize,
    pub row: usize,
    pub cell: Rect,
    pub card: Rect,
    pub image: Rect,
    pub caption_area: Rect,
    pub rotation: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumLayout {
    pub width: u32,
    pub height: u32,
    pub header: Rect,
    pub cards: Vec<CardLayout>,
}

impl AlbumLayout {
    /// Cards in paint order: last grid index first, so cards higher on the
    /// page end up on top where neighbours overlap.
    pub fn draw_order(&self) -> impl Iterator<Item = &CardLayout> {
        self.cards.iter().rev()
    }
}

/// Largest card with the fixed aspect ratio inside a cell.
pub fn card_size(cell_width: f32, cell_height: f32) -> (f32, f32) {
    let width = (cell_width * CELL_FILL).min(cell_height * CELL_FILL / CARD_ASPECT);
    (width, width * CARD_ASPECT)
}

/// Fit an image of natural size `natural` into `bounds`, keeping its aspect
/// ratio: fill the width, then shrink if the height overflows.
pub fn fit_to_box(natural: (u32, u32), bounds: Rect) -> Rect {
    let (nat_w, nat_h) = (natural.0.max(1) as f32, natural.1.max(1) as f32);
    let aspect = nat_w / nat_h;
    let mut width = bounds.width;
    let mut height = width / aspect;
    if height > bounds.height {
        height = bounds.height;
        width = height * aspect;
    }
    Rect::new(
        bounds.x + (bounds.width - width) / 2.0,
        bounds.y + (bounds.height - height) / 2.0,
        width,
        height,
    )
}

/// Lay out `entries` (label, natural size) on the page.
pub fn compute_layout<R: Rng>(
    config: &AlbumConfig,
    entries: &[(&str, (u32, u32))],
    rng: &mut R,
) -> Result<AlbumLayout, ApiError> {
    config.validate().map_err(ApiError::CompositionFailed)?;
    let capacity = config.capacity();
    if entries.len() > capacity {
        return Err(ApiError::CompositionFailed(format!(
            "{} images exceed the album grid capacity of {}",
            entries.len(),
            capacity
        )));
    }

    let width = config.width as f32;
    let height = config.height as f32;
    let padding = config.padding as f32;
    let header = Rect::new(0.0, 0.0, width, config.header_height as f32);

    let grid = Rect::new(
        padding,
        header.bottom(),
        width - 2.0 * padding,
        height - header.bottom() - padding,
    );
    let cell_width = grid.width / config.columns as f32;
    let cell_height = grid.height / config.rows as f32;
    let (card_width, card_height) = card_size(cell_width, cell_height);

    let max_rotation = config.max_rotation_rad.abs();
    let mut cards = Vec::with_capacity(entries.len());
    for (index, (label, natural)) in entries.iter().enumerate() {
        let column = index % config.columns;
        let row = index / config.columns;
        let cell = Rect::new(
            grid.x + column as f32 * cell_width,
            grid.y + row as f32 * cell_height,
            cell_width,
            cell_height,
        );
        let (cx, cy) = cell.center();
        let card = Rect::new(
            cx - card_width / 2.0,
            cy - card_height / 2.0,
            card_width,
            card_height,
        );

        let box_width = card_width * IMAGE_BOX_FILL;
        let margin = (card_width - box_width) / 2.0;
        let image_box = Rect::new(margin, margin, box_width, box_width);
        let image = fit_to_box(*natural, image_box);
        let caption_top = image_box.bottom() + margin / 2.0;
        let caption_area = Rect::new(
            margin,
            caption_top,
            box_width,
            (card_height - caption_top - margin / 2.0).max(0.0),
        );

        let rotation = if max_rotation > 0.0 {
            rng.random_range(-max_rotation..=max_rotation)
        } else {
            0.0
        };

        cards.push(CardLayout {
            index,
            caption: label.to_string(),
            column,
            row,
            cell,
            card,
            image,
            caption_area,
            rotation,
        });
    }

    Ok(AlbumLayout {
        width: config.width,
        height: config.height,
        header,
        cards,
    })
}
