//! Integration tests for album page composition

use super::test_utils::{fast_config, label_color, solid_png, source_photo, task, FakeModel};
use image::GenericImageView;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use squadshot::album::{AlbumCompositor, AlbumConfig, AlbumImageSet};
use squadshot::error::ApiError;
use squadshot::types::ImageData;
use squadshot::Studio;
use std::collections::HashSet;

fn four_images() -> IndexMap<String, ImageData> {
    let mut images = IndexMap::new();
    images.insert("Ghillie Ghost".to_string(), solid_png(320, 480, [200, 30, 30]));
    images.insert("Desert Ranger".to_string(), solid_png(640, 360, [30, 160, 40]));
    images.insert("Crimson Sniper".to_string(), solid_png(256, 256, [30, 50, 200]));
    images.insert("Night Stalker".to_string(), solid_png(90, 120, [220, 200, 20]));
    images
}

fn close(actual: &[u8], expected: [u8; 3], tolerance: i32) -> bool {
    actual
        .iter()
        .zip(expected.iter())
        .all(|(a, e)| (*a as i32 - *e as i32).abs() <= tolerance)
}

#[test]
fn test_compose_four_images() {
    let compositor = AlbumCompositor::new(AlbumConfig::default());
    let inputs = four_images();
    let set = AlbumImageSet::decode(inputs.iter()).unwrap();

    let layout = compositor
        .layout(&set, &mut StdRng::seed_from_u64(42))
        .unwrap();
    let captions: Vec<&str> = layout.cards.iter().map(|c| c.caption.as_str()).collect();
    assert_eq!(
        captions,
        vec!["Ghillie Ghost", "Desert Ranger", "Crimson Sniper", "Night Stalker"]
    );
    let cells: HashSet<(usize, usize)> = layout.cards.iter().map(|c| (c.column, c.row)).collect();
    assert_eq!(cells.len(), 4);

    let page = compositor
        .compose_with_rng(&set, &mut StdRng::seed_from_u64(42))
        .unwrap();
    assert_eq!((page.width, page.height), (2480, 3508));
    assert_eq!(page.image.mime_type, "image/jpeg");

    let decoded = page.image.decode().unwrap();
    assert_eq!(decoded.dimensions(), (2480, 3508));

    // Each photo shows up at the center of its own card.
    for (card, (_, data)) in layout.cards.iter().zip(inputs.iter()) {
        let expected = data.decode().unwrap().to_rgb8().get_pixel(0, 0).0;
        let x = card.card.center().0 as u32;
        let y = (card.card.y + card.image.y + card.image.height / 2.0) as u32;
        let pixel = decoded.get_pixel(x, y);
        assert!(
            close(&pixel.0[..3], expected, 40),
            "{}: {:?} vs {:?}",
            card.caption,
            pixel,
            expected
        );
    }
}

#[test]
fn test_every_caption_is_drawn_beneath_its_photo() {
    let config = AlbumConfig {
        max_rotation_rad: 0.0,
        ..AlbumConfig::default()
    };
    let compositor = AlbumCompositor::new(config);
    let mut inputs = IndexMap::new();
    for label in ["Ghillie Ghost", "Desert Ranger", "Crimson Sniper", "Night Stalker"] {
        inputs.insert(label.to_string(), solid_png(300, 400, [235, 225, 160]));
    }
    let set = AlbumImageSet::decode(inputs.iter()).unwrap();

    let layout = compositor
        .layout(&set, &mut StdRng::seed_from_u64(3))
        .unwrap();
    let page = compositor
        .compose_with_rng(&set, &mut StdRng::seed_from_u64(3))
        .unwrap();
    let decoded = page.image.decode().unwrap().to_rgb8();

    for card in &layout.cards {
        let area = &card.caption_area;
        let left = (card.card.x + area.x) as u32;
        let top = (card.card.y + area.y) as u32;
        let right = (card.card.x + area.right()) as u32;
        let bottom = (card.card.y + area.bottom()) as u32;
        let ink = (top..bottom)
            .flat_map(|y| (left..right).map(move |x| (x, y)))
            .filter(|&(x, y)| decoded.get_pixel(x, y)[0] < 120)
            .count();
        assert!(ink > 50, "{}: only {} ink pixels in caption area", card.caption, ink);
    }
}

#[test]
fn test_empty_set_renders_header_only_page() {
    let compositor = AlbumCompositor::new(AlbumConfig::default());
    let page = compositor.compose(&AlbumImageSet::new()).unwrap();
    let decoded = page.image.decode().unwrap();
    assert_eq!(decoded.dimensions(), (2480, 3508));
}

#[test]
fn test_more_than_six_images_rejected() {
    let compositor = AlbumCompositor::new(fast_config().album);
    let mut set = AlbumImageSet::new();
    for i in 0..7 {
        set.insert(format!("Card {}", i), solid_png(4, 4, [10, 10, 10]).decode().unwrap());
    }
    let err = compositor.compose(&set).unwrap_err();
    assert!(matches!(err, ApiError::CompositionFailed(_)));
}

#[test]
fn test_undecodable_input_fails_before_composition() {
    let mut inputs = four_images();
    inputs.insert("Corrupt".to_string(), ImageData::new("image/png", b"not a png".to_vec()));
    let err = AlbumImageSet::decode(inputs.iter()).unwrap_err();
    assert!(matches!(err, ApiError::ImageDecode(_)));
}

#[test]
fn test_encoded_page_round_trips_through_data_uri() {
    let compositor = AlbumCompositor::new(fast_config().album);
    let set = AlbumImageSet::decode(four_images().iter()).unwrap();
    let page = compositor.compose(&set).unwrap();

    let uri = page.image.to_data_uri();
    assert!(uri.starts_with("data:image/jpeg;base64,"));
    let restored = ImageData::from_data_uri(&uri).unwrap();
    assert_eq!(restored, page.image);
    assert_eq!(restored.decode().unwrap().dimensions(), (600, 840));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_studio_album_requires_every_label_done() {
    let model = FakeModel::new().refusing("Broken Arrow").into_arc();
    let studio = Studio::with_client(model, &fast_config())
        .with_compositor(AlbumCompositor::new(fast_config().album));
    let labels = ["Ghillie Ghost", "Broken Arrow", "Night Stalker"];

    let tasks = labels.iter().map(|label| task(label)).collect();
    studio.run_batch(&source_photo(), tasks, Some(2)).await;

    match studio.compose_album(labels) {
        Err(ApiError::AlbumIncomplete(missing)) => {
            assert_eq!(missing, vec!["Broken Arrow".to_string()])
        }
        other => panic!("expected AlbumIncomplete, got {:?}", other.map(|p| p.width)),
    }

    let done = ["Ghillie Ghost", "Night Stalker"];
    let page = studio
        .compose_album_with_rng(done, &mut StdRng::seed_from_u64(1))
        .unwrap();
    assert_eq!((page.width, page.height), (600, 840));

    // Cards keep the requested order.
    let decoded = page.image.decode().unwrap();
    let layout = {
        let mut set = AlbumImageSet::new();
        for label in done {
            set.insert(label, solid_png(48, 64, [0, 0, 0]).decode().unwrap());
        }
        AlbumCompositor::new(fast_config().album)
            .layout(&set, &mut StdRng::seed_from_u64(1))
            .unwrap()
    };
    for card in &layout.cards {
        let x = card.card.center().0 as u32;
        let y = (card.card.y + card.image.y + card.image.height / 2.0) as u32;
        let pixel = decoded.get_pixel(x, y);
        assert!(close(&pixel.0[..3], label_color(&card.caption), 40), "{}", card.caption);
    }
}
