use super::*;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}

fn gif(width: u16, height: u16) -> Vec<u8> {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.extend_from_slice(&[0; 16]);
    bytes
}

fn jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    // APP0 segment of 16 bytes.
    bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
    bytes.extend_from_slice(&[0; 14]);
    // SOF0: length, precision, height, width.
    bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&[0; 10]);
    bytes
}

#[test]
fn reads_png_header_size() {
    assert_eq!(image_size(&png(640, 480)), Some((640, 480)));
}

#[test]
fn reads_gif_header_size() {
    assert_eq!(image_size(&gif(32, 17)), Some((32, 17)));
}

#[test]
fn reads_jpeg_frame_size_after_app_segment() {
    assert_eq!(image_size(&jpeg(1024, 768)), Some((1024, 768)));
}

#[test]
fn unknown_or_truncated_bytes_have_no_size() {
    assert_eq!(image_size(b"not an image"), None);
    assert_eq!(image_size(&png(1, 1)[..18]), None);
    assert_eq!(image_size(&[0xFF, 0xD8, 0xFF]), None);
    assert_eq!(image_size(&[]), None);
}

#[test]
fn zero_sized_header_has_no_size() {
    assert_eq!(image_size(&png(0, 10)), None);
}

#[test]
fn image_new_records_natural_size() {
    let image = Image::new(7, "map", "http://assets/7.png", png(256, 128));
    assert_eq!(image.size, Some((256, 128)));
}

#[test]
fn miss_queues_one_load_at_a_time() {
    let mut cache = AssetCache::new();
    assert!(cache.get(1).is_none());
    assert!(cache.begin_load(AssetScope::Owned));
    assert!(!cache.begin_load(AssetScope::Owned));
    assert_eq!(cache.take_pending(), Some(AssetScope::Owned));
    assert_eq!(cache.take_pending(), None);
    assert!(cache.is_loading());
}

#[test]
fn complete_populates_and_allows_later_loads() {
    let mut cache = AssetCache::new();
    assert!(cache.begin_load(AssetScope::SharedBy(4)));
    cache.complete(vec![Image::new(1, "a", "u1", Vec::new()), Image::new(2, "b", "u2", gif(3, 3))]);

    assert!(!cache.is_loading());
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get(2).and_then(|img| img.size), Some((3, 3)));
    assert!(cache.begin_load(AssetScope::SharedBy(4)));
}

#[test]
fn fail_clears_in_flight_marker() {
    let mut cache = AssetCache::new();
    assert!(cache.begin_load(AssetScope::Owned));
    cache.fail();
    assert!(!cache.is_loading());
    assert!(cache.is_empty());
    assert!(cache.begin_load(AssetScope::Owned));
}
