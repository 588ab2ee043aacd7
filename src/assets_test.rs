use std::sync::Mutex;

use super::*;

// =============================================================================
// parse_listing
// =============================================================================

#[test]
fn parse_listing_reads_objs() {
    let body = r#"{"status":true,"objs":[{"id":3,"name":"map","url":"http://x/3.png"},{"id":4,"url":"http://x/4.png"}]}"#;
    let listing = parse_listing(body).unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0], AssetInfo { id: 3, name: "map".into(), url: "http://x/3.png".into() });
    assert_eq!(listing[1].name, "");
}

#[test]
fn parse_listing_without_objs_is_empty() {
    assert!(parse_listing(r#"{"status":true}"#).unwrap().is_empty());
}

#[test]
fn parse_listing_refusal_carries_msg() {
    let err = parse_listing(r#"{"status":false,"msg":"user not found"}"#).unwrap_err();
    assert!(matches!(err, AssetError::Status { msg, .. } if msg == "user not found"));
}

#[test]
fn parse_listing_rejects_garbage() {
    assert!(matches!(parse_listing("<html>"), Err(AssetError::Parse(_))));
    assert!(matches!(parse_listing(r#"{"objs":[]}"#), Err(AssetError::Parse(_))));
}

// =============================================================================
// load_images
// =============================================================================

#[derive(Default)]
struct FakeApi {
    calls: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl AssetApi for FakeApi {
    async fn fetch_owned_assets(&self, token: &str) -> Result<Vec<AssetInfo>, AssetError> {
        self.calls.lock().unwrap().push(format!("owned:{token}"));
        Ok(vec![
            AssetInfo { id: 1, name: "a".into(), url: "ok".into() },
            AssetInfo { id: 2, name: "b".into(), url: "broken".into() },
        ])
    }

    async fn fetch_assets_of(&self, token: &str, owner_id: i64) -> Result<Vec<AssetInfo>, AssetError> {
        self.calls.lock().unwrap().push(format!("of:{owner_id}:{token}"));
        Err(AssetError::Status { status: 403, msg: "forbidden".into() })
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        if url == "ok" {
            let mut gif = b"GIF89a".to_vec();
            gif.extend_from_slice(&[10, 0, 20, 0]);
            gif.extend_from_slice(&[0; 16]);
            Ok(gif)
        } else {
            Err(AssetError::Request("connection reset".into()))
        }
    }
}

#[tokio::test]
async fn owned_scope_downloads_every_image() {
    let api = FakeApi::default();
    let images = load_images(&api, "tok", AssetScope::Owned).await.unwrap();
    assert_eq!(*api.calls.lock().unwrap(), vec!["owned:tok"]);
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].size, Some((10, 20)));
    // Failed download keeps the entry without pixels.
    assert_eq!(images[1].id, 2);
    assert!(images[1].bytes.is_empty());
    assert_eq!(images[1].size, None);
}

#[tokio::test]
async fn shared_scope_propagates_listing_error() {
    let api = FakeApi::default();
    let err = load_images(&api, "tok", AssetScope::SharedBy(9)).await.unwrap_err();
    assert!(matches!(err, AssetError::Status { status: 403, .. }));
    assert_eq!(*api.calls.lock().unwrap(), vec!["of:9:tok"]);
}
