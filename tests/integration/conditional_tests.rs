//! Conditional GET and decorator composition tests.
//!
//! Tests verify:
//! - ETag and Last-Modified validators on image responses
//! - 304 short-circuits skip the image provider
//! - The pre-call hook sees the request before the provider does
//! - Error statuses win regardless of decorator order
//! - Validators computed by the filesystem provider

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{TimeZone, Utc};
use http::HeaderMap;
use http_body_util::BodyExt;
use tower::ServiceExt;

use iiif_axum::decorators::{endpoint_fn, ApiHook, Endpoint, ErrorHandler, HttpCache};
use iiif_axum::{
    create_router, FsImageProvider, HandlerError, IiifExtension, ImageError, ImageRequest,
    RouterConfig,
};

use super::test_utils::{
    etag_extension, get, get_with_header, image_uri, router_with, MockImageProvider,
};

// =============================================================================
// ETag
// =============================================================================

#[tokio::test]
async fn test_no_callbacks_adds_no_validators() {
    let provider = MockImageProvider::new().with_image("cat.png", 640, 480);
    let router = router_with(provider, IiifExtension::new());

    let response = router
        .oneshot(get(&image_uri("cat.png", "default.png")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("etag").is_none());
    assert!(response.headers().get("last-modified").is_none());
}

#[tokio::test]
async fn test_matching_etag_returns_not_modified() {
    let provider = MockImageProvider::new().with_image("cat.png", 640, 480);
    let renders = provider.render_counter();
    let router = router_with(provider, etag_extension());

    let response = router
        .oneshot(get_with_header(
            &image_uri("cat.png", "default.png"),
            "if-none-match",
            "\"cat.png-v1\"",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers().get("etag").unwrap(), "\"cat.png-v1\"");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
    assert_eq!(renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stale_etag_renders_with_validator() {
    let provider = MockImageProvider::new().with_image("cat.png", 640, 480);
    let renders = provider.render_counter();
    let router = router_with(provider, etag_extension());

    let response = router
        .oneshot(get_with_header(
            &image_uri("cat.png", "default.png"),
            "if-none-match",
            "\"xyz999\"",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("etag").unwrap(), "\"cat.png-v1\"");
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_weak_and_wildcard_etags_match() {
    let provider = MockImageProvider::new().with_image("cat.png", 640, 480);
    let renders = provider.render_counter();
    let router = router_with(provider, etag_extension());
    let uri = image_uri("cat.png", "default.png");

    for header in ["W/\"cat.png-v1\"", "\"other\", \"cat.png-v1\"", "*"] {
        let response = router
            .clone()
            .oneshot(get_with_header(&uri, "if-none-match", header))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED, "{}", header);
    }
    assert_eq!(renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_error_response_has_no_validators() {
    let provider = MockImageProvider::new()
        .with_failure("cat.png", ImageError::Crop("bad region".into()));
    let router = router_with(provider, etag_extension());

    let response = router
        .oneshot(get_with_header(
            &image_uri("cat.png", "default.png"),
            "if-none-match",
            "\"xyz999\"",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get("etag").is_none());
}

// =============================================================================
// Last-Modified
// =============================================================================

fn last_modified_extension() -> IiifExtension<ImageRequest> {
    IiifExtension::new().with_last_modified_callback(|_: &ImageRequest| {
        Ok(Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()))
    })
}

#[tokio::test]
async fn test_if_modified_since() {
    let provider = MockImageProvider::new().with_image("cat.png", 640, 480);
    let renders = provider.render_counter();
    let router = router_with(provider, last_modified_extension());
    let uri = image_uri("cat.png", "default.png");

    let cases = [
        ("Wed, 01 May 2024 12:00:00 GMT", StatusCode::NOT_MODIFIED),
        ("Thu, 02 May 2024 08:00:00 GMT", StatusCode::NOT_MODIFIED),
        ("Tue, 30 Apr 2024 12:00:00 GMT", StatusCode::OK),
        ("not a date", StatusCode::OK),
    ];
    for (since, expected) in cases {
        let response = router
            .clone()
            .oneshot(get_with_header(&uri, "if-modified-since", since))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "{}", since);
        assert_eq!(
            response.headers().get("last-modified").unwrap(),
            "Wed, 01 May 2024 12:00:00 GMT"
        );
    }
    // Only the first stale request renders; the second is a cache hit
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Pre-call Hook
// =============================================================================

#[tokio::test]
async fn test_hook_sees_request_once() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let extension = IiifExtension::new().with_api_decorator_callback(move |request: &ImageRequest| {
        recorder.lock().unwrap().push(request.clone());
        Ok(())
    });
    let provider = MockImageProvider::new().with_image("cat.png", 640, 480);
    let router = router_with(provider, extension);

    let response = router
        .oneshot(get("/api/multimedia/image/v2/cat.png/0,0,10,10/50,/90/gray.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0],
        ImageRequest {
            version: "v2".into(),
            identifier: "cat.png".into(),
            region: "0,0,10,10".into(),
            size: "50,".into(),
            rotation: "90".into(),
            quality: "gray".into(),
            format: "png".into(),
        }
    );
}

#[tokio::test]
async fn test_hook_not_called_on_not_modified() {
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    let extension = etag_extension().with_api_decorator_callback(move |_: &ImageRequest| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });
    let provider = MockImageProvider::new().with_image("cat.png", 640, 480);
    let router = router_with(provider, extension);

    let response = router
        .oneshot(get_with_header(
            &image_uri("cat.png", "default.png"),
            "if-none-match",
            "\"cat.png-v1\"",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(*calls.lock().unwrap(), 0);
}

// =============================================================================
// Composition Order
// =============================================================================

fn crop_failure() -> impl Endpoint<String> {
    endpoint_fn(|_: String, _: HeaderMap| async {
        Err::<Response, _>(HandlerError::from(ImageError::Crop("bad region".into())))
    })
}

#[tokio::test]
async fn test_error_status_independent_of_order() {
    let extension = Arc::new(
        IiifExtension::<String>::new()
            .with_etag_callback(|_: &String| Ok(Some("abc123".to_string())))
            .with_api_decorator_callback(|_: &String| Ok(())),
    );
    let mut stale = HeaderMap::new();
    stale.insert("if-none-match", "\"xyz999\"".parse().unwrap());
    let args = "cat.png".to_string();

    let chains: Vec<Box<dyn Endpoint<String>>> = vec![
        Box::new(HttpCache::new(
            ApiHook::new(ErrorHandler::new(crop_failure()), extension.clone()),
            extension.clone(),
        )),
        Box::new(ErrorHandler::new(HttpCache::new(
            ApiHook::new(crop_failure(), extension.clone()),
            extension.clone(),
        ))),
        Box::new(ApiHook::new(
            HttpCache::new(ErrorHandler::new(crop_failure()), extension.clone()),
            extension.clone(),
        )),
    ];

    for chain in chains {
        let response = chain.call(&args, &stale).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get("etag").is_none());
    }
}

#[tokio::test]
async fn test_success_through_every_decorator() {
    let extension = Arc::new(
        IiifExtension::<String>::new().with_etag_callback(|_: &String| Ok(Some("abc123".into()))),
    );
    let handler = endpoint_fn(|_: String, _: HeaderMap| async {
        Ok::<_, HandlerError>("ok".into_response())
    });
    let chain = ErrorHandler::new(ApiHook::new(
        HttpCache::new(handler, extension.clone()),
        extension,
    ));

    let response = chain
        .call(&"cat.png".to_string(), &HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("etag").unwrap(), "\"abc123\"");
}

// =============================================================================
// Filesystem Validators
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_filesystem_validators_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbImage::new(4, 3)
        .save(dir.path().join("cat.png"))
        .unwrap();

    let provider = FsImageProvider::new(dir.path());
    let extension = provider.register_validators(IiifExtension::new());
    let router = create_router(provider, extension, RouterConfig::new().with_tracing(false));
    let uri = image_uri("cat.png", "default.png");

    let first = router.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get("content-type").unwrap(), "image/png");
    let etag = first.headers().get("etag").unwrap().to_str().unwrap().to_string();
    assert!(first.headers().get("last-modified").is_some());

    let second = router
        .oneshot(get_with_header(&uri, "if-none-match", &etag))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
}
