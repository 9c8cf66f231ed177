use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pantry_vision::{
    detection::Detector,
    ingredients::IngredientExtractor,
    server::{self, AppState},
};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;

pub const BOUNDARY: &str = "pantry-vision-test-boundary";

/// Default upload limit used by test routers
pub const TEST_UPLOAD_LIMIT: usize = 1024 * 1024;

/// Build the full router around the given detector
pub fn create_test_app(detector: Arc<dyn Detector>) -> Router {
    create_test_app_with_limit(detector, TEST_UPLOAD_LIMIT)
}

pub fn create_test_app_with_limit(detector: Arc<dyn Detector>, max_upload_bytes: usize) -> Router {
    let state = AppState {
        extractor: IngredientExtractor::new(detector),
    };
    server::router(state, max_upload_bytes)
}

/// Encode a solid-colour image in the given format
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 60, 40])));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode test image");
    bytes
}

pub fn png_image(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, ImageFormat::Png)
}

/// Multipart body with a single file part
pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST /api/process-image with the bytes sent as the `file` part
pub fn upload_request(data: &[u8]) -> Request<Body> {
    upload_request_with_field("file", data)
}

pub fn upload_request_with_field(field: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/process-image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(
            field,
            "photo.jpg",
            "image/jpeg",
            data,
        )))
        .unwrap()
}

/// Read a response body as JSON
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}
