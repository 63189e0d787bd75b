//! Inbound payload: `{"image": "<base64>"}` on stdin, decoded into a raster image.

use std::io::{Cursor, Read};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageError, ImageReader};
use serde_json::Value;

use crate::error::ServiceError;

/// A parsed request. Only the base64 payload is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub image: String,
}

/// Read the whole input stream as one text blob.
pub fn read_input(input: &mut impl Read) -> Result<String, ServiceError> {
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .map_err(|e| ServiceError::input(format!("Failed to read input: {e}")))?;
    tracing::info!("Read {} characters from stdin", raw.len());
    Ok(raw)
}

pub fn parse_request(raw: &str) -> Result<Request, ServiceError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ServiceError::input(format!("Invalid JSON input: {e}")))?;

    let Value::Object(mut fields) = value else {
        return Err(ServiceError::input("Input must be a JSON object"));
    };

    match fields.remove("image") {
        Some(Value::String(image)) if !image.is_empty() => Ok(Request { image }),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            Err(ServiceError::input("No image data provided"))
        }
        Some(_) => Err(ServiceError::input("Field `image` must be a base64 string")),
    }
}

/// Decode standard base64, tolerating line wraps and other ASCII whitespace.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, ServiceError> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Sniff the raster format from the bytes and decode it.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ServiceError> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .decode()?;
    Ok(image)
}

/// Run the whole decoder: stdin text → validated image.
pub fn decode_payload(input: &mut impl Read) -> Result<DynamicImage, ServiceError> {
    let raw = read_input(input)?;

    tracing::debug!("Parsing JSON input");
    let request = parse_request(&raw)?;
    tracing::info!("Base64 image data length: {} characters", request.image.len());

    let bytes = decode_base64(&request.image)?;
    tracing::info!("Decoded image size: {} bytes", bytes.len());

    let image = decode_image(&bytes)?;
    tracing::info!(
        "Image opened: {}x{} pixels, mode: {:?}",
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_base64(width: u32, height: u32) -> String {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        STANDARD.encode(buf.into_inner())
    }

    #[test]
    fn parses_image_field() {
        let request = parse_request(r#"{"image": "aGVsbG8="}"#).unwrap();
        assert_eq!(request.image, "aGVsbG8=");
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse_request("{not json").unwrap_err();
        assert!(matches!(err, ServiceError::Input(_)));
        assert!(err.to_string().starts_with("Invalid JSON input"));
    }

    #[test]
    fn rejects_non_object() {
        let err = parse_request(r#"["aGVsbG8="]"#).unwrap_err();
        assert!(matches!(err, ServiceError::Input(_)));
    }

    #[test]
    fn missing_null_or_empty_image_is_input_error() {
        for raw in [r#"{}"#, r#"{"image": null}"#, r#"{"image": ""}"#] {
            let err = parse_request(raw).unwrap_err();
            assert_eq!(err.to_string(), "No image data provided", "input: {raw}");
        }
    }

    #[test]
    fn non_string_image_is_input_error() {
        let err = parse_request(r#"{"image": 42}"#).unwrap_err();
        assert!(matches!(err, ServiceError::Input(_)));
    }

    #[test]
    fn base64_ignores_line_wraps() {
        let bytes = decode_base64("aGVs\nbG8=\r\n").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn malformed_base64_is_decode_error() {
        let err = decode_base64("not*base64!").unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }

    #[test]
    fn garbage_bytes_are_image_error() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ServiceError::Image(_)));
    }

    #[test]
    fn decodes_full_payload() {
        let body = format!(r#"{{"image": "{}"}}"#, png_base64(12, 7));
        let image = decode_payload(&mut body.as_bytes()).unwrap();
        assert_eq!((image.width(), image.height()), (12, 7));
    }
}
