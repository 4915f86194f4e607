use std::io::Cursor;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};

use crate::assets::store::PreparedImage;
use crate::foundation::error::{PapercutError, PapercutResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> PapercutResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PapercutError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(PapercutError::decode("image has zero width or height"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Encode premultiplied RGBA8 pixels as a lossless PNG.
pub fn encode_png_premul(rgba8_premul: &[u8], width: u32, height: u32) -> PapercutResult<Vec<u8>> {
    let mut straight = rgba8_premul.to_vec();
    unpremultiply_rgba8_in_place(&mut straight);
    let img = image::RgbaImage::from_raw(width, height, straight)
        .ok_or_else(|| PapercutError::encode("png pixel buffer does not match width*height*4"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PapercutError::encode(format!("encode png: {e}")))?;
    Ok(buf)
}

/// Wrap encoded image bytes into a `data:<mime>;base64,` URL.
pub fn to_data_url(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Extract the payload bytes of a base64 `data:` URL.
pub fn from_data_url(url: &str) -> PapercutResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| PapercutError::decode("image data is not a data: url"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| PapercutError::decode("data: url has no payload"))?;
    if !meta.ends_with(";base64") {
        return Err(PapercutError::decode("only base64 data: urls are supported"));
    }
    BASE64_STANDARD
        .decode(payload.trim())
        .map_err(|e| PapercutError::decode(format!("invalid base64 payload: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
