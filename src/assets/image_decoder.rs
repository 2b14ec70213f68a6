use crate::render::gpu::TextureImage;
use image::DynamicImage;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("no image data for {0}")]
    NoData(String),
}

pub trait ImageDecoder {
    fn decode_file(&self, path: &Path) -> Result<TextureImage, DecodeError>;
    fn decode_memory(&self, bytes: &[u8]) -> Result<TextureImage, DecodeError>;
}

/// Decoder backed by the `image` crate. Keeps the source channel count for
/// 8-bit grey, grey+alpha, RGB and RGBA images; anything else becomes RGBA.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageDecoder;

impl ImageDecoder for FileImageDecoder {
    fn decode_file(&self, path: &Path) -> Result<TextureImage, DecodeError> {
        let image = image::open(path).map_err(|source| DecodeError::Image {
            path: path.display().to_string(),
            source,
        })?;
        Ok(to_texture_image(image))
    }

    fn decode_memory(&self, bytes: &[u8]) -> Result<TextureImage, DecodeError> {
        let image = image::load_from_memory(bytes).map_err(|source| DecodeError::Image {
            path: "<embedded>".to_string(),
            source,
        })?;
        Ok(to_texture_image(image))
    }
}

fn to_texture_image(image: DynamicImage) -> TextureImage {
    let (width, height) = (image.width(), image.height());
    let (channels, pixels) = match image {
        DynamicImage::ImageLuma8(buffer) => (1, buffer.into_raw()),
        DynamicImage::ImageLumaA8(buffer) => (2, buffer.into_raw()),
        DynamicImage::ImageRgb8(buffer) => (3, buffer.into_raw()),
        DynamicImage::ImageRgba8(buffer) => (4, buffer.into_raw()),
        other => (4, other.to_rgba8().into_raw()),
    };
    TextureImage {
        width,
        height,
        channels,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    #[test]
    fn decodes_png_bytes_keeping_rgb_channels() {
        let mut source = RgbImage::new(2, 1);
        source.put_pixel(0, 0, Rgb([255, 0, 0]));
        source.put_pixel(1, 0, Rgb([0, 0, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(source)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = FileImageDecoder.decode_memory(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height, decoded.channels), (2, 1, 3));
        assert_eq!(decoded.pixels, vec![255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = FileImageDecoder
            .decode_file(Path::new("no/such/texture.png"))
            .unwrap_err();
        assert!(err.to_string().contains("no/such/texture.png"));
    }

    #[test]
    fn sixteen_bit_images_become_rgba8() {
        let image = DynamicImage::new_rgb16(3, 2);
        let converted = to_texture_image(image);
        assert_eq!(converted.channels, 4);
        assert_eq!(converted.pixels.len(), 3 * 2 * 4);
    }
}
