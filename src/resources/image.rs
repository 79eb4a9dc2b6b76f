use crate::error::ResourceError;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

/// Identity of an image resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageSpec {
    pub source: ImageSource,
}

impl ImageSpec {
    pub fn file<P: Into<PathBuf>>(path: P) -> ImageSpec {
        ImageSpec {
            source: ImageSource::File(path.into()),
        }
    }

    pub fn bytes(bytes: Arc<[u8]>) -> ImageSpec {
        ImageSpec {
            source: ImageSource::Bytes(bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageEncoding {
    /// A baseline RGB JPEG, embedded as is with `DCTDecode`
    Jpeg(Vec<u8>),
    /// 8-bit RGB samples and, when the source has one, an 8-bit alpha channel
    Raw { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// A decoded image ready to become an image XObject
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub encoding: ImageEncoding,
}

fn is_tga(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("tga"))
        .unwrap_or(false)
}

impl ImageData {
    pub fn load(spec: &ImageSpec) -> Result<ImageData, ResourceError> {
        let (data, tga) = match &spec.source {
            ImageSource::File(path) => (
                std::fs::read(path).map_err(|e| ResourceError::Image(format!("{}: {e}", path.display())))?,
                is_tga(path),
            ),
            ImageSource::Bytes(bytes) => (bytes.to_vec(), false),
        };

        // TGA has no magic number to guess from
        let format = if tga {
            ImageFormat::Tga
        } else {
            image::guess_format(&data).map_err(|e| ResourceError::Image(e.to_string()))?
        };
        let image = image::load_from_memory_with_format(&data, format)
            .map_err(|e| ResourceError::Image(e.to_string()))?;

        match (format, image.color()) {
            (ImageFormat::Jpeg, ColorType::Rgb8) => Ok(ImageData {
                width: image.width(),
                height: image.height(),
                encoding: ImageEncoding::Jpeg(data),
            }),
            _ => Ok(ImageData::from_image(&image)),
        }
    }

    pub fn from_image(image: &DynamicImage) -> ImageData {
        let alpha = image
            .color()
            .has_alpha()
            .then(|| image.pixels().map(|p| (p.2).0[3]).collect());
        ImageData {
            width: image.width(),
            height: image.height(),
            encoding: ImageEncoding::Raw {
                rgb: image.to_rgb8().into_raw(),
                alpha,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageOutputFormat) -> Arc<[u8]> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes.into()
    }

    #[test]
    fn rgb_jpeg_passes_through() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([200, 10, 10])));
        let bytes = encode(image, ImageOutputFormat::Jpeg(90));
        let data = ImageData::load(&ImageSpec::bytes(bytes.clone())).unwrap();
        assert_eq!((data.width, data.height), (4, 3));
        assert_eq!(data.encoding, ImageEncoding::Jpeg(bytes.to_vec()));
    }

    #[test]
    fn png_alpha_becomes_a_mask() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 128])));
        let bytes = encode(image, ImageOutputFormat::Png);
        let data = ImageData::load(&ImageSpec::bytes(bytes)).unwrap();
        match data.encoding {
            ImageEncoding::Raw { rgb, alpha } => {
                assert_eq!(rgb, [1, 2, 3].repeat(4));
                assert_eq!(alpha, Some(vec![128; 4]));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn garbage_is_an_image_error() {
        let spec = ImageSpec::bytes(Arc::from(&b"definitely not an image"[..]));
        assert!(matches!(ImageData::load(&spec), Err(ResourceError::Image(_))));
        assert!(ImageData::load(&ImageSpec::file("/nonexistent.png")).is_err());
    }
}
