use std::path::{Path, PathBuf};

use super::{RenderError, ResourceId};

/// CPU-side pixel format of a texture's data.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureFormat {
    Rgb8,
    Rgba8,
}

impl TextureFormat {
    pub fn from_channels(channels: u8) -> Result<Self, RenderError> {
        match channels {
            3 => Ok(Self::Rgb8),
            4 => Ok(Self::Rgba8),
            other => Err(RenderError::UnsupportedChannels(other)),
        }
    }

    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

pub trait Texture2D {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> TextureFormat;

    /// Source file for loaded textures.
    fn path(&self) -> Option<&Path>;

    /// Replaces the whole image. `data` must be exactly
    /// `width * height * bytes_per_pixel` bytes.
    fn set_data(&self, data: &[u8]) -> Result<(), RenderError>;

    fn bind(&self, slot: u32);

    fn native_id(&self) -> ResourceId;
}

/// Decoded image, rows ordered bottom-up.
#[derive(Debug, Clone)]
pub(crate) struct DecodedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub pixels: Vec<u8>,
}

/// Decodes an image file and flips it so row 0 is the bottom row, matching
/// texture coordinates with a bottom-left origin.
pub(crate) fn decode_image(path: &Path) -> Result<DecodedImage, RenderError> {
    let image = image::open(path)
        .map_err(|source| RenderError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?
        .flipv();

    let format = TextureFormat::from_channels(image.color().channel_count())?;
    let (width, height) = (image.width(), image.height());
    let pixels = match format {
        TextureFormat::Rgb8 => image.into_rgb8().into_raw(),
        TextureFormat::Rgba8 => image.into_rgba8().into_raw(),
    };

    log::debug!(
        "decoded {} ({}x{}, {:?})",
        path.display(),
        width,
        height,
        format
    );

    Ok(DecodedImage {
        path: path.to_path_buf(),
        width,
        height,
        format,
        pixels,
    })
}

pub(crate) fn check_data_len(
    width: u32,
    height: u32,
    format: TextureFormat,
    actual: usize,
) -> Result<(), RenderError> {
    let expected = width as usize * height as usize * format.bytes_per_pixel();
    if actual != expected {
        return Err(RenderError::TextureSizeMismatch { expected, actual });
    }
    Ok(())
}

/// GPU textures are always RGBA; RGB data is widened with opaque alpha.
pub(crate) fn to_rgba(format: TextureFormat, data: &[u8]) -> std::borrow::Cow<'_, [u8]> {
    match format {
        TextureFormat::Rgba8 => std::borrow::Cow::Borrowed(data),
        TextureFormat::Rgb8 => std::borrow::Cow::Owned(
            data.chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], u8::MAX])
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_counts() {
        assert_eq!(TextureFormat::from_channels(3).unwrap(), TextureFormat::Rgb8);
        assert_eq!(TextureFormat::from_channels(4).unwrap(), TextureFormat::Rgba8);
        assert!(matches!(
            TextureFormat::from_channels(1),
            Err(RenderError::UnsupportedChannels(1))
        ));
    }

    #[test]
    fn data_len_must_match_exactly() {
        assert!(check_data_len(2, 2, TextureFormat::Rgba8, 16).is_ok());
        assert!(check_data_len(2, 2, TextureFormat::Rgb8, 12).is_ok());

        match check_data_len(2, 2, TextureFormat::Rgba8, 15) {
            Err(RenderError::TextureSizeMismatch { expected, actual }) => {
                assert_eq!((expected, actual), (16, 15));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rgb_widens_with_opaque_alpha() {
        let rgba = to_rgba(TextureFormat::Rgb8, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(&*rgba, &[1, 2, 3, 255, 4, 5, 6, 255]);

        let passthrough = to_rgba(TextureFormat::Rgba8, &[9, 9, 9, 9]);
        assert!(matches!(passthrough, std::borrow::Cow::Borrowed(_)));
    }

    #[test]
    fn decoding_flips_rows_and_reports_format() {
        let path = std::env::temp_dir().join(format!("tessera-decode-{}.png", std::process::id()));
        let mut img = image::RgbImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        img.put_pixel(0, 1, image::Rgb([0, 0, 255]));
        img.save(&path).unwrap();

        let decoded = decode_image(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((decoded.width, decoded.height), (1, 2));
        assert_eq!(decoded.format, TextureFormat::Rgb8);
        // Bottom row (blue) comes first after the flip.
        assert_eq!(decoded.pixels, vec![0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let err = decode_image(Path::new("does/not/exist.png")).unwrap_err();
        assert!(matches!(err, RenderError::ImageLoad { .. }));
    }
}
