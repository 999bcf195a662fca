//! Texture decoding and GPU upload.

use std::path::Path;

use crate::context::{Context, TextureId};
use crate::error::Error;

/// A decoded RGB8 pixel buffer, ready for upload.
///
/// The pixel data is transient: it is dropped once a [`Texture`] has been
/// created from it.
pub struct TextureImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureImage {
    /// Decodes an image file into an RGB8 pixel buffer.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<TextureImage, Error> {
        let image = image::open(path.as_ref())?.to_rgb8();
        let (width, height) = image.dimensions();

        Ok(TextureImage {
            width,
            height,
            pixels: image.into_raw(),
        })
    }

    /// Wraps an already-decoded, tightly-packed RGB8 pixel buffer.
    pub fn from_rgb8(width: u32, height: u32, pixels: Vec<u8>) -> Result<TextureImage, Error> {
        let expected = width as usize * height as usize * 3;

        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(Error::InvalidParameter(format!(
                "RGB8 image of {}x{} pixels requires {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }

        Ok(TextureImage {
            width,
            height,
            pixels,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// A GPU-resident texture with a generated mipmap chain.
pub struct Texture {
    ctxt: Context,
    texture: Option<TextureId>,
}

impl Texture {
    /// Uploads `image` and generates its mipmaps. The texture is never mutated
    /// afterwards.
    pub fn new(ctxt: &Context, image: &TextureImage) -> Result<Texture, Error> {
        let texture = ctxt.create_texture()?;
        let mut result = Texture {
            ctxt: ctxt.clone(),
            texture: Some(texture),
        };

        result.ctxt.bind_texture(Some(texture));
        result
            .ctxt
            .texture_image_rgb8(image.width, image.height, &image.pixels);
        result.ctxt.generate_mipmaps();
        result.ctxt.bind_texture(None);

        Ok(result)
    }

    /// Binds the texture for drawing.
    pub fn bind(&self) {
        if self.texture.is_some() {
            self.ctxt.bind_texture(self.texture);
        }
    }

    /// Releases the texture. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(texture) = self.texture.take() {
            self.ctxt.delete_texture(texture);
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb8_validates_buffer_size() {
        assert!(TextureImage::from_rgb8(2, 2, vec![0; 12]).is_ok());
        assert!(TextureImage::from_rgb8(2, 2, vec![0; 11]).is_err());
        assert!(TextureImage::from_rgb8(0, 2, vec![]).is_err());
    }
}
