use std::{io::Cursor, path::Path};

use image::{ImageFormat, ImageReader};
use rand::{distributions::Alphanumeric, Rng};

use crate::errors::RequestError;

pub const IMAGE_UPLOAD_DIR: &str = "images";
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Lower-cased extension if it is one of the accepted image types.
    pub fn extension(&self) -> Option<String> {
        let (_, extension) = self.file_name.rsplit_once('.')?;
        let extension = extension.to_ascii_lowercase();
        ALLOWED_IMAGE_EXTENSIONS
            .contains(&extension.as_str())
            .then_some(extension)
    }

    /// True when the bytes carry a decodable header of an accepted image
    /// format, whatever the file is called.
    pub fn is_readable_image(&self) -> bool {
        let reader = match ImageReader::new(Cursor::new(&self.bytes)).with_guessed_format() {
            Ok(reader) => reader,
            Err(_) => return false,
        };
        match reader.format() {
            Some(ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP) => {
                reader.into_dimensions().is_ok()
            }
            _ => false,
        }
    }
}

/// Writes the image under `<media_dir>/images/` with a random name and
/// returns the path relative to the media root.
pub async fn save_image(media_dir: &Path, image: &UploadedImage) -> Result<String, RequestError> {
    let extension = image
        .extension()
        .ok_or_else(|| anyhow::anyhow!("unsupported image extension"))?;
    let stem: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    let relative = format!("{}/{}.{}", IMAGE_UPLOAD_DIR, stem, extension);

    tokio::fs::create_dir_all(media_dir.join(IMAGE_UPLOAD_DIR)).await?;
    tokio::fs::write(media_dir.join(&relative), &image.bytes).await?;
    tracing::debug!(path = %relative, size = image.bytes.len(), "stored uploaded image");
    Ok(relative)
}
