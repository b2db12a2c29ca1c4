use jpeg_decoder::Decoder;
use thiserror::Error;

use super::frame::PixelFormat;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("jpeg decode failed: {0}")]
    Jpeg(#[from] jpeg_decoder::Error),
    #[error("cannot decode pixel format {0:?}")]
    Unsupported(PixelFormat),
}

/// Decode a frame payload to packed RGB24.
pub fn decode_frame(data: &[u8], format: PixelFormat) -> Result<Vec<u8>, DecodeError> {
    match format {
        PixelFormat::Mjpeg => {
            let mut decoder = Decoder::new(data);
            let pixels = decoder.decode()?;
            Ok(pixels)
        }
        PixelFormat::Rgb24 => {
            // Already in RGB format
            Ok(data.to_vec())
        }
        other => Err(DecodeError::Unsupported(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb24_passes_through() {
        let data = vec![1u8, 2, 3, 4, 5, 6];
        let decoded = decode_frame(&data, PixelFormat::Rgb24).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn yuyv_is_rejected() {
        assert!(matches!(
            decode_frame(&[0u8; 8], PixelFormat::Yuyv4),
            Err(DecodeError::Unsupported(PixelFormat::Yuyv4))
        ));
    }
}
