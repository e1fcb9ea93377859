//! QR code rendering for the pairing payload.

use warelay_core::error::RelayError;

/// Render a pairing payload as PNG image bytes.
pub fn generate_qr_image(qr_data: &str) -> Result<Vec<u8>, RelayError> {
    use image::{ImageBuffer, Luma};
    use qrcode::{Color, EcLevel, QrCode};

    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| RelayError::Qr(format!("QR generation failed: {e}")))?;

    let module_size: u32 = 10;
    let quiet_zone: u32 = 2;
    let modules = code.width() as u32;
    let img_size = (modules + quiet_zone * 2) * module_size;

    let img = ImageBuffer::from_fn(img_size, img_size, |x, y| {
        let mx = (x / module_size).saturating_sub(quiet_zone);
        let my = (y / module_size).saturating_sub(quiet_zone);

        if x / module_size < quiet_zone
            || y / module_size < quiet_zone
            || mx >= modules
            || my >= modules
        {
            Luma([255u8]) // quiet zone
        } else {
            match code[(mx as usize, my as usize)] {
                Color::Dark => Luma([0u8]),
                Color::Light => Luma([255u8]),
            }
        }
    });

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| RelayError::Qr(format!("PNG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_qr_image_is_png() {
        let png = generate_qr_image("2@test-pairing-payload").unwrap();
        // PNG magic bytes.
        assert_eq!(&png[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn test_generate_qr_image_nonempty_for_short_input() {
        let png = generate_qr_image("x").unwrap();
        assert!(!png.is_empty());
    }
}
