//! Image to single-page PDF conversion using lopdf.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::debug;

use crate::error::{PdfError, Result};

/// Encode `image` as a one-page PDF sized to the image at `dpi`.
pub fn image_to_pdf_bytes(image: &DynamicImage, dpi: u32) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let (width_px, height_px) = rgb.dimensions();

    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(rgb).write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;

    let scale = 72.0 / dpi.max(1) as f32;
    let width = width_px as f32 * scale;
    let height = height_px as f32 * scale;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width_px as i64,
                "Height" => height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false),
    );

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width),
                    0.into(),
                    0.into(),
                    Object::Real(height),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| PdfError::Write(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "MediaBox" => vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfError::Write(e.to_string()))?;

    debug!(
        "Encoded {}x{} image as {:.0}x{:.0}pt PDF ({} bytes)",
        width_px,
        height_px,
        width,
        height,
        bytes.len()
    );

    Ok(bytes)
}

/// Decode the image at `src` and write it to `dst` as a PDF.
pub fn convert_image_to_pdf(src: &Path, dst: &Path, dpi: u32) -> Result<()> {
    let image = image::open(src)?;
    let bytes = image_to_pdf_bytes(&image, dpi)?;
    std::fs::write(dst, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_image_to_pdf_bytes_is_loadable() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 150, Rgb([10, 20, 200])));
        let bytes = image_to_pdf_bytes(&image, 300).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_convert_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = convert_image_to_pdf(
            &dir.path().join("missing.png"),
            &dir.path().join("out.pdf"),
            300,
        );
        assert!(result.is_err());
        assert!(!dir.path().join("out.pdf").exists());
    }

    #[test]
    fn test_convert_corrupt_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.jpg");
        std::fs::write(&src, b"not a jpeg").unwrap();
        assert!(convert_image_to_pdf(&src, &dir.path().join("out.pdf"), 300).is_err());
    }
}
