// src/transform/images.rs

//! Lossless-ish image optimization.
//!
//! JPEG and PNG are decoded and re-encoded; SVG gets comment and whitespace
//! stripping. The smaller of original and re-encoded bytes is written, so an
//! optimized image is never larger than its source. Everything else, and any
//! image that fails to decode, is copied through unchanged.

use std::io::Cursor;
use std::sync::LazyLock;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use regex::Regex;
use tracing::{debug, warn};

use crate::config::ImagesSection;
use crate::source::SourceSet;
use crate::transform::{TaskReport, TransformContext, TransformError, Transformer};

static SVG_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static pattern"));
static SVG_BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("static pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    Jpeg,
    Png,
    Svg,
    Other,
}

fn kind_of(path: &std::path::Path) -> ImageKind {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => ImageKind::Jpeg,
        Some("png") => ImageKind::Png,
        Some("svg") => ImageKind::Svg,
        _ => ImageKind::Other,
    }
}

#[derive(Debug, Clone)]
pub struct ImageOptimizer {
    pub jpeg_quality: u8,
}

impl ImageOptimizer {
    pub fn from_config(cfg: &ImagesSection) -> Self {
        Self {
            jpeg_quality: cfg.jpeg_quality,
        }
    }

    fn reencode_jpeg(&self, bytes: &[u8]) -> Result<Vec<u8>, String> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .map_err(|e| e.to_string())?;
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
        rgb.write_with_encoder(encoder).map_err(|e| e.to_string())?;
        Ok(out)
    }

    fn reencode_png(&self, bytes: &[u8]) -> Result<Vec<u8>, String> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| e.to_string())?;

        let mut out = Cursor::new(Vec::new());
        let encoder =
            PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
        img.write_with_encoder(encoder).map_err(|e| e.to_string())?;
        Ok(out.into_inner())
    }
}

/// Drop comments and whitespace between tags. Attributes, `viewBox` included,
/// are left alone.
pub fn clean_svg(text: &str) -> String {
    let without_comments = SVG_COMMENT.replace_all(text, "");
    SVG_BETWEEN_TAGS
        .replace_all(&without_comments, "><")
        .trim()
        .to_string()
}

impl Transformer for ImageOptimizer {
    fn label(&self) -> &'static str {
        "image-optimizer"
    }

    fn transform(
        &self,
        ctx: &TransformContext,
        sources: &SourceSet,
    ) -> Result<TaskReport, TransformError> {
        let mut report = TaskReport::default();

        for source in sources.iter() {
            let original = ctx.read(&source.path)?;
            let out_path = ctx.dest.join(&source.relative);

            let optimized = match kind_of(&source.path) {
                ImageKind::Jpeg => self.reencode_jpeg(&original).map(Some),
                ImageKind::Png => self.reencode_png(&original).map(Some),
                ImageKind::Svg => match std::str::from_utf8(&original) {
                    Ok(text) => Ok(Some(clean_svg(text).into_bytes())),
                    Err(e) => Err(e.to_string()),
                },
                ImageKind::Other => Ok(None),
            };

            let bytes = match optimized {
                Ok(Some(candidate)) if candidate.len() < original.len() => {
                    debug!(
                        path = ?source.path,
                        before = original.len(),
                        after = candidate.len(),
                        "optimized image"
                    );
                    Some(candidate)
                }
                Ok(_) => None,
                Err(message) => {
                    warn!(
                        task = %ctx.task,
                        path = %source.path.display(),
                        error = %message,
                        "image could not be decoded; copying unchanged"
                    );
                    None
                }
            };

            match bytes {
                Some(bytes) => {
                    ctx.write(&out_path, &bytes)?;
                    report.written += 1;
                }
                None => {
                    ctx.write(&out_path, &original)?;
                    report.passed_through += 1;
                }
            }
        }

        Ok(report)
    }
}
