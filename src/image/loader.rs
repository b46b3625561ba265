use crate::config::MAX_UPLOAD_BYTES;
use crate::utils::error::ClassifyError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat};

/// 单边最大像素数
const MAX_DIMENSION: u32 = 16384;

pub struct ImageLoader;

impl ImageLoader {
    /// 声明的媒体类型是否为图像（`image/*`）
    pub fn is_image_media_type(media_type: &str) -> bool {
        media_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    /// 校验媒体类型，非图像直接拒绝
    pub fn check_media_type(media_type: &str) -> Result<()> {
        if Self::is_image_media_type(media_type) {
            Ok(())
        } else {
            Err(ClassifyError::UnsupportedFormat(media_type.to_string()))
        }
    }

    /// 从数据URL头部提取媒体类型 (data:image/png;base64,...)
    pub fn media_type_from_data_url(data: &str) -> Option<String> {
        let header = data.strip_prefix("data:")?.split(',').next()?;
        let media_type = header.split(';').next()?.trim();
        (!media_type.is_empty()).then(|| media_type.to_string())
    }

    /// 解码base64字符串（可带数据URL前缀）为原始字节
    pub fn decode_base64(base64_data: &str) -> Result<Vec<u8>> {
        let base64_clean = if base64_data.starts_with("data:") {
            base64_data.split(',').nth(1).unwrap_or(base64_data)
        } else {
            base64_data
        };

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean.trim())?;
        Self::check_size(image_bytes.len())?;

        Ok(image_bytes)
    }

    /// 从字节加载图像
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        Self::check_size(bytes.len())?;

        if bytes.is_empty() {
            return Err(ClassifyError::InvalidInput("Empty file".to_string()));
        }

        if let Some(format) = Self::detect_format(bytes) {
            if !Self::is_supported_format(format) {
                return Err(ClassifyError::UnsupportedFormat(format!("{:?}", format)));
            }
        }

        let image = image::load_from_memory(bytes)?;
        Self::validate_dimensions(&image)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Gif
                | ImageFormat::Bmp
                | ImageFormat::Tiff
                | ImageFormat::WebP
                | ImageFormat::Ico
        )
    }

    fn check_size(len: usize) -> Result<()> {
        if len > MAX_UPLOAD_BYTES {
            return Err(ClassifyError::FileTooLarge(len, MAX_UPLOAD_BYTES));
        }
        Ok(())
    }

    /// 验证图像尺寸
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ClassifyError::InvalidInput(format!(
                "Image has no pixels: {}x{}",
                width, height
            )));
        }

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(ClassifyError::InvalidInput(format!(
                "Image too large: {}x{}, maximum {}x{}",
                width, height, MAX_DIMENSION, MAX_DIMENSION
            )));
        }

        Ok(())
    }
}
