use image::RgbImage;
use ndarray::Array3;

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 最近邻缩放，输出 HWC 浮点数组（原始 0-255 取值）
    ///
    /// 采样坐标为 `floor(dst * src_len / dst_len)`，不做角点对齐和半像素偏移。
    pub fn resize_nearest(image: &RgbImage, target_width: usize, target_height: usize) -> Array3<f32> {
        let (orig_w, orig_h) = (image.width() as usize, image.height() as usize);

        if orig_w == 0 || orig_h == 0 {
            return Array3::<f32>::zeros((target_height, target_width, 3));
        }

        let src_rows: Vec<u32> = (0..target_height)
            .map(|h| Self::nearest_index(h, orig_h, target_height))
            .collect();
        let src_cols: Vec<u32> = (0..target_width)
            .map(|w| Self::nearest_index(w, orig_w, target_width))
            .collect();

        Array3::from_shape_fn((target_height, target_width, 3), |(h, w, c)| {
            image.get_pixel(src_cols[w], src_rows[h])[c] as f32
        })
    }

    fn nearest_index(dst: usize, src_len: usize, dst_len: usize) -> u32 {
        let src = (dst as f64 * src_len as f64 / dst_len as f64).floor() as usize;
        src.min(src_len - 1) as u32
    }

    /// [0, 255] 线性映射到 [-1, 1]: `x / 127.5 - 1`
    pub fn normalize_symmetric(image: Array3<f32>) -> Array3<f32> {
        image.mapv_into(|v| (v / 127.5 - 1.0).clamp(-1.0, 1.0))
    }
}
