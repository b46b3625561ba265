use crate::classify::InputTensor;
use crate::config::INPUT_SIZE;
use crate::image::ImageTransforms;
use image::DynamicImage;
use ndarray::Axis;

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 分类模型预处理流水线
    ///
    /// 最近邻缩放到 224×224 → 浮点化 → `x / 127.5 - 1` → 增加 batch 维，
    /// 输出形状恒为 1×224×224×3。中间数组在函数返回前全部释放。
    pub fn preprocess(image: &DynamicImage) -> InputTensor {
        let rgb = image.to_rgb8();
        let resized = ImageTransforms::resize_nearest(&rgb, INPUT_SIZE, INPUT_SIZE);
        drop(rgb);

        ImageTransforms::normalize_symmetric(resized).insert_axis(Axis(0))
    }
}
