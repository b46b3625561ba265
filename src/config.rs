use crate::utils::error::ClassifyError;
use crate::Result;
use std::fmt;
use std::path::PathBuf;

/// 模型输入边长（像素）
pub const INPUT_SIZE: usize = 224;

/// 返回的预测数量
pub const TOP_K: usize = 5;

/// 上传文件大小上限
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// ImageNet 类别名列表（每行一个）
pub const DEFAULT_LABELS_URL: &str =
    "https://raw.githubusercontent.com/pytorch/hub/master/imagenet_classes.txt";

/// 预训练 MobileNetV2（ONNX，NHWC 输入，像素范围 [-1, 1]）
///
/// 由 `tf.keras.applications.MobileNetV2(weights="imagenet")` 经 tf2onnx 导出。
pub const DEFAULT_MODEL_LOCATION: &str = "models/mobilenet_v2.onnx";

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 类别名列表位置
    pub labels: ResourceLocation,

    /// 模型文件位置
    pub model: ResourceLocation,

    /// 模型期望的输入布局
    pub layout: TensorLayout,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

/// 远程 URL 或本地文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    Remote(String),
    Local(PathBuf),
}

impl ResourceLocation {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ClassifyError::Config("empty resource location".to_string()));
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            Ok(ResourceLocation::Remote(raw.to_string()))
        } else {
            Ok(ResourceLocation::Local(PathBuf::from(raw)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ResourceLocation::Remote(_))
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLocation::Remote(url) => write!(f, "{}", url),
            ResourceLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// 输入张量布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// 1×H×W×3
    #[default]
    Nhwc,
    /// 1×3×H×W
    Nchw,
}

impl Config {
    pub fn new(
        bind_addr: String,
        labels: &str,
        model: &str,
        layout: TensorLayout,
        threads: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();

        let onnx_config = OnnxConfig {
            intra_threads: threads.unwrap_or((cpu_cores * 3 / 4).max(1)), // 默认75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: MAX_UPLOAD_BYTES + 1024 * 1024, // 留出multipart头部余量
        };

        Ok(Self {
            bind_addr,
            labels: ResourceLocation::parse(labels)?,
            model: ResourceLocation::parse(model)?,
            layout,
            onnx_config,
            server_config,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5006".to_string(),
            labels: ResourceLocation::Remote(DEFAULT_LABELS_URL.to_string()),
            model: ResourceLocation::Local(PathBuf::from(DEFAULT_MODEL_LOCATION)),
            layout: TensorLayout::default(),
            onnx_config: OnnxConfig {
                intra_threads: 1,
                optimization_level: 3,
            },
            server_config: ServerConfig {
                request_timeout: 60,
                max_request_size: MAX_UPLOAD_BYTES + 1024 * 1024,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_split_on_scheme() {
        assert_eq!(
            ResourceLocation::parse(DEFAULT_LABELS_URL).unwrap(),
            ResourceLocation::Remote(DEFAULT_LABELS_URL.to_string())
        );
        assert_eq!(
            ResourceLocation::parse(" models/mobilenet.onnx ").unwrap(),
            ResourceLocation::Local(PathBuf::from("models/mobilenet.onnx"))
        );
        assert!(ResourceLocation::parse("   ").is_err());
    }

    #[test]
    fn explicit_thread_count_wins() {
        let config = Config::new(
            "127.0.0.1:0".to_string(),
            "labels.txt",
            "https://example.com/mobilenet.onnx",
            TensorLayout::Nchw,
            Some(2),
            true,
        )
        .unwrap();

        assert_eq!(config.onnx_config.intra_threads, 2);
        assert_eq!(config.server_config.request_timeout, 300);
        assert_eq!(config.layout, TensorLayout::Nchw);
        assert!(!config.labels.is_remote());
        assert!(config.model.is_remote());
    }

    #[test]
    fn defaults_expect_channels_last_input() {
        let config = Config::default();

        assert_eq!(config.layout, TensorLayout::Nhwc);
        assert_eq!(
            config.model,
            ResourceLocation::Local(PathBuf::from(DEFAULT_MODEL_LOCATION))
        );
    }
}
