use crate::config::ResourceLocation;
use crate::utils::fetch_text;
use serde::Serialize;
use std::borrow::Cow;

/// 类别名列表获取失败时使用的内置列表
pub const FALLBACK_LABELS: &[&str] = &[
    "background",
    "tench",
    "goldfish",
    "great white shark",
    "tiger shark",
];

/// 类别名来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSource {
    Loaded,
    Fallback,
}

/// 有序类别名列表，下标即类别 id；加载后不可变
#[derive(Debug, Clone)]
pub struct LabelList {
    names: Vec<String>,
    source: LabelSource,
}

impl LabelList {
    pub fn from_names(names: Vec<String>) -> Self {
        Self {
            names,
            source: LabelSource::Loaded,
        }
    }

    pub fn fallback() -> Self {
        Self {
            names: FALLBACK_LABELS.iter().map(|s| s.to_string()).collect(),
            source: LabelSource::Fallback,
        }
    }

    /// 解析换行分隔的类别名，丢弃空白行
    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.to_string())
            .collect();
        Self::from_names(names)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn source(&self) -> LabelSource {
        self.source
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 类别名解析：本列表 → 内置列表 → "Class {i}"
    pub fn resolve(&self, index: usize) -> Cow<'_, str> {
        match self.get(index).or_else(|| FALLBACK_LABELS.get(index).copied()) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("Class {}", index)),
        }
    }
}

/// 类别名加载器
pub struct LabelCatalog {
    client: reqwest::Client,
    location: ResourceLocation,
}

impl LabelCatalog {
    pub fn new(client: reqwest::Client, location: ResourceLocation) -> Self {
        Self { client, location }
    }

    /// 加载类别名列表，任何失败都退回内置列表，不重试
    pub async fn load(&self) -> LabelList {
        match fetch_text(&self.client, &self.location).await {
            Ok(text) => {
                let labels = LabelList::parse(&text);
                if labels.is_empty() {
                    tracing::warn!(
                        "Label list at {} is empty, using {} fallback labels",
                        self.location,
                        FALLBACK_LABELS.len()
                    );
                    return LabelList::fallback();
                }
                tracing::info!("Loaded {} class labels from {}", labels.len(), self.location);
                labels
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch class labels from {}: {}; using {} fallback labels",
                    self.location,
                    e,
                    FALLBACK_LABELS.len()
                );
                LabelList::fallback()
            }
        }
    }
}
