use crate::config::ResourceLocation;
use crate::Result;

/// 读取资源的全部字节（HTTP GET 或本地文件）
pub async fn fetch_bytes(client: &reqwest::Client, location: &ResourceLocation) -> Result<Vec<u8>> {
    match location {
        ResourceLocation::Remote(url) => {
            tracing::debug!("GET {}", url);
            let response = client.get(url).send().await?.error_for_status()?;
            let bytes = response.bytes().await?;
            Ok(bytes.to_vec())
        }
        ResourceLocation::Local(path) => {
            tracing::debug!("Reading {}", path.display());
            Ok(tokio::fs::read(path).await?)
        }
    }
}

/// 读取文本资源
pub async fn fetch_text(client: &reqwest::Client, location: &ResourceLocation) -> Result<String> {
    let bytes = fetch_bytes(client, location).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
