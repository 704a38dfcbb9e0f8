use thiserror::Error;

/// 元数据文档错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    /// JSON 无法解析或字段缺失
    #[error("解析元数据失败: {0}")]
    Parse(String),
    /// ids 列表中出现重复的文章ID
    #[error("文章ID重复: {0}")]
    DuplicateId(String),
    /// ids 列表中的文章在 posts 中没有对应记录
    #[error("缺少文章记录: {0}")]
    MissingPost(String),
}

impl From<serde_json::Error> for MetadataError {
    fn from(e: serde_json::Error) -> Self {
        MetadataError::Parse(e.to_string())
    }
}
