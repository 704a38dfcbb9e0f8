use thiserror::Error;
use utils_common::MetadataError;
use wasm_bindgen::JsValue;

/// 分页器错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PagerError {
    /// 元数据获取、解析或校验失败，分页器保持未初始化
    #[error("加载文章元数据失败: {0}")]
    LoadFailed(String),
    /// cookie 中保存的值无效；只在内部记录日志并回退到默认值
    #[error("设置 {name} 的值无效: {value:?}")]
    InvalidPersistedValue { name: String, value: String },
    /// 配置无效
    #[error("配置无效: {0}")]
    Config(String),
    /// 页面元素缺失或 DOM 调用失败
    #[error("DOM 操作失败: {0}")]
    Dom(String),
}

impl From<MetadataError> for PagerError {
    fn from(e: MetadataError) -> Self {
        PagerError::LoadFailed(e.to_string())
    }
}

impl From<PagerError> for JsValue {
    fn from(e: PagerError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PagerError>;
