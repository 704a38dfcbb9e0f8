pub mod error;
pub mod models;

// 重新导出常用类型，方便直接使用
pub use error::MetadataError;
pub use models::{parse_post_date, Metadata, PostRecord, ALL_CATEGORIES};
