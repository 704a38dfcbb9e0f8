use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::fs;
use utils_common::{parse_post_date, Metadata, PostRecord};

/// 元数据构建器 - 收集文章并生成分页器使用的元数据文档
pub struct MetadataBuilder {
    posts: Vec<(String, PostRecord, NaiveDateTime)>,
}

impl MetadataBuilder {
    /// 创建新的元数据构建器
    pub fn new() -> Self {
        Self { posts: Vec::new() }
    }

    /// 获取已添加的文章数量
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    /// 添加文章；日期无法解析的文章无法排序，直接拒绝
    pub fn add_post(&mut self, id: String, post: PostRecord) -> Result<(), String> {
        let published = parse_post_date(&post.date)
            .ok_or_else(|| format!("文章 {} 的日期无法解析: {}", id, post.date))?;
        self.posts.push((id, post, published));
        Ok(())
    }

    /// 构建元数据：最新的文章在前，日期相同按ID排序
    pub fn build_metadata(&self) -> Result<Metadata, String> {
        if self.posts.is_empty() {
            return Err("无法构建元数据: 没有文章数据".to_string());
        }

        let mut ordered: Vec<&(String, PostRecord, NaiveDateTime)> = self.posts.iter().collect();
        ordered.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

        let categories: BTreeSet<&str> = self
            .posts
            .iter()
            .map(|(_, post, _)| post.category.as_str())
            .collect();

        let metadata = Metadata {
            ids: ordered.iter().map(|(id, _, _)| id.clone()).collect(),
            categories: categories.into_iter().map(str::to_string).collect(),
            posts: ordered
                .iter()
                .map(|(id, post, _)| (id.clone(), post.clone()))
                .collect(),
        };
        metadata.validate().map_err(|e| e.to_string())?;
        Ok(metadata)
    }

    /// 保存元数据到 JSON 文件
    pub fn save_metadata(&self, path: &str) -> Result<(), String> {
        let metadata = self.build_metadata()?;
        let json = serde_json::to_string_pretty(&metadata)
            .map_err(|e| format!("序列化元数据失败: {}", e))?;
        fs::write(path, json).map_err(|e| format!("无法写入元数据文件 {}: {}", path, e))
    }
}

impl Default for MetadataBuilder {
    fn default() -> Self {
        Self::new()
    }
}
