use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::MetadataError;

/// 表示"不筛选"的分类值，分类选择框的第一个选项
pub const ALL_CATEGORIES: &str = "all";

/// 文章记录 - 渲染一篇文章摘要所需的全部信息
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PostRecord {
    /// 文章标题
    pub title: String,
    /// 发布日期（展示用的原始字符串）
    pub date: String,
    /// 文章分类
    pub category: String,
    /// 文章标签列表
    pub tags: Vec<String>,
    /// 文章摘要
    pub summary: String,
    /// 完整文章的链接
    pub html: String,
    /// 文章源文件的链接
    pub source: String,
}

/// 文章元数据文档 - 页面加载时获取一次，之后不再修改
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    /// 按展示顺序排列的文章ID
    pub ids: Vec<String>,
    /// 所有分类
    pub categories: Vec<String>,
    /// 文章ID -> 文章记录
    pub posts: HashMap<String, PostRecord>,
}

impl Metadata {
    /// 从 JSON 文本解析并校验元数据
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        let metadata: Metadata = serde_json::from_str(json)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// 校验文档结构：ID唯一，且每个ID都有对应的文章记录
    pub fn validate(&self) -> Result<(), MetadataError> {
        let mut seen = HashSet::with_capacity(self.ids.len());
        for id in &self.ids {
            if !seen.insert(id.as_str()) {
                return Err(MetadataError::DuplicateId(id.clone()));
            }
            if !self.posts.contains_key(id) {
                return Err(MetadataError::MissingPost(id.clone()));
            }
        }
        Ok(())
    }

    /// 文章总数（不考虑筛选）
    pub fn total_count(&self) -> usize {
        self.ids.len()
    }

    /// 获取文章记录
    pub fn post(&self, id: &str) -> Option<&PostRecord> {
        self.posts.get(id)
    }

    /// 分类是否可用于筛选；"all" 始终可用
    pub fn has_category(&self, category: &str) -> bool {
        category == ALL_CATEGORIES || self.categories.iter().any(|c| c == category)
    }

    /// 分类选择框的选项，第一个总是 "all"，其余去重并保持原顺序
    pub fn category_choices(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut choices = vec![ALL_CATEGORIES.to_string()];
        for category in &self.categories {
            if category != ALL_CATEGORIES && seen.insert(category.as_str()) {
                choices.push(category.clone());
            }
        }
        choices
    }

    /// 按展示顺序返回符合分类的文章ID
    pub fn eligible_ids<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.ids.iter().filter(move |id| {
            category == ALL_CATEGORIES
                || self.posts.get(id.as_str()).map_or(false, |post| post.category == category)
        })
    }

    /// 符合分类的文章数量
    pub fn eligible_count(&self, category: &str) -> usize {
        if category == ALL_CATEGORIES {
            self.ids.len()
        } else {
            self.eligible_ids(category).count()
        }
    }
}

/// 解析文章日期，支持 "2019-05-21 20:00"、RFC3339 和纯日期格式
pub fn parse_post_date(date: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: &str) -> PostRecord {
        PostRecord {
            title: "t".to_string(),
            date: "2019-05-21 20:00".to_string(),
            category: category.to_string(),
            tags: vec![],
            summary: String::new(),
            html: "t.html".to_string(),
            source: "t.rst".to_string(),
        }
    }

    #[test]
    fn parses_and_validates_document() {
        let json = r#"{
            "ids": ["a", "b"],
            "categories": ["code", "life"],
            "posts": {
                "a": {"title": "A", "date": "2019-05-21 20:00", "category": "code",
                      "tags": ["rust"], "summary": "s", "html": "a.html", "source": "a.rst"},
                "b": {"title": "B", "date": "2019-05-22 20:00", "category": "life",
                      "tags": [], "summary": "s", "html": "b.html", "source": "b.rst"}
            }
        }"#;
        let metadata = Metadata::from_json(json).unwrap();
        assert_eq!(metadata.total_count(), 2);
        assert_eq!(metadata.post("a").unwrap().tags, vec!["rust".to_string()]);
    }

    #[test]
    fn rejects_missing_fields() {
        let json = r#"{"ids": ["a"], "categories": [], "posts": {"a": {"title": "A"}}}"#;
        assert!(matches!(Metadata::from_json(json), Err(MetadataError::Parse(_))));
    }

    #[test]
    fn rejects_duplicate_and_missing_ids() {
        let mut metadata = Metadata::default();
        metadata.ids = vec!["a".to_string(), "a".to_string()];
        metadata.posts.insert("a".to_string(), record("code"));
        assert_eq!(metadata.validate(), Err(MetadataError::DuplicateId("a".to_string())));

        metadata.ids = vec!["a".to_string(), "b".to_string()];
        assert_eq!(metadata.validate(), Err(MetadataError::MissingPost("b".to_string())));
    }

    #[test]
    fn category_choices_start_with_all() {
        let metadata = Metadata {
            categories: vec!["code".into(), "all".into(), "life".into(), "code".into()],
            ..Metadata::default()
        };
        assert_eq!(metadata.category_choices(), vec!["all", "code", "life"]);
        assert!(metadata.has_category("all"));
        assert!(metadata.has_category("life"));
        assert!(!metadata.has_category("travel"));
    }

    #[test]
    fn eligible_ids_follow_display_order() {
        let mut metadata = Metadata::default();
        for (id, category) in [("a", "code"), ("b", "life"), ("c", "code")] {
            metadata.ids.push(id.to_string());
            metadata.posts.insert(id.to_string(), record(category));
        }
        let code: Vec<&String> = metadata.eligible_ids("code").collect();
        assert_eq!(code, vec!["a", "c"]);
        assert_eq!(metadata.eligible_count("all"), 3);
        assert_eq!(metadata.eligible_count("life"), 1);
    }

    #[test]
    fn parses_supported_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2019, 5, 21).unwrap().and_hms_opt(20, 0, 0).unwrap();
        assert_eq!(parse_post_date("2019-05-21 20:00"), Some(expected));
        assert_eq!(parse_post_date("2019-05-21T20:00:00Z"), Some(expected));
        assert_eq!(parse_post_date("2019-05-21T20:00:00"), Some(expected));
        assert!(parse_post_date("2019-05-21").is_some());
        assert_eq!(parse_post_date("yesterday"), None);
    }
}
