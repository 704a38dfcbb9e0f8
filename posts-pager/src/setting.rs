//! 持久化设置 - 页码、每页条数和分类都以 cookie 形式保存在浏览器中，
//! 刷新页面后用来恢复分页器状态。
//!
//! 存储本身通过 [`SettingStore`] 注入：浏览器里是 [`CookieStore`]，
//! 测试和没有 DOM 的环境使用 [`MemoryStore`]。

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

use crate::error::{PagerError, Result};

/// cookie 最长有效天数，约一百年
pub const MAX_EXPIRY_DAYS: u32 = 36_500;

/// 设置的过期策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// 在指定天数后过期
    Days(u32),
    /// 会话级别，浏览器关闭即失效
    Session,
}

impl Expiry {
    /// 负数天数表示会话级别，超过 [`MAX_EXPIRY_DAYS`] 的按上限处理
    pub fn from_days(days: i64) -> Self {
        if days < 0 {
            Expiry::Session
        } else {
            let days = u32::try_from(days).unwrap_or(u32::MAX);
            Expiry::Days(days.min(MAX_EXPIRY_DAYS))
        }
    }
}

/// 客户端键值存储
pub trait SettingStore {
    /// 读取值，不存在或已过期时返回空字符串
    fn get(&self, name: &str) -> String;
    /// 覆盖写入
    fn set(&mut self, name: &str, value: &str, expiry: Expiry);
}

/// 一个具名的持久化设置。不校验值的取值范围，由调用方负责。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSetting {
    name: String,
    expiry: Expiry,
}

impl PersistedSetting {
    pub fn new(name: impl Into<String>, expiry: Expiry) -> Self {
        Self {
            name: name.into(),
            expiry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expiry(&self) -> Expiry {
        self.expiry
    }

    pub fn get<S: SettingStore + ?Sized>(&self, store: &S) -> String {
        store.get(&self.name)
    }

    pub fn set<S: SettingStore + ?Sized>(&self, store: &mut S, value: &str) {
        store.set(&self.name, value, self.expiry);
    }
}

/// 生成写入 `document.cookie` 的字符串。有效天数不超过 [`MAX_EXPIRY_DAYS`]，
/// 带天数的设置不会退化成会话 cookie。
pub fn format_cookie(name: &str, value: &str, expiry: Expiry, now: DateTime<Utc>) -> String {
    match expiry {
        Expiry::Days(days) => {
            let days = i64::from(days.min(MAX_EXPIRY_DAYS));
            let at = now
                .checked_add_signed(Duration::days(days))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            format!(
                "{}={};expires={};path=/",
                name,
                value,
                at.format("%a, %d %b %Y %H:%M:%S GMT")
            )
        }
        Expiry::Session => format!("{}={};path=/", name, value),
    }
}

/// 在 `document.cookie` 字符串中查找指定名称的值
pub fn find_cookie<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies
        .split(';')
        .map(|part| part.trim_start_matches(' '))
        .find_map(|part| {
            part.strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
        })
}

/// 基于 `document.cookie` 的存储，值经过 URI 编码
pub struct CookieStore {
    document: HtmlDocument,
}

impl CookieStore {
    pub fn new(document: HtmlDocument) -> Self {
        Self { document }
    }

    /// 使用当前窗口的文档
    pub fn from_window() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| PagerError::Dom("无法获取 document".to_string()))?;
        let document = document
            .dyn_into::<HtmlDocument>()
            .map_err(|_| PagerError::Dom("document 不是 HTML 文档".to_string()))?;
        Ok(Self::new(document))
    }
}

impl SettingStore for CookieStore {
    fn get(&self, name: &str) -> String {
        let cookies = self.document.cookie().unwrap_or_default();
        match find_cookie(&cookies, name) {
            Some(raw) => js_sys::decode_uri_component(raw)
                .map(String::from)
                .unwrap_or_else(|_| raw.to_string()),
            None => String::new(),
        }
    }

    fn set(&mut self, name: &str, value: &str, expiry: Expiry) {
        let encoded: String = js_sys::encode_uri_component(value).into();
        let cookie = format_cookie(name, &encoded, expiry, Utc::now());
        if let Err(e) = self.document.set_cookie(&cookie) {
            log::warn!("写入 cookie {} 失败: {:?}", name, e);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredValue {
    value: String,
    expiry: Expiry,
}

/// 内存存储，不处理过期时间
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用已有的键值对初始化，过期策略记为会话级别
    pub fn with_values<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = pairs
            .into_iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    StoredValue {
                        value: value.to_string(),
                        expiry: Expiry::Session,
                    },
                )
            })
            .collect();
        Self { values }
    }

    /// 最近一次写入时使用的过期策略
    pub fn expiry(&self, name: &str) -> Option<Expiry> {
        self.values.get(name).map(|v| v.expiry)
    }
}

impl SettingStore for MemoryStore {
    fn get(&self, name: &str) -> String {
        self.values
            .get(name)
            .map(|v| v.value.clone())
            .unwrap_or_default()
    }

    fn set(&mut self, name: &str, value: &str, expiry: Expiry) {
        self.values.insert(
            name.to_string(),
            StoredValue {
                value: value.to_string(),
                expiry,
            },
        );
    }
}
