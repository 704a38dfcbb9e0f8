use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::error::{PagerError, Result};
use crate::setting::{Expiry, PersistedSetting, MAX_EXPIRY_DAYS};

/// 分页器配置 - 页面元素ID、cookie 设置和每页条数范围。
/// 所有字段都有默认值，客户端只需要传入需要覆盖的部分。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PagerConfig {
    /// 文章列表容器
    pub posts_container: String,
    /// "下一页"按钮，可以有多个
    pub next_ids: Vec<String>,
    /// "上一页"按钮，可以有多个
    pub previous_ids: Vec<String>,
    /// "应用筛选"按钮
    pub apply_filter_id: String,
    /// 每页条数输入框
    pub items_per_page_input: String,
    /// 页码输入框
    pub page_input: String,
    /// 分类选择框
    pub category_select: String,
    /// 源文件链接前缀
    pub sources_prefix: String,
    /// 每页条数范围
    pub items_per_page: ItemsPerPageConfig,
    /// 三个持久化设置
    pub settings: SettingsConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ItemsPerPageConfig {
    pub default: usize,
    pub min: usize,
    pub max: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SettingsConfig {
    pub page: SettingConfig,
    pub items_per_page: SettingConfig,
    pub category: SettingConfig,
}

/// 单个设置：cookie 名称和有效天数（负数表示会话级别）
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SettingConfig {
    pub name: String,
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
}

/// 默认有效期一天
fn default_expiry_days() -> i64 {
    1
}

impl SettingConfig {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            expiry_days: default_expiry_days(),
        }
    }

    pub fn to_setting(&self) -> PersistedSetting {
        PersistedSetting::new(self.name.clone(), Expiry::from_days(self.expiry_days))
    }
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            posts_container: "ppgr-posts".to_string(),
            next_ids: vec!["ppgr-next".to_string(), "ppgr-next-2".to_string()],
            previous_ids: vec!["ppgr-prev".to_string(), "ppgr-prev-2".to_string()],
            apply_filter_id: "ppgr-apply-filter".to_string(),
            items_per_page_input: "ppgr-items-per-page".to_string(),
            page_input: "ppgr-page".to_string(),
            category_select: "ppgr-category".to_string(),
            sources_prefix: "./sources/".to_string(),
            items_per_page: ItemsPerPageConfig::default(),
            settings: SettingsConfig::default(),
        }
    }
}

impl Default for ItemsPerPageConfig {
    fn default() -> Self {
        Self {
            default: 5,
            min: 5,
            max: 50,
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            page: SettingConfig::named("page"),
            items_per_page: SettingConfig::named("itemsPerPage"),
            category: SettingConfig::named("category"),
        }
    }
}

impl ItemsPerPageConfig {
    /// 限制到 [min, max]
    pub fn clamp(&self, value: usize) -> usize {
        value.clamp(self.min, self.max)
    }
}

impl PagerConfig {
    /// 从 JSON 文本解析配置
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PagerConfig = serde_json::from_str(json)
            .map_err(|e| PagerError::Config(format!("解析配置失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JS 对象解析配置，undefined/null 使用默认配置
    pub fn from_js(value: JsValue) -> Result<Self> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        let config: PagerConfig = serde_wasm_bindgen::from_value(value)
            .map_err(|e| PagerError::Config(format!("解析配置失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let range = &self.items_per_page;
        if range.min == 0 || range.min > range.max {
            return Err(PagerError::Config(format!(
                "每页条数范围无效: [{}, {}]",
                range.min, range.max
            )));
        }
        if range.default < range.min || range.default > range.max {
            return Err(PagerError::Config(format!(
                "默认每页条数 {} 不在 [{}, {}] 内",
                range.default, range.min, range.max
            )));
        }

        let names = [
            &self.settings.page.name,
            &self.settings.items_per_page.name,
            &self.settings.category.name,
        ];
        if names.iter().any(|name| name.is_empty()) {
            return Err(PagerError::Config("cookie 名称不能为空".to_string()));
        }
        if names[0] == names[1] || names[0] == names[2] || names[1] == names[2] {
            return Err(PagerError::Config("cookie 名称不能重复".to_string()));
        }

        for setting in [
            &self.settings.page,
            &self.settings.items_per_page,
            &self.settings.category,
        ] {
            if setting.expiry_days > i64::from(MAX_EXPIRY_DAYS) {
                return Err(PagerError::Config(format!(
                    "cookie {} 的有效天数 {} 超过上限 {}",
                    setting.name, setting.expiry_days, MAX_EXPIRY_DAYS
                )));
            }
        }
        Ok(())
    }
}
