//! 文章分页器 - 维护当前位置、每页条数和分类筛选，
//! 每次状态变化都写回 cookie 并重新计算当前页的文章。
//!
//! `index` 是当前页第一篇文章在"符合筛选条件的文章序列"中的偏移量，
//! 页码由它推导，不单独保存。

use log::{debug, warn};
use serde::Serialize;
use utils_common::{Metadata, ALL_CATEGORIES};

use crate::config::{ItemsPerPageConfig, PagerConfig};
use crate::error::PagerError;
use crate::setting::{PersistedSetting, SettingStore};

/// 一次更新后视图需要展示的全部状态
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// 当前页的文章ID
    pub post_ids: Vec<String>,
    pub index: usize,
    pub page: usize,
    pub last_page: usize,
    pub items_per_page: usize,
    pub category: String,
    /// "上一页"按钮是否禁用
    pub previous_disabled: bool,
    /// "下一页"按钮是否禁用
    pub next_disabled: bool,
}

/// 带分类筛选和持久化的文章分页器
pub struct PostsPager<S: SettingStore> {
    metadata: Metadata,
    store: S,
    page_setting: PersistedSetting,
    items_per_page_setting: PersistedSetting,
    category_setting: PersistedSetting,
    range: ItemsPerPageConfig,
    index: usize,
    items_per_page: usize,
    category: String,
}

impl<S: SettingStore> PostsPager<S> {
    /// 创建分页器，并从持久化设置中恢复状态。无效的值回退到默认值，
    /// 下一次 [`update`](Self::update) 时写回修正后的值。
    pub fn new(metadata: Metadata, store: S, config: &PagerConfig) -> Self {
        let mut pager = Self {
            metadata,
            store,
            page_setting: config.settings.page.to_setting(),
            items_per_page_setting: config.settings.items_per_page.to_setting(),
            category_setting: config.settings.category.to_setting(),
            range: config.items_per_page,
            index: 0,
            items_per_page: config.items_per_page.default,
            category: ALL_CATEGORIES.to_string(),
        };

        pager.category = pager.load_category();
        pager.items_per_page = pager.load_items_per_page();
        let page = pager.load_page().min(pager.last_page());
        pager.index = pager.items_per_page * page;

        debug!(
            "分页器初始化完成: index={}, items_per_page={}, category={}",
            pager.index, pager.items_per_page, pager.category
        );
        pager
    }

    fn load_category(&self) -> String {
        let stored = self.category_setting.get(&self.store);
        if stored.is_empty() {
            return ALL_CATEGORIES.to_string();
        }
        if self.metadata.has_category(&stored) {
            stored
        } else {
            report_invalid(&self.category_setting, &stored);
            ALL_CATEGORIES.to_string()
        }
    }

    fn load_items_per_page(&self) -> usize {
        let stored = self.items_per_page_setting.get(&self.store);
        if stored.is_empty() {
            return self.range.default;
        }
        match stored.trim().parse::<usize>() {
            Ok(value) => {
                let clamped = self.range.clamp(value);
                if clamped != value {
                    debug!("每页条数 {} 超出范围，调整为 {}", value, clamped);
                }
                clamped
            }
            Err(_) => {
                report_invalid(&self.items_per_page_setting, &stored);
                self.range.default
            }
        }
    }

    fn load_page(&self) -> usize {
        let stored = self.page_setting.get(&self.store);
        if stored.is_empty() {
            return 0;
        }
        let digits = stored.trim();
        match digits.parse::<usize>() {
            Ok(page) => page,
            // 超出 usize 的非负整数仍是有效页码，随后被限制到最后一页
            Err(_) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => usize::MAX,
            Err(_) => {
                report_invalid(&self.page_setting, &stored);
                0
            }
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// 当前页码，从 0 开始
    pub fn page(&self) -> usize {
        self.index / self.items_per_page
    }

    /// 符合当前分类的文章数量
    pub fn eligible_count(&self) -> usize {
        self.metadata.eligible_count(&self.category)
    }

    /// 最后一页的页码
    pub fn last_page(&self) -> usize {
        self.eligible_count() / self.items_per_page
    }

    /// 当前页的文章ID：跳过前 `index` 篇符合分类的文章，再取 `items_per_page` 篇
    pub fn post_ids(&self) -> Vec<String> {
        self.metadata
            .eligible_ids(&self.category)
            .skip(self.index)
            .take(self.items_per_page)
            .cloned()
            .collect()
    }

    /// 翻到下一页；已经是最后一页时不做任何事并返回 `None`
    pub fn next_page(&mut self) -> Option<PageView> {
        if self.index + self.items_per_page < self.eligible_count() {
            self.index += self.items_per_page;
            Some(self.update())
        } else {
            None
        }
    }

    /// 翻到上一页，不足一页时回到开头；已经在开头时返回 `None`
    pub fn previous_page(&mut self) -> Option<PageView> {
        if self.index == 0 {
            return None;
        }
        self.index = self.index.saturating_sub(self.items_per_page);
        Some(self.update())
    }

    /// 跳转到指定页，保持每页条数和分类不变
    pub fn go_to_page(&mut self, page: usize) -> PageView {
        let category = self.category.clone();
        self.apply_filter(self.items_per_page, page, &category)
    }

    /// 应用新的每页条数、页码和分类
    pub fn apply_filter(&mut self, items_per_page: usize, page: usize, category: &str) -> PageView {
        self.items_per_page = self.range.clamp(items_per_page);
        self.category = if self.metadata.has_category(category) {
            category.to_string()
        } else {
            warn!("未知分类 {:?}，改为显示全部文章", category);
            ALL_CATEGORIES.to_string()
        };
        let page = page.min(self.last_page());
        self.index = page * self.items_per_page;
        self.update()
    }

    /// 持久化当前状态并返回新的视图
    pub fn update(&mut self) -> PageView {
        let page = self.page().to_string();
        let items_per_page = self.items_per_page.to_string();
        self.page_setting.set(&mut self.store, &page);
        self.items_per_page_setting
            .set(&mut self.store, &items_per_page);
        self.category_setting.set(&mut self.store, &self.category);

        let view = self.view();
        debug!(
            "分页器更新: page={}/{}, items_per_page={}, category={}, 文章数={}",
            view.page,
            view.last_page,
            view.items_per_page,
            view.category,
            view.post_ids.len()
        );
        view
    }

    /// 当前状态的视图，不写入设置
    pub fn view(&self) -> PageView {
        let count = self.eligible_count();
        PageView {
            post_ids: self.post_ids(),
            index: self.index,
            page: self.page(),
            last_page: self.last_page(),
            items_per_page: self.items_per_page,
            category: self.category.clone(),
            previous_disabled: self.index == 0,
            next_disabled: self.index + self.items_per_page >= count,
        }
    }
}

fn report_invalid(setting: &PersistedSetting, value: &str) {
    let err = PagerError::InvalidPersistedValue {
        name: setting.name().to_string(),
        value: value.to_string(),
    };
    warn!("{}，使用默认值", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting::MemoryStore;
    use utils_common::PostRecord;

    /// 生成 p0..p{n-1}，分类依次为 code / life
    fn metadata(count: usize) -> Metadata {
        let mut metadata = Metadata {
            categories: vec!["code".to_string(), "life".to_string()],
            ..Metadata::default()
        };
        for i in 0..count {
            let id = format!("p{}", i);
            let category = if i % 2 == 0 { "code" } else { "life" };
            metadata.ids.push(id.clone());
            metadata.posts.insert(
                id.clone(),
                PostRecord {
                    title: format!("Post {}", i),
                    date: "2019-05-21 20:00".to_string(),
                    category: category.to_string(),
                    tags: vec![],
                    summary: String::new(),
                    html: format!("{}.html", id),
                    source: format!("{}.rst", id),
                },
            );
        }
        metadata
    }

    fn pager(count: usize, stored: &[(&str, &str)]) -> PostsPager<MemoryStore> {
        let store = MemoryStore::with_values(stored.iter().copied());
        PostsPager::new(metadata(count), store, &PagerConfig::default())
    }

    fn ids(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("p{}", i)).collect()
    }

    #[test]
    fn defaults_without_stored_settings() {
        let pager = pager(10, &[]);
        assert_eq!(pager.index(), 0);
        assert_eq!(pager.items_per_page(), 5);
        assert_eq!(pager.category(), "all");
    }

    #[test]
    fn pages_through_unfiltered_posts() {
        let mut pager = pager(10, &[]);
        assert_eq!(pager.post_ids(), ids(0..5));

        let view = pager.next_page().expect("second page");
        assert_eq!(pager.index(), 5);
        assert_eq!(view.post_ids, ids(5..10));
        assert!(view.next_disabled);
        assert!(!view.previous_disabled);

        assert!(pager.next_page().is_none());
        assert_eq!(pager.index(), 5);
    }

    #[test]
    fn previous_page_stops_at_zero() {
        let mut pager = pager(10, &[]);
        assert!(pager.previous_page().is_none());
        assert_eq!(pager.index(), 0);

        pager.next_page();
        let view = pager.previous_page().expect("back to first page");
        assert_eq!(view.index, 0);
        assert!(view.previous_disabled);
    }

    #[test]
    fn clamps_stored_items_per_page() {
        assert_eq!(pager(10, &[("itemsPerPage", "3")]).items_per_page(), 5);
        assert_eq!(pager(10, &[("itemsPerPage", "100")]).items_per_page(), 50);
        assert_eq!(pager(10, &[("itemsPerPage", "12")]).items_per_page(), 12);
    }

    #[test]
    fn invalid_stored_values_fall_back_to_defaults() {
        let mut pager = pager(
            30,
            &[("itemsPerPage", "ten"), ("page", "-1"), ("category", "travel")],
        );
        assert_eq!(pager.items_per_page(), 5);
        assert_eq!(pager.index(), 0);
        assert_eq!(pager.category(), "all");

        pager.update();
        let store = pager.store();
        assert_eq!(store.get("itemsPerPage"), "5");
        assert_eq!(store.get("page"), "0");
        assert_eq!(store.get("category"), "all");
    }

    #[test]
    fn non_integer_page_resets_to_first_page() {
        assert_eq!(pager(30, &[("page", "1.5")]).index(), 0);
        assert_eq!(pager(30, &[("page", "abc")]).index(), 0);
    }

    #[test]
    fn stored_page_is_clamped_to_last_page() {
        let pager = pager(9, &[("page", "2"), ("itemsPerPage", "5")]);
        assert_eq!(pager.last_page(), 1);
        assert_eq!(pager.index(), 5);
    }

    #[test]
    fn oversized_stored_page_clamps_to_last_page() {
        let pager = pager(30, &[("page", "99999999999999999999999")]);
        assert_eq!(pager.last_page(), 6);
        assert_eq!(pager.index(), 30);
    }

    #[test]
    fn stored_page_seeds_index() {
        let pager = pager(30, &[("page", "3"), ("itemsPerPage", "6")]);
        assert_eq!(pager.index(), 18);
        assert_eq!(pager.page(), 3);
    }

    #[test]
    fn apply_filter_round_trips_page() {
        let mut pager = pager(120, &[]);
        for items_per_page in 5..=50 {
            pager.apply_filter(items_per_page, 0, "all");
            let last_page = pager.last_page();
            for page in 0..=last_page {
                let view = pager.apply_filter(items_per_page, page, "all");
                assert_eq!(pager.page(), page);
                assert_eq!(view.page, page);
                assert_eq!(view.index, page * items_per_page);
            }
        }
    }

    #[test]
    fn apply_filter_clamps_arguments() {
        let mut pager = pager(23, &[]);
        let view = pager.apply_filter(2, 99, "unknown");
        assert_eq!(view.items_per_page, 5);
        assert_eq!(view.category, "all");
        assert_eq!(view.last_page, 4);
        assert_eq!(view.page, 4);
        assert_eq!(view.post_ids, ids(20..23));
    }

    #[test]
    fn next_page_never_passes_last_page() {
        for count in [0, 1, 4, 5, 9, 10, 11, 23] {
            let mut pager = pager(count, &[]);
            while pager.next_page().is_some() {}
            assert!(pager.index() <= pager.items_per_page() * pager.last_page());
            assert!(pager.index() < count.max(1));
        }
    }

    #[test]
    fn empty_listing_disables_both_controls() {
        let view = pager(0, &[]).view();
        assert!(view.post_ids.is_empty());
        assert!(view.previous_disabled);
        assert!(view.next_disabled);
        assert_eq!(view.last_page, 0);
    }

    #[test]
    fn filters_by_category() {
        let mut pager = pager(20, &[]);
        let view = pager.apply_filter(5, 0, "life");
        assert_eq!(view.post_ids, vec!["p1", "p3", "p5", "p7", "p9"]);
        assert_eq!(view.last_page, 2);

        let view = pager.next_page().expect("second life page");
        assert_eq!(view.post_ids, vec!["p11", "p13", "p15", "p17", "p19"]);
        assert!(view.next_disabled);
        assert!(pager.next_page().is_none());
    }

    #[test]
    fn apply_filter_clamps_page_to_filtered_count() {
        let mut pager = pager(23, &[]);
        let view = pager.apply_filter(5, 99, "life");
        assert_eq!(view.last_page, 2);
        assert_eq!(view.page, 2);
        assert_eq!(view.index, 10);
        assert_eq!(view.post_ids, vec!["p21"]);

        let restored = PostsPager::new(metadata(23), pager.into_store(), &PagerConfig::default());
        assert_eq!(restored.index(), 10);
        assert_eq!(restored.category(), "life");
        assert_eq!(restored.post_ids(), vec!["p21"]);
    }

    #[test]
    fn go_to_page_keeps_filter() {
        let mut pager = pager(40, &[]);
        pager.apply_filter(5, 0, "code");
        let view = pager.go_to_page(1);
        assert_eq!(view.category, "code");
        assert_eq!(view.post_ids, vec!["p10", "p12", "p14", "p16", "p18"]);
    }

    #[test]
    fn persisted_state_restores_in_fresh_pager() {
        let mut first = pager(40, &[]);
        first.apply_filter(7, 2, "code");
        let expected = (first.page(), first.items_per_page(), first.category().to_string());

        let store = first.into_store();
        assert_eq!(store.get("page"), "2");
        assert_eq!(store.get("itemsPerPage"), "7");
        assert_eq!(store.get("category"), "code");

        let second = PostsPager::new(metadata(40), store, &PagerConfig::default());
        assert_eq!(
            (second.page(), second.items_per_page(), second.category().to_string()),
            expected
        );
        assert_eq!(second.index(), 14);
    }

    #[test]
    fn navigation_persists_page() {
        let mut pager = pager(20, &[]);
        pager.next_page();
        pager.next_page();
        assert_eq!(pager.store().get("page"), "2");
        pager.previous_page();
        assert_eq!(pager.store().get("page"), "1");
    }
}
