//! 浏览器绑定 - 把分页器接到页面控件上。
//!
//! 分页器状态只有一个所有者：`Rc<Shared>` 里的 `RefCell`，
//! 所有事件回调都持有同一个 `Rc` 的克隆。

use std::cell::RefCell;
use std::rc::Rc;

use log::{error, info};
use utils_common::Metadata;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlInputElement, HtmlOptionElement, HtmlSelectElement};

use crate::config::PagerConfig;
use crate::error::{PagerError, Result};
use crate::pager::{PageView, PostsPager};
use crate::render::{render_post, POST_CONTAINER_CLASS};
use crate::setting::CookieStore;

fn dom_error(e: JsValue) -> PagerError {
    PagerError::Dom(format!("{:?}", e))
}

/// 页面控件的读写
struct DomView {
    document: Document,
    config: PagerConfig,
}

impl DomView {
    fn from_window(config: PagerConfig) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| PagerError::Dom("无法获取 document".to_string()))?;
        Ok(Self { document, config })
    }

    fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn input(&self, id: &str) -> Option<HtmlInputElement> {
        self.element(id).and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
    }

    fn select(&self) -> Option<HtmlSelectElement> {
        self.element(&self.config.category_select)
            .and_then(|e| e.dyn_into::<HtmlSelectElement>().ok())
    }

    /// 填充分类选择框，第一个选项为 "all"
    fn populate_categories(&self, choices: &[String]) -> Result<()> {
        let Some(select) = self.select() else {
            return Ok(());
        };
        select.set_inner_html("");
        for choice in choices {
            let option = HtmlOptionElement::new_with_text_and_value(choice, choice).map_err(dom_error)?;
            select.append_child(&option).map_err(dom_error)?;
        }
        Ok(())
    }

    /// 完整重绘当前页并同步控件状态
    fn render(&self, view: &PageView, metadata: &Metadata) -> Result<()> {
        let container = self.element(&self.config.posts_container).ok_or_else(|| {
            PagerError::Dom(format!("找不到文章容器 #{}", self.config.posts_container))
        })?;

        container.set_inner_html("");
        for id in &view.post_ids {
            let Some(post) = metadata.post(id) else {
                continue;
            };
            let item = self.document.create_element("div").map_err(dom_error)?;
            item.set_id(id);
            item.set_class_name(POST_CONTAINER_CLASS);
            item.set_inner_html(&render_post(post, &self.config.sources_prefix));
            container.append_child(&item).map_err(dom_error)?;
        }

        self.sync_controls(view)
    }

    fn sync_controls(&self, view: &PageView) -> Result<()> {
        if let Some(input) = self.input(&self.config.items_per_page_input) {
            input.set_value(&view.items_per_page.to_string());
        }
        if let Some(input) = self.input(&self.config.page_input) {
            input
                .set_attribute("max", &view.last_page.to_string())
                .map_err(dom_error)?;
            input.set_value(&view.page.to_string());
        }
        if let Some(select) = self.select() {
            select.set_value(&view.category);
        }

        for id in &self.config.previous_ids {
            self.set_disabled(id, view.previous_disabled)?;
        }
        for id in &self.config.next_ids {
            self.set_disabled(id, view.next_disabled)?;
        }
        Ok(())
    }

    fn set_disabled(&self, id: &str, disabled: bool) -> Result<()> {
        let Some(control) = self.element(id) else {
            return Ok(());
        };
        control
            .toggle_attribute_with_force("disabled", disabled)
            .map_err(dom_error)?;
        let classes = control.class_list();
        classes
            .toggle_with_force("text-info", disabled)
            .map_err(dom_error)?;
        classes
            .toggle_with_force("text-light", !disabled)
            .map_err(dom_error)?;
        Ok(())
    }

    /// 读取筛选控件，无法解析的值保留当前状态
    fn read_filter(&self, current: &PageView) -> (usize, usize, String) {
        let read_number = |id: &str, fallback: usize| {
            self.input(id)
                .and_then(|input| input.value().trim().parse::<usize>().ok())
                .unwrap_or(fallback)
        };
        let items_per_page = read_number(&self.config.items_per_page_input, current.items_per_page);
        let page = read_number(&self.config.page_input, current.page);
        let category = self
            .select()
            .map(|select| select.value())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| current.category.clone());
        (items_per_page, page, category)
    }
}

struct Shared {
    pager: RefCell<PostsPager<CookieStore>>,
    view: DomView,
}

impl Shared {
    fn render(&self, page: &PageView) -> Result<()> {
        let pager = self.pager.borrow();
        self.view.render(page, pager.metadata())
    }

    fn update(&self) -> Result<()> {
        let page = self.pager.borrow_mut().update();
        self.render(&page)
    }

    fn next_page(&self) -> Result<()> {
        let page = self.pager.borrow_mut().next_page();
        match page {
            Some(page) => self.render(&page),
            None => Ok(()),
        }
    }

    fn previous_page(&self) -> Result<()> {
        let page = self.pager.borrow_mut().previous_page();
        match page {
            Some(page) => self.render(&page),
            None => Ok(()),
        }
    }

    fn apply_filter(&self, items_per_page: usize, page: usize, category: &str) -> Result<()> {
        let page = self
            .pager
            .borrow_mut()
            .apply_filter(items_per_page, page, category);
        self.render(&page)
    }

    fn apply_filter_from_controls(&self) -> Result<()> {
        let current = self.pager.borrow().view();
        let (items_per_page, page, category) = self.view.read_filter(&current);
        self.apply_filter(items_per_page, page, &category)
    }
}

/// 点击时执行 `action`，错误写入日志
fn on_click(target: &Element, shared: &Rc<Shared>, action: fn(&Shared) -> Result<()>) -> Result<()> {
    let shared = Rc::clone(shared);
    let closure = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        if let Err(e) = action(&shared) {
            error!("{}", e);
        }
    });
    target
        .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        .map_err(dom_error)?;
    // 监听器与页面同生命周期
    closure.forget();
    Ok(())
}

fn non_negative(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// 文章分页器JS接口
#[wasm_bindgen]
pub struct PostsPagerJS {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl PostsPagerJS {
    /// 用已获取的元数据 JSON 创建分页器，并渲染第一屏
    #[wasm_bindgen(constructor)]
    pub fn new(metadata_json: &str, config: JsValue) -> std::result::Result<PostsPagerJS, JsValue> {
        let config = PagerConfig::from_js(config)?;

        let metadata = Metadata::from_json(metadata_json).map_err(|e| {
            let err = PagerError::from(e);
            error!("{}", err);
            err
        })?;
        info!(
            "元数据加载完成: {} 篇文章, {} 个分类",
            metadata.total_count(),
            metadata.categories.len()
        );

        let store = CookieStore::from_window()?;
        let view = DomView::from_window(config.clone())?;
        let pager = PostsPager::new(metadata, store, &config);
        view.populate_categories(&pager.metadata().category_choices())?;

        let shared = Rc::new(Shared {
            pager: RefCell::new(pager),
            view,
        });
        shared.update()?;
        Ok(PostsPagerJS { shared })
    }

    /// 为翻页和筛选按钮注册点击事件，缺失的按钮会被跳过
    #[wasm_bindgen]
    pub fn register_events(&self) -> std::result::Result<(), JsValue> {
        let config = &self.shared.view.config;
        for id in &config.next_ids {
            if let Some(target) = self.shared.view.element(id) {
                on_click(&target, &self.shared, Shared::next_page)?;
            }
        }
        for id in &config.previous_ids {
            if let Some(target) = self.shared.view.element(id) {
                on_click(&target, &self.shared, Shared::previous_page)?;
            }
        }
        if let Some(target) = self.shared.view.element(&config.apply_filter_id) {
            on_click(&target, &self.shared, Shared::apply_filter_from_controls)?;
        }
        Ok(())
    }

    #[wasm_bindgen]
    pub fn next_page(&self) -> std::result::Result<(), JsValue> {
        Ok(self.shared.next_page()?)
    }

    #[wasm_bindgen]
    pub fn previous_page(&self) -> std::result::Result<(), JsValue> {
        Ok(self.shared.previous_page()?)
    }

    #[wasm_bindgen]
    pub fn apply_filter(&self, items_per_page: i32, page: i32, category: &str) -> std::result::Result<(), JsValue> {
        Ok(self
            .shared
            .apply_filter(non_negative(items_per_page), non_negative(page), category)?)
    }

    /// 从页面控件读取筛选条件并应用
    #[wasm_bindgen]
    pub fn apply_filter_from_controls(&self) -> std::result::Result<(), JsValue> {
        Ok(self.shared.apply_filter_from_controls()?)
    }

    #[wasm_bindgen]
    pub fn index(&self) -> usize {
        self.shared.pager.borrow().index()
    }

    #[wasm_bindgen]
    pub fn page(&self) -> usize {
        self.shared.pager.borrow().page()
    }

    #[wasm_bindgen]
    pub fn last_page(&self) -> usize {
        self.shared.pager.borrow().last_page()
    }

    #[wasm_bindgen]
    pub fn items_per_page(&self) -> usize {
        self.shared.pager.borrow().items_per_page()
    }

    #[wasm_bindgen]
    pub fn category(&self) -> String {
        self.shared.pager.borrow().category().to_string()
    }

    #[wasm_bindgen]
    pub fn post_ids(&self) -> std::result::Result<JsValue, JsValue> {
        let ids = self.shared.pager.borrow().post_ids();
        serde_wasm_bindgen::to_value(&ids)
            .map_err(|e| JsValue::from_str(&format!("序列化文章ID失败: {}", e)))
    }

    /// 当前视图状态
    #[wasm_bindgen]
    pub fn view(&self) -> std::result::Result<JsValue, JsValue> {
        let view = self.shared.pager.borrow().view();
        serde_wasm_bindgen::to_value(&view)
            .map_err(|e| JsValue::from_str(&format!("序列化视图失败: {}", e)))
    }
}
