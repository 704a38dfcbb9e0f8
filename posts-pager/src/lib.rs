use log::LevelFilter;
use wasm_bindgen::prelude::*;

// 导出模块
pub mod builder;
pub mod config;
pub mod dom;
pub mod error;
pub mod logger;
pub mod pager;
pub mod render;
pub mod setting;

pub use config::PagerConfig;
pub use dom::PostsPagerJS;
pub use error::PagerError;
pub use pager::{PageView, PostsPager};
pub use setting::{CookieStore, Expiry, MemoryStore, PersistedSetting, SettingStore};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// 初始化函数 - 设置错误处理和控制台日志
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logger::init(LevelFilter::Info);
}

/// 版本信息
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
