use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use clap::{Arg, ArgAction, Command};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use walkdir::WalkDir;

use posts_pager::builder::MetadataBuilder;
use utils_common::{parse_post_date, PostRecord};

/// 没有分类信息的文章归入此分类
const DEFAULT_CATEGORY: &str = "uncategorized";

/// 摘要最大字符数
const SUMMARY_LENGTH: usize = 200;

// 命令行参数定义
fn cli() -> Command {
    Command::new("文章元数据生成器")
        .version(env!("CARGO_PKG_VERSION"))
        .about("扫描已编译的文章HTML，生成分页器使用的元数据文档")
        .arg(Arg::new("source")
            .short('s')
            .long("source")
            .value_name("SOURCE_DIR")
            .help("文章HTML目录路径")
            .required(true))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .value_name("OUTPUT_FILE")
            .help("元数据JSON输出路径")
            .required(true))
        .arg(Arg::new("source_ext")
            .long("source-ext")
            .value_name("EXT")
            .help("文章源文件扩展名，用于生成源文件链接")
            .default_value("rst"))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("显示详细信息")
            .action(ArgAction::SetTrue))
}

// 主函数
fn main() {
    let matches = cli().get_matches();

    // 获取参数值；required 和 default_value 保证这些参数一定存在
    let source_dir = matches.get_one::<String>("source").cloned().unwrap_or_default();
    let output_file = matches.get_one::<String>("output").cloned().unwrap_or_default();
    let source_ext = matches.get_one::<String>("source_ext").cloned().unwrap_or_default();
    let verbose = matches.get_flag("verbose");

    // 检查目录
    let source_path = Path::new(&source_dir);
    if !source_path.exists() || !source_path.is_dir() {
        eprintln!("错误: 源目录不存在或不是有效目录 '{}'", source_dir);
        std::process::exit(1);
    }

    // 创建输出目录
    if let Some(parent) = Path::new(&output_file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("错误: 无法创建输出目录 '{}': {}", parent.display(), e);
                std::process::exit(1);
            }
        }
    }

    println!("开始生成元数据...");
    println!("源目录: {}", source_dir);
    println!("输出文件: {}", output_file);

    match generate_metadata(&source_dir, &output_file, &source_ext, verbose) {
        Ok(count) => println!("元数据生成成功，共 {} 篇文章！", count),
        Err(e) => {
            eprintln!("错误: 元数据生成失败: {}", e);
            std::process::exit(1);
        }
    }
}

// 生成元数据的主函数，返回收录的文章数量
fn generate_metadata(
    source_dir: &str,
    output_file: &str,
    source_ext: &str,
    verbose: bool,
) -> Result<usize, String> {
    let start_time = std::time::Instant::now();

    println!("扫描HTML文件...");
    let (posts, skipped_count) = scan_html_files(source_dir, source_ext, verbose)?;
    println!("扫描完成。找到 {} 篇文章，跳过 {} 个文件。", posts.len(), skipped_count);

    if posts.is_empty() {
        return Err("没有找到有效文章".to_string());
    }

    let mut builder = MetadataBuilder::new();
    for (id, post) in posts {
        if let Err(e) = builder.add_post(id, post) {
            if verbose {
                eprintln!("跳过: {}", e);
            }
        }
    }

    let count = builder.post_count();
    builder.save_metadata(output_file)?;

    let elapsed = start_time.elapsed();
    println!("元数据生成完成！耗时: {:.2}秒", elapsed.as_secs_f32());

    Ok(count)
}

// 扫描HTML文件并提取文章数据，返回文章列表和跳过的文件数
fn scan_html_files(
    dir_path: &str,
    source_ext: &str,
    verbose: bool,
) -> Result<(Vec<(String, PostRecord)>, usize), String> {
    let mut posts = Vec::new();
    let mut skipped = 0;
    let dir_path = Path::new(dir_path);

    for entry in WalkDir::new(dir_path).sort_by_file_name() {
        let entry = entry.map_err(|e| format!("遍历目录时出错: {}", e))?;

        // 只处理HTML文件
        if !entry.file_type().is_file() || entry.path().extension().map_or(true, |ext| ext != "html") {
            continue;
        }

        match extract_post_from_html(entry.path(), dir_path, source_ext) {
            Ok(Some(post)) => {
                if verbose {
                    println!("处理: {}", entry.path().display());
                }
                posts.push(post);
            }
            Ok(None) => {
                skipped += 1;
                if verbose {
                    println!("跳过非文章页面: {}", entry.path().display());
                }
            }
            Err(err) => {
                skipped += 1;
                if verbose {
                    eprintln!("解析文件时出错 {}: {}", entry.path().display(), err);
                }
            }
        }
    }

    Ok((posts, skipped))
}

// 从HTML文件中提取文章记录；缺少标题或日期的页面不是文章，返回 None
fn extract_post_from_html(
    file_path: &Path,
    base_dir: &Path,
    source_ext: &str,
) -> Result<Option<(String, PostRecord)>, String> {
    let html = fs::read_to_string(file_path)
        .map_err(|e| format!("无法读取文件 {}: {}", file_path.display(), e))?;

    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| format!("解析HTML时出错: {}", e))?;

    let meta_tags = extract_meta_tags(&dom.document);

    let title = find_element(&dom.document, "title")
        .or_else(|| find_element(&dom.document, "h1"))
        .map(|node| collapse_whitespace(&node_text(&node)))
        .unwrap_or_default();
    if title.is_empty() {
        return Ok(None);
    }

    // 日期 - 优先使用 date，其次 article:published_time
    let date = match meta_tags
        .get("date")
        .or_else(|| meta_tags.get("article:published_time"))
        .and_then(|value| parse_post_date(value))
    {
        Some(date) => date.format("%Y-%m-%d %H:%M").to_string(),
        None => return Ok(None),
    };

    // 相对路径作为文章ID
    let relative_path = file_path
        .strip_prefix(base_dir)
        .map_err(|_| "计算相对路径失败".to_string())?;
    let html_link = relative_path.to_string_lossy().replace('\\', "/");
    let id = relative_path
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/");

    let category = meta_tags
        .get("category")
        .or_else(|| meta_tags.get("article:section"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    // 标签 - keywords 和 article:tag 都以逗号分隔
    let mut tags: Vec<String> = ["keywords", "article:tag"]
        .iter()
        .filter_map(|key| meta_tags.get(*key))
        .flat_map(|value| value.split(','))
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();
    tags.sort();
    tags.dedup();

    // 摘要 - 优先使用 description，否则取第一段正文
    let summary = meta_tags
        .get("description")
        .or_else(|| meta_tags.get("summary"))
        .cloned()
        .or_else(|| find_element(&dom.document, "p").map(|node| node_text(&node)))
        .map(|text| truncate(&collapse_whitespace(&text), SUMMARY_LENGTH))
        .unwrap_or_default();

    let source = meta_tags
        .get("source")
        .cloned()
        .unwrap_or_else(|| format!("{}.{}", id, source_ext));

    let post = PostRecord {
        title,
        date,
        category,
        tags,
        summary,
        html: html_link,
        source,
    };
    Ok(Some((id, post)))
}

// 深度优先查找第一个指定名称的元素
fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { ref name, .. } = handle.data {
        if name.local.as_ref() == tag {
            return Some(handle.clone());
        }
    }
    for child in handle.children.borrow().iter() {
        if let Some(found) = find_element(child, tag) {
            return Some(found);
        }
    }
    None
}

// 提取节点下的全部文本
fn node_text(handle: &Handle) -> String {
    let mut text = String::new();
    collect_text(handle, &mut text);
    text
}

fn collect_text(handle: &Handle, text: &mut String) {
    if let NodeData::Text { ref contents } = handle.data {
        text.push_str(&contents.borrow());
    }
    for child in handle.children.borrow().iter() {
        collect_text(child, text);
    }
}

// 从DOM中提取 <meta name|property=... content=...>
fn extract_meta_tags(handle: &Handle) -> HashMap<String, String> {
    let mut meta_tags = HashMap::new();
    extract_meta_tags_internal(handle, &mut meta_tags);
    meta_tags
}

fn extract_meta_tags_internal(handle: &Handle, meta_tags: &mut HashMap<String, String>) {
    if let NodeData::Element { ref name, ref attrs, .. } = handle.data {
        if name.local.as_ref() == "meta" {
            let attrs = attrs.borrow();
            let attr = |key: &str| {
                attrs
                    .iter()
                    .find(|a| a.name.local.as_ref() == key)
                    .map(|a| a.value.to_string())
            };
            if let (Some(key), Some(content)) = (attr("name").or_else(|| attr("property")), attr("content")) {
                meta_tags.insert(key.to_lowercase(), content);
            }
        }
    }
    for child in handle.children.borrow().iter() {
        extract_meta_tags_internal(child, meta_tags);
    }
}

// 合并连续空白
fn collapse_whitespace(text: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("有效的正则表达式"));
    re.replace_all(text.trim(), " ").into_owned()
}

// 按字符截断，超出时追加省略号
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
