use utils_common::PostRecord;

/// 每篇文章外层容器的 class
pub const POST_CONTAINER_CLASS: &str = "row my-2";

/// 渲染文章摘要卡片
pub fn render_post(post: &PostRecord, sources_prefix: &str) -> String {
    let mut html = String::with_capacity(1024);
    html.push_str(r#"<div class="container-fluid"><div class="card bg-secondary w-80"><div class="card-body">"#);
    html.push_str(&format!(r#"<h5 class="card-title">{}</h5>"#, escape_html(&post.title)));

    // 分类、日期和标签
    html.push_str(r#"<h6 class="card-subtitle mb-2 text-muted"><div class="row"><div class="col">"#);
    html.push_str(&format!(
        r#"<span class="badge badge-pill badge-success px-3">{}</span>"#,
        escape_html(&post.category)
    ));
    html.push_str(&format!("<span>{}</span>", escape_html(&post.date)));
    html.push_str(r#"</div><div class="col"><span class="pl-3">Tags:&nbsp;</span>"#);
    for tag in &post.tags {
        html.push_str(&format!(
            r#"<span class="badge badge-pill badge-info">{}</span>"#,
            escape_html(tag)
        ));
    }
    html.push_str("</div></div></h6>");

    html.push_str(&format!(r#"<p class="card-text">{}</p>"#, escape_html(&post.summary)));

    // 全文和源文件链接
    html.push_str(r#"<div class="row"><div class="col text-right">"#);
    html.push_str(&format!(
        r#"<a href="{}" class="card-link">Full Post</a>"#,
        escape_html(&post.html)
    ));
    html.push_str(r#"</div><div class="col text-right">"#);
    html.push_str(&format!(
        r#"<a href="{}{}" class="card-link">Source</a>"#,
        escape_html(sources_prefix),
        escape_html(&post.source)
    ));
    html.push_str("</div></div></div></div></div>");
    html
}

/// 转义 HTML 特殊字符
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> PostRecord {
        PostRecord {
            title: "Fish & Chips".to_string(),
            date: "2019-05-21 20:00".to_string(),
            category: "food".to_string(),
            tags: vec!["uk".to_string(), "<script>".to_string()],
            summary: "Crispy.".to_string(),
            html: "blog/fish.html".to_string(),
            source: "blog/fish.rst".to_string(),
        }
    }

    #[test]
    fn renders_card_fields() {
        let html = render_post(&post(), "./sources/");
        assert!(html.contains(r#"<h5 class="card-title">Fish &amp; Chips</h5>"#));
        assert!(html.contains(r#"badge-success px-3">food</span>"#));
        assert!(html.contains("<span>2019-05-21 20:00</span>"));
        assert!(html.contains(r#"<p class="card-text">Crispy.</p>"#));
        assert!(html.contains(r#"<a href="blog/fish.html" class="card-link">Full Post</a>"#));
        assert!(html.contains(r#"<a href="./sources/blog/fish.rst" class="card-link">Source</a>"#));
    }

    #[test]
    fn renders_one_badge_per_tag() {
        let html = render_post(&post(), "");
        assert_eq!(html.matches("badge-info").count(), 2);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn escapes_quotes() {
        assert_eq!(escape_html(r#"a"b'c"#), "a&quot;b&#39;c");
    }
}
