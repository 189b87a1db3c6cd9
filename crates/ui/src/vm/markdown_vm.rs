use std::collections::{HashMap, HashSet};

/// Render question markdown to sanitized HTML.
#[must_use]
pub fn markdown_to_html(input: &str) -> String {
    let mut options = pulldown_cmark::Options::empty();
    options.insert(pulldown_cmark::Options::ENABLE_STRIKETHROUGH);
    options.insert(pulldown_cmark::Options::ENABLE_TABLES);
    options.insert(pulldown_cmark::Options::ENABLE_TASKLISTS);

    let parser = pulldown_cmark::Parser::new_ext(input, options);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    sanitize_html(&html)
}

#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "div", "span", "br", "em", "strong", "b", "i", "del", "code", "pre", "blockquote",
        "ul", "ol", "li", "a", "h1", "h2", "h3", "h4", "table", "thead", "tbody", "tr", "th",
        "td",
    ]
    .into_iter()
    .collect();

    let mut attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    attributes.insert("a", ["href"].into_iter().collect());

    ammonia::Builder::new()
        .tags(tags)
        .tag_attributes(attributes)
        .clean(html)
        .to_string()
}

/// Turn rendered card HTML back into plain markdown for text-only frontends.
#[must_use]
pub fn html_to_markdown(html: &str) -> String {
    let markdown = html2md::parse_html(html);
    collapse_blank_lines(&markdown)
}

fn collapse_blank_lines(input: &str) -> String {
    let input = input.replace("\r\n", "\n").replace('\r', "\n");
    let mut output = String::with_capacity(input.len());
    let mut previous_blank = true;
    for line in input.split('\n').map(str::trim_end) {
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        output.push_str(line);
        output.push('\n');
        previous_blank = blank;
    }
    output.truncate(output.trim_end().len());
    output
}

/// Markdown for a single line such as a choice label, without the wrapping paragraph.
#[must_use]
pub fn inline_markdown_to_html(input: &str) -> String {
    let html = markdown_to_html(input);
    let trimmed = html.trim();
    trimmed
        .strip_prefix("<p>")
        .and_then(|inner| inner.strip_suffix("</p>"))
        .filter(|inner| !inner.contains("<p>"))
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{html_to_markdown, inline_markdown_to_html, markdown_to_html, sanitize_html};

    #[test]
    fn markdown_to_html_sanitizes_links() {
        let html = markdown_to_html("[Link](javascript:alert(1))");
        assert!(html.contains("Link"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn markdown_renders_emphasis_and_code() {
        let html = markdown_to_html("Pick the **correct** `flex` property");
        assert_eq!(
            html.trim(),
            "<p>Pick the <strong>correct</strong> <code>flex</code> property</p>"
        );
    }

    #[test]
    fn sanitize_strips_scripts() {
        let html = sanitize_html("<p>ok</p><script>alert(1)</script>");
        assert_eq!(html, "<p>ok</p>");
    }

    #[test]
    fn inline_markdown_drops_paragraph() {
        assert_eq!(
            inline_markdown_to_html("`justify-content`"),
            "<code>justify-content</code>"
        );
        assert_eq!(inline_markdown_to_html("a\n\nb"), "<p>a</p>\n<p>b</p>");
    }

    #[test]
    fn html_to_markdown_collapses_blank_lines() {
        assert_eq!(
            html_to_markdown("<p>Hello</p>\r\n<p>World</p>"),
            "Hello\n\nWorld"
        );
        assert_eq!(html_to_markdown(""), "");
    }
}
