//! Visible-text extraction from HTML documents, built on `scraper`.

use scraper::{ElementRef, Html, Selector};

/// Elements whose contents a reader never sees.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that visually separate their content from neighbours.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Extract the visible text of an HTML document's `<body>`.
///
/// Script and style subtrees are skipped, runs of whitespace collapse to a
/// single space and the result is trimmed. Returns an empty string when the
/// document has no body or the body has no text.
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };

    let Some(body) = document.select(&selector).next() else {
        return String::new();
    };

    let mut raw = String::with_capacity(html.len() / 2);
    push_visible_text(body, &mut raw);
    collapse_whitespace(&raw)
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if HIDDEN_ELEMENTS.contains(&name) {
                continue;
            }
            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                out.push(' ');
            }
            push_visible_text(child_el, out);
            if block {
                out.push(' ');
            }
        }
    }
}

/// Collapse every whitespace run to one space and trim both ends.
pub fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space && !buf.is_empty() {
                buf.push(' ');
            }
            last_space = true;
        } else {
            buf.push(ch);
            last_space = false;
        }
    }
    buf.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style() {
        let html = r#"
            <html>
              <head><title>Title</title><style>body { color: red; }</style></head>
              <body>
                <script>var x = 1;</script>
                <h1>Climate   policy</h1>
                <p>Carbon pricing is spreading.</p>
                <style>.hidden {}</style>
                <noscript>Enable JS</noscript>
              </body>
            </html>"#;
        let text = extract_visible_text(html);
        assert_eq!(text, "Climate policy Carbon pricing is spreading.");
    }

    #[test]
    fn head_text_is_excluded() {
        let html = "<html><head><title>Only title</title></head><body><p>Body</p></body></html>";
        assert_eq!(extract_visible_text(html), "Body");
    }

    #[test]
    fn inline_elements_do_not_split_words() {
        let html = "<body><p>Rust<b>acean</b> crabs</p></body>";
        assert_eq!(extract_visible_text(html), "Rustacean crabs");
    }

    #[test]
    fn block_elements_are_separated() {
        let html = "<body><div>One</div><div>Two</div><ul><li>Three</li></ul></body>";
        assert_eq!(extract_visible_text(html), "One Two Three");
    }

    #[test]
    fn empty_body_is_empty_string() {
        assert_eq!(extract_visible_text("<html><body>   </body></html>"), "");
        assert_eq!(extract_visible_text(""), "");
    }

    #[test]
    fn collapse_whitespace_trims() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }
}
