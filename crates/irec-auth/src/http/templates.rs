//! Server-rendered HTML shared by the auth pages and the application views.

/// Shared CSS for every page.
const SHARED_STYLES: &str = r#"
:root {
    --brand-primary: #0a66c2;
    --brand-primary-dark: #004182;
    --danger: #c0392b;
    --surface: #f3f2ef;
    --card: #ffffff;
    --text-primary: #1d2226;
    --text-secondary: #5e6d77;
    --radius: 8px;
}

* { margin: 0; padding: 0; box-sizing: border-box; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: var(--surface);
    color: var(--text-primary);
    line-height: 1.5;
}

header {
    background: var(--card);
    border-bottom: 1px solid #e0dfdc;
    padding: 0.75rem 1.5rem;
    display: flex;
    align-items: center;
    justify-content: space-between;
}

header .user { display: flex; align-items: center; gap: 0.5rem; }
header img { width: 32px; height: 32px; border-radius: 50%; }

main { max-width: 760px; margin: 2rem auto; padding: 0 1rem; }

.card {
    background: var(--card);
    border-radius: var(--radius);
    box-shadow: 0 0 0 1px rgba(0, 0, 0, 0.08);
    padding: 1.5rem;
    margin-bottom: 1rem;
}

.card h2 { font-size: 1.25rem; margin-bottom: 0.25rem; }
.muted { color: var(--text-secondary); font-size: 0.875rem; }

.form-group { margin-bottom: 1rem; }
.form-label { display: block; font-weight: 600; margin-bottom: 0.25rem; }
.form-input {
    width: 100%;
    padding: 0.5rem 0.75rem;
    border: 1px solid #c9c9c9;
    border-radius: var(--radius);
}

.btn {
    display: inline-block;
    padding: 0.5rem 1.25rem;
    border: none;
    border-radius: 24px;
    font-weight: 600;
    cursor: pointer;
    text-decoration: none;
}
.btn-primary { background: var(--brand-primary); color: #fff; }
.btn-primary:hover { background: var(--brand-primary-dark); }

.error-title { color: var(--danger); font-size: 1.25rem; font-weight: 600; }
.error-code { font-family: monospace; color: var(--text-secondary); margin-top: 0.5rem; }
"#;

/// Base HTML template wrapper.
#[must_use]
pub fn html_page(title: &str, content: &str) -> String {
    let mut html = String::with_capacity(content.len() + 2000);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str("    <title>");
    html.push_str(&html_escape(title));
    html.push_str(" - irec</title>\n");
    html.push_str("    <style>");
    html.push_str(SHARED_STYLES);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(content);
    html.push_str("\n</body>\n</html>");
    html
}

/// Renders an error page.
///
/// # Arguments
///
/// * `title` - Short, user-facing summary
/// * `description` - Longer explanation
/// * `retry_href` - Optional link offered to try again
#[must_use]
pub fn render_error_page(title: &str, description: &str, retry_href: Option<&str>) -> String {
    let mut content = String::with_capacity(1024);

    content.push_str("<main>\n<div class=\"card\" style=\"text-align: center;\">\n");
    content.push_str("<div class=\"error-title\">");
    content.push_str(&html_escape(title));
    content.push_str("</div>\n<p class=\"muted\">");
    content.push_str(&html_escape(description));
    content.push_str("</p>\n");

    if let Some(href) = retry_href {
        content.push_str("<p style=\"margin-top: 1rem;\"><a class=\"btn btn-primary\" href=\"");
        content.push_str(&html_escape(href));
        content.push_str("\">Try again</a></p>\n");
    }
    content.push_str("</div>\n</main>");

    html_page("Error", &content)
}

/// Escapes text for HTML element content and attribute values.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_error_page_escapes_description() {
        let html = render_error_page("Login failed", "<script>alert(1)</script>", Some("/start"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("href=\"/start\""));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_error_page_without_retry() {
        let html = render_error_page("Error", "Something went wrong", None);
        assert!(!html.contains("Try again"));
    }
}
