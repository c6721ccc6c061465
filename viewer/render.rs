/// Page renderer for the viewer.
///
/// A single HTML template (`viewer/assets/viewer.html`) with `{{TOKEN}}`
/// placeholders is loaded at compile time; `render_page` substitutes them.

const TEMPLATE: &str = include_str!("assets/viewer.html");

pub fn render_page(status: &str, input: &str, prediction: &str) -> String {
    let html = TEMPLATE
        .replace("{{STATUS}}", &html_escape(status))
        .replace("{{INPUT}}", &html_escape(input))
        .replace("{{PREDICTION}}", &html_escape(prediction));
    blank_remaining(html)
}

/// Replaces any `{{TOKEN}}` that wasn't substituted with an empty string.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        if let Some(end) = html[start..].find("}}") {
            let abs_end = start + end + 2;
            html.replace_range(start..abs_end, "");
        } else {
            break;
        }
    }
    html
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
