//! HTML rendering for the translation form

use std::fmt::Write;

/// Everything the form page shows
#[derive(Debug, Clone, Copy)]
pub struct TranslatePage<'a> {
    /// Text as submitted, shown again in the textarea
    pub input_text: &'a str,
    /// Model output or the unavailable message
    pub translated_text: &'a str,
    /// Language pair keys, in the order they are listed
    pub languages: &'a [&'a str],
    /// Pair to pre-select in the dropdown
    pub selected: Option<&'a str>,
}

/// Turns a page model into a response body
pub trait PageRenderer: Send + Sync {
    /// Full HTML document for the page
    fn render(&self, page: &TranslatePage<'_>) -> String;
}

/// Built-in single-page HTML view
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    title: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new("Language Translator")
    }
}

impl HtmlRenderer {
    /// View with a custom page title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl PageRenderer for HtmlRenderer {
    fn render(&self, page: &TranslatePage<'_>) -> String {
        let mut options = String::new();
        for lang in page.languages {
            let selected = if page.selected == Some(*lang) { " selected" } else { "" };
            let lang = escape_html(lang);
            // Writing to a String cannot fail
            let _ = writeln!(
                options,
                r#"        <option value="{lang}"{selected}>{lang}</option>"#
            );
        }

        // Parsers drop one newline right after <textarea>, so one is always written
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <style>
    body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
    textarea {{ width: 100%; min-height: 8rem; }}
    .result {{ border: 1px solid #ccc; padding: 1rem; min-height: 4rem; white-space: pre-wrap; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <form method="post" action="/">
    <label for="input_text">Text</label>
    <textarea id="input_text" name="input_text">
{input_text}</textarea>
    <label for="dest_lang">Language pair</label>
    <select id="dest_lang" name="dest_lang">
{options}    </select>
    <button type="submit">Translate</button>
  </form>
  <h2>Translation</h2>
  <div class="result" id="translated_text">{translated_text}</div>
</body>
</html>
"#,
            title = escape_html(&self.title),
            input_text = escape_html(page.input_text),
            options = options,
            translated_text = escape_html(page.translated_text),
        )
    }
}

/// Escape text for element content and quoted attribute values
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
