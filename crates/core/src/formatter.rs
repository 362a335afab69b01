//! Turns raw reply text into display markup.
//!
//! The markup is a small HTML subset: `<br>`, `<strong>`, `<ul>`/`<li>`
//! and an accented `<strong style=...>` for currency amounts. Everything
//! else in the input is escaped, so the output is safe to render.
//!
//! The rules run in a fixed order and later rules see the output of
//! earlier ones:
//!
//! 1. newlines become `<br>`;
//! 2. `**text**` becomes `<strong>text</strong>`;
//! 3. a line starting with `- ` becomes `<li>…</li>`;
//! 4. the list items are wrapped in `<ul>…</ul>`, once;
//! 5. `$12` and `$12.34` are highlighted.
//!
//! Newlines are gone by the time step 3 runs, so the whole text is one line:
//! only text starting with `- ` becomes an item, and the item keeps every
//! `<br>` up to the end. Emphasis spanning a line break therefore stays
//! nested inside the item. Unpaired `**` is left as is.

use std::sync::LazyLock;

use regex::Regex;

/// The marker every newline is turned into.
pub const LINE_BREAK: &str = "<br>";

const BOLD_REPLACEMENT: &str = "<strong>${1}</strong>";
const LIST_ITEM_REPLACEMENT: &str = "<li>${1}</li>";
const LIST_REPLACEMENT: &str = "<ul>${0}</ul>";
const CURRENCY_REPLACEMENT: &str =
    r#"<strong style="color: #10b981;">$$${1}</strong>"#;

static BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*(.*?)\*\*").expect("invalid bold pattern")
});

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^- (.+)$").expect("invalid list item pattern")
});

static LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<li>.*</li>").expect("invalid list pattern")
});

static CURRENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([0-9]+(?:\.[0-9]{2})?)").expect("invalid currency pattern")
});

/// Formats raw text into display markup.
pub fn format(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let escaped = escape_html(raw);
    let with_breaks = escaped.replace('\n', LINE_BREAK);
    let emphasized = BOLD.replace_all(&with_breaks, BOLD_REPLACEMENT);
    let itemized = LIST_ITEM.replace(&emphasized, LIST_ITEM_REPLACEMENT);
    // Items can only come from the rule above, the input is escaped.
    let listed = LIST.replace(&itemized, LIST_REPLACEMENT);
    CURRENCY
        .replace_all(&listed, CURRENCY_REPLACEMENT)
        .into_owned()
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCENT: &str = r#"<strong style="color: #10b981;">"#;

    #[test]
    fn test_empty_input() {
        assert_eq!(format(""), "");
    }

    #[test]
    fn test_plain_text_only_converts_line_breaks() {
        assert_eq!(format("Hello there"), "Hello there");
        assert_eq!(
            format("What's my balance?\nThanks!"),
            "What's my balance?<br>Thanks!"
        );
        assert_eq!(format("a\n\nb\n"), "a<br><br>b<br>");
    }

    #[test]
    fn test_bold_pairs() {
        assert_eq!(
            format("This is **important** and **urgent**"),
            "This is <strong>important</strong> and <strong>urgent</strong>"
        );
        let out = format("**x**");
        assert_eq!(out, "<strong>x</strong>");
        assert!(!out.contains('*'));
    }

    #[test]
    fn test_unpaired_bold_is_left_literally() {
        assert_eq!(
            format("**a** and **b"),
            "<strong>a</strong> and **b"
        );
    }

    #[test]
    fn test_list_item_runs_to_the_end() {
        assert_eq!(
            format("- Food\n- Rent\nThat's all."),
            "<ul><li>Food<br>- Rent<br>That's all.</li></ul>"
        );
    }

    #[test]
    fn test_dash_after_first_line_is_not_an_item() {
        assert_eq!(format("Intro:\n- a"), "Intro:<br>- a");
        assert_eq!(format("-x"), "-x");
    }

    #[test]
    fn test_dash_without_content_is_not_an_item() {
        assert_eq!(format("- "), "- ");
        assert_eq!(format("- \nnext"), "<ul><li><br>next</li></ul>");
    }

    #[test]
    fn test_bold_across_line_break_in_list_item() {
        assert_eq!(
            format("- **a\nb**"),
            "<ul><li><strong>a<br>b</strong></li></ul>"
        );
    }

    #[test]
    fn test_list_item_keeps_inline_markup() {
        assert_eq!(
            format("- **Food**: $40"),
            format!("<ul><li><strong>Food</strong>: {ACCENT}$40</strong></li></ul>")
        );
    }

    #[test]
    fn test_currency() {
        assert_eq!(format("$12"), format!("{ACCENT}$12</strong>"));
        assert_eq!(
            format("You spent $12.34 today"),
            format!("You spent {ACCENT}$12.34</strong> today")
        );
        // Only two decimals belong to the amount.
        assert_eq!(format("$1.234"), format!("{ACCENT}$1.23</strong>4"));
        // A single decimal isn't part of the amount either.
        assert_eq!(format("$5.5"), format!("{ACCENT}$5</strong>.5"));
        assert_eq!(format("$ 5 and $x"), "$ 5 and $x");
    }

    #[test]
    fn test_bold_currency() {
        assert_eq!(
            format("Balance: **$1500.00**"),
            format!("Balance: <strong>{ACCENT}$1500.00</strong></strong>")
        );
    }

    #[test]
    fn test_markup_in_input_is_escaped() {
        assert_eq!(
            format("<script>alert(1)</script> & <br>"),
            "&lt;script&gt;alert(1)&lt;/script&gt; &amp; &lt;br&gt;"
        );
    }

    #[test]
    fn test_ampersand_in_prose_is_escaped() {
        // Escaping is the one change plain prose goes through.
        assert_eq!(format("Q&A"), "Q&amp;A");
        assert_eq!(format("Q&A\nok"), "Q&amp;A<br>ok");
    }

    #[test]
    fn test_deterministic() {
        let raw = "**Summary**\n- Food: $40.50\n- Rent: $1200";
        assert_eq!(format(raw), format(raw));
    }
}
