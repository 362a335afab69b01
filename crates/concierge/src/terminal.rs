//! Renders display markup as ANSI-styled terminal text.

use concierge_core::surface::{Notification, NotificationKind};
use concierge_core::transcript::{DisplayMessage, Sender};
use owo_colors::OwoColorize;

/// The bar drawn at the start of every transcript line.
pub const BAR_CHAR: &str = "▎";

const BULLET: &str = "• ";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Emphasis {
    Plain,
    Bold,
    Amount,
}

/// Renders markup into styled text.
///
/// Line breaks become newlines and list items get a bullet. Error messages
/// are drawn in red. Unknown tags are printed as they are.
pub fn render_markup(markup: &str, is_error: bool) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut emphasis = Vec::new();
    let mut rest = markup;

    while !rest.is_empty() {
        let (text, tail) = rest.split_at(rest.find('<').unwrap_or(rest.len()));
        let current = emphasis.last().copied().unwrap_or(Emphasis::Plain);
        push_text(&mut out, &unescape(text), current, is_error);

        let Some(end) = tail.find('>') else {
            push_text(&mut out, tail, current, is_error);
            break;
        };
        match &tail[1..end] {
            "br" => out.push('\n'),
            "li" => out.push_str(BULLET),
            "ul" | "/ul" | "/li" => {}
            "/strong" => {
                emphasis.pop();
            }
            "strong" => emphasis.push(Emphasis::Bold),
            tag if tag.starts_with("strong ") => emphasis.push(Emphasis::Amount),
            _ => push_text(&mut out, &tail[..=end], current, is_error),
        }
        rest = &tail[end + 1..];
    }
    out
}

fn push_text(out: &mut String, text: &str, emphasis: Emphasis, is_error: bool) {
    if text.is_empty() {
        return;
    }
    let styled = match (emphasis, is_error) {
        (Emphasis::Plain, false) => {
            out.push_str(text);
            return;
        }
        (Emphasis::Plain, true) => text.red().to_string(),
        (Emphasis::Bold, false) => text.bold().to_string(),
        (Emphasis::Bold, true) => text.red().bold().to_string(),
        (Emphasis::Amount, _) => text.green().bold().to_string(),
    };
    out.push_str(&styled);
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Renders a transcript message with its sender mark.
pub fn render_message(msg: &DisplayMessage) -> String {
    let (bar, icon) = match msg.sender() {
        Sender::User => (BAR_CHAR.bright_green().to_string(), "🧑"),
        Sender::Bot => (BAR_CHAR.bright_cyan().to_string(), "🤖"),
    };
    let body = render_markup(msg.body(), msg.is_error());

    let mut lines = body.split('\n');
    let mut out = format!("{bar}{icon} {}", lines.next().unwrap_or_default());
    for line in lines {
        out.push('\n');
        out.push_str(&bar);
        out.push_str("   ");
        out.push_str(line);
    }
    out
}

/// Renders a notification as a single line.
pub fn render_notification(notification: &Notification) -> String {
    let message = notification.message.as_str();
    match notification.kind {
        NotificationKind::Success => format!("✅ {}", message.green()),
        NotificationKind::Error => format!("⚠️  {}", message.bright_yellow()),
        NotificationKind::Info => format!("💡 {}", message.bright_blue()),
    }
}

#[cfg(test)]
mod tests {
    use concierge_core::formatter::format;

    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(render_markup("", false), "");
        assert_eq!(render_markup("Hello", false), "Hello");
        assert_eq!(
            render_markup(&format("Hello\nworld"), false),
            "Hello\nworld"
        );
    }

    #[test]
    fn test_entities_are_unescaped() {
        assert_eq!(
            render_markup(&format("a < b && c > d"), false),
            "a < b && c > d"
        );
        assert_eq!(render_markup("&amp;lt;", false), "&lt;");
    }

    #[test]
    fn test_bold_and_amounts() {
        assert_eq!(
            render_markup(&format("**Total**: $12.34"), false),
            format!("{}: {}", "Total".bold(), "$12.34".green().bold())
        );
    }

    #[test]
    fn test_list_items() {
        assert_eq!(
            render_markup(&format("- Food\n- Rent"), false),
            "• Food\n- Rent"
        );
    }

    #[test]
    fn test_error_text_is_red() {
        assert_eq!(
            render_markup("Oops", true),
            "Oops".red().to_string()
        );
    }

    #[test]
    fn test_unknown_tags_are_kept() {
        assert_eq!(render_markup("<em>hi", false), "<em>hi");
        assert_eq!(render_markup("a < b", false), "a < b");
    }

    #[test]
    fn test_message_lines_are_indented() {
        let msg = DisplayMessage::bot("one\ntwo");
        let bar = BAR_CHAR.bright_cyan().to_string();
        assert_eq!(
            render_message(&msg),
            format!("{bar}🤖 one\n{bar}   two")
        );
    }
}
