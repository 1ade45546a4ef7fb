use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// One list line: `#id  time  title: description`, cut to `max_width` columns.
pub(crate) fn format_note_line(
    id: i64,
    display_time: &str,
    title: &str,
    description: &str,
    max_width: usize,
) -> String {
    if max_width == 0 {
        return String::new();
    }

    let prefix = format!("#{}  {}  ", id, display_time);
    let prefix_width = UnicodeWidthStr::width(prefix.as_str());
    if max_width <= prefix_width {
        return truncate_with_ellipsis(prefix.trim_end(), max_width);
    }

    let body = match (sanitize(title), sanitize(description)) {
        (title, description) if description.is_empty() => title,
        (title, description) if title.is_empty() => description,
        (title, description) => format!("{}: {}", title, description),
    };
    let body_width = max_width.saturating_sub(prefix_width);
    format!("{}{}", prefix, truncate_with_ellipsis(&body, body_width))
}

fn sanitize(content: &str) -> String {
    content
        .replace(['\n', '\r', '\t'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_with_ellipsis(value: &str, max_width: usize) -> String {
    let value_width = UnicodeWidthStr::width(value);
    if value_width <= max_width {
        return value.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let mut current_width = 0;
    let mut result = String::new();
    for ch in value.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
        if current_width + ch_width > max_width - 3 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("...");
    result
}
