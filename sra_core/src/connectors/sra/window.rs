use super::types::{ContentKind, ContentWindow};

/// Slice `[start_index, start_index + max_length)` out of `content`, counting
/// characters. Past the end the window is empty.
pub fn char_window(
    url: &str,
    kind: ContentKind,
    content: &str,
    start_index: usize,
    max_length: usize,
) -> ContentWindow {
    let total_length = content.chars().count();
    let window: String = content.chars().skip(start_index).take(max_length).collect();
    let end = start_index.saturating_add(window.chars().count());
    let next_start_index = (start_index < total_length && end < total_length).then_some(end);

    ContentWindow {
        url: url.to_string(),
        kind,
        content: window,
        start_index,
        total_length,
        next_start_index,
    }
}

/// Human-readable rendering with a continuation hint, for text-only clients.
pub fn render(window: &ContentWindow) -> String {
    let header = format!(
        "AWS Security Reference Architecture {} from {}:",
        window.kind.label(),
        window.url
    );
    if window.content.is_empty() {
        return format!("{header}\n\n<e>No more content available.</e>");
    }
    let mut out = format!("{header}\n\n{}", window.content);
    if let Some(next) = window.next_start_index {
        out.push_str(&format!(
            "\n\n<e>Content truncated. Call the read_content tool with start_index={next} to get more content.</e>"
        ));
    }
    out
}
