//! Pretty formatter for terminal output.
//!
//! Cards for results: bold title, linked URL, dimmed excerpt or context.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use sra_core::connectors::sra::{ContentWindow, RecommendationResult, SearchResult};

use super::{OutputData, RecommendationBatch, ToolSummary};

const DEFAULT_WIDTH: usize = 80;

/// Excerpts longer than this are cut on a character boundary.
const SNIPPET_CHARS: usize = 240;

pub fn format_pretty(data: &OutputData) -> String {
    let width = terminal_width();
    match data {
        OutputData::SearchResults { query, results } => format_search(query, results, width),
        OutputData::Content(window) => format_content(window, width),
        OutputData::Recommendations(batches) => batches
            .iter()
            .map(|b| format_recommendations(b, width))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputData::ToolsList(tools) => format_tools(tools, width),
    }
}

fn format_search(query: &str, results: &[SearchResult], width: usize) -> String {
    let mut output = format_section_header(&format!("\"{}\"", query), Some(results.len()), width);
    output.push('\n');
    if results.is_empty() {
        output.push_str(&format!("      {}\n", "No results found.".dimmed()));
        return output;
    }
    for result in results {
        output.push('\n');
        output.push_str(&format_card(
            result.rank_order,
            &result.title,
            &result.url,
            result.excerpt.as_deref(),
        ));
    }
    output
}

fn format_card(index: usize, title: &str, url: &str, snippet: Option<&str>) -> String {
    let mut output = String::new();
    let index_str = if index > 0 {
        format!(" {:>3}. ", index).cyan().bold().to_string()
    } else {
        "      ".to_string()
    };
    output.push_str(&format!("{}{}\n", index_str, title.bold()));
    output.push_str(&format!("      {}\n", format_hyperlink(url, url).blue()));
    if let Some(s) = snippet {
        let clean = truncate_str(&clean_snippet(s), SNIPPET_CHARS);
        if !clean.is_empty() {
            output.push_str(&format!("      {}\n", clean.dimmed()));
        }
    }
    output
}

fn format_content(window: &ContentWindow, width: usize) -> String {
    let mut output = format_section_header(window.kind.label(), None, width);
    output.push('\n');
    output.push_str(&format!("{}\n\n", format_hyperlink(&window.url, &window.url).blue()));

    if window.content.is_empty() {
        output.push_str(&format!("{}\n", "No more content available.".dimmed()));
        return output;
    }
    output.push_str(&window.content);
    output.push('\n');

    let end = window.start_index + window.content.chars().count();
    let position = format!(
        "characters {}-{} of {}",
        window.start_index, end, window.total_length
    );
    output.push('\n');
    match window.next_start_index {
        Some(next) => output.push_str(&format!(
            "{}  {}\n",
            position.dimmed(),
            format!("continue with --start-index {}", next).yellow()
        )),
        None => output.push_str(&format!("{}\n", position.dimmed())),
    }
    output
}

fn format_recommendations(batch: &RecommendationBatch, width: usize) -> String {
    let mut output = format_section_header(
        &batch.url,
        batch.error.is_none().then_some(batch.recommendations.len()),
        width,
    );
    output.push('\n');
    if let Some(error) = &batch.error {
        output.push_str(&format!("      {}: {}\n", "Error".red().bold(), error));
        return output;
    }
    if batch.recommendations.is_empty() {
        output.push_str(&format!("      {}\n", "No recommendations found.".dimmed()));
        return output;
    }
    for (i, rec) in batch.recommendations.iter().enumerate() {
        output.push('\n');
        output.push_str(&format_recommendation(i + 1, rec));
    }
    output
}

fn format_recommendation(index: usize, rec: &RecommendationResult) -> String {
    format_card(index, &rec.title, &rec.url, rec.context.as_deref())
}

fn format_tools(tools: &[ToolSummary], width: usize) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(width.min(u16::MAX as usize) as u16)
        .set_header(vec!["Tool", "Arguments", "Description"]);
    for tool in tools {
        table.add_row(vec![
            Cell::new(&tool.name),
            Cell::new(tool.arguments.join(", ")),
            Cell::new(truncate_str(&tool.description, 160)),
        ]);
    }
    table.to_string()
}

fn format_section_header(label: &str, count: Option<usize>, width: usize) -> String {
    let count_str = match count {
        Some(n) => format!(" ({} results)", n),
        None => String::new(),
    };

    let header_text = format!("{}{}", label, count_str);
    let line_len = (width.saturating_sub(header_text.chars().count() + 4)).min(60);
    let line = "─".repeat(line_len);

    format!(
        "{} {} {}",
        "──".cyan(),
        header_text.green().bold(),
        line.cyan()
    )
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn clean_snippet(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// OSC 8 hyperlink, BEL-terminated.
fn format_hyperlink(url: &str, display_text: &str) -> String {
    format!("\x1b]8;;{}\x07{}\x1b]8;;\x07", url, display_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sra_core::connectors::sra::ContentKind;

    #[test]
    fn test_format_card() {
        let output = format_card(
            1,
            "Security Tooling account",
            "https://docs.aws.amazon.com/security-tooling.html",
            Some("Delegated\n  administrator"),
        );
        assert!(output.contains("Security Tooling account"));
        assert!(output.contains("security-tooling.html"));
        assert!(output.contains("Delegated administrator"));
    }

    #[test]
    fn test_truncate_str() {
        let long = "This is a very long string that should be truncated";
        let truncated = truncate_str(long, 20);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 20);
        assert_eq!(truncate_str("short", 20), "short");
    }

    #[test]
    fn test_format_section_header() {
        let header = format_section_header("\"kms\"", Some(10), 80);
        assert!(header.contains("kms"));
        assert!(header.contains("10 results"));
    }

    #[test]
    fn test_content_footer_points_at_next_window() {
        let window = ContentWindow {
            url: "https://docs.aws.amazon.com/a.html".into(),
            kind: ContentKind::Documentation,
            content: "abcde".into(),
            start_index: 0,
            total_length: 12,
            next_start_index: Some(5),
        };
        let output = format_content(&window, 80);
        assert!(output.contains("characters 0-5 of 12"));
        assert!(output.contains("--start-index 5"));
    }

    #[test]
    fn test_failed_batch_shows_error() {
        let batch = RecommendationBatch {
            url: "https://docs.aws.amazon.com/a.html".into(),
            recommendations: vec![],
            error: Some("recommendations returned status 500".into()),
        };
        let output = format_recommendations(&batch, 80);
        assert!(output.contains("status 500"));
        assert!(!output.contains("results)"));
    }
}
