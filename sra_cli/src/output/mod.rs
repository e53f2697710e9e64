use crate::cli::OutputFormat;
use crate::commands::Result;
use serde::Serialize;
use sra_core::connectors::sra::{ContentWindow, RecommendationResult, SearchResult};

mod pretty;

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationBatch {
    pub url: String,
    pub recommendations: Vec<RecommendationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OutputData {
    SearchResults {
        query: String,
        results: Vec<SearchResult>,
    },
    Content(ContentWindow),
    Recommendations(Vec<RecommendationBatch>),
    ToolsList(Vec<ToolSummary>),
}

pub fn format_output(data: &OutputData, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(data)?),
        OutputFormat::Text => println!("{}", format_text(data)),
        OutputFormat::Pretty => println!("{}", pretty::format_pretty(data)),
    }
    Ok(())
}

/// Uncolored rendering, one item per block.
pub fn format_text(data: &OutputData) -> String {
    match data {
        OutputData::SearchResults { query, results } => {
            let mut out = format!("Search results for '{}':", query);
            if results.is_empty() {
                out.push_str("\nNo results found.");
            }
            for r in results {
                out.push_str(&format!("\n\n{}. {}\n   {}", r.rank_order, r.title, r.url));
                if let Some(excerpt) = &r.excerpt {
                    out.push_str(&format!("\n   {}", excerpt));
                }
            }
            out
        }
        OutputData::Content(window) => sra_core::connectors::sra::window::render(window),
        OutputData::Recommendations(batches) => batches
            .iter()
            .map(|batch| {
                let mut out = format!("Recommendations for {}:", batch.url);
                if let Some(error) = &batch.error {
                    out.push_str(&format!("\n  error: {}", error));
                } else if batch.recommendations.is_empty() {
                    out.push_str("\n  No recommendations found.");
                }
                for r in &batch.recommendations {
                    out.push_str(&format!("\n- {} ({})", r.title, r.url));
                    if let Some(context) = &r.context {
                        out.push_str(&format!("\n  {}", context));
                    }
                }
                out
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
        OutputData::ToolsList(tools) => tools
            .iter()
            .map(|t| format!("{}\t{}\t{}", t.name, t.arguments.join(","), t.description))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
