use crate::cli::Cli;
use crate::commands::{create_connector, spinner, Result};
use crate::output::{format_output, OutputData, RecommendationBatch};
use tracing::warn;

pub async fn run(cli: &Cli, urls: &[String], limit: i64) -> Result<()> {
    let connector = create_connector()?;

    let progress = spinner(format!("Fetching recommendations for {} page(s)...", urls.len()));
    let batches = connector.recommend_many(urls, limit).await;
    progress.finish_and_clear();

    let batches: Vec<RecommendationBatch> = batches?
        .into_iter()
        .map(|(url, result)| match result {
            Ok(recommendations) => RecommendationBatch {
                url,
                recommendations,
                error: None,
            },
            Err(e) => {
                warn!(%url, error = %e, "recommendations failed");
                RecommendationBatch {
                    url,
                    recommendations: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        })
        .collect();

    format_output(&OutputData::Recommendations(batches), &cli.output)
}
