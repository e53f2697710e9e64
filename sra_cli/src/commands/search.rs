use crate::cli::Cli;
use crate::commands::{create_connector, spinner, Result};
use crate::output::{format_output, OutputData};
use tracing::info;

pub async fn run(cli: &Cli, query: &str, limit: i64) -> Result<()> {
    let connector = create_connector()?;

    let progress = spinner(format!("Searching SRA content for '{}'...", query));
    let results = connector.search_content(query, limit).await;
    progress.finish_and_clear();
    let results = results?;

    info!(query, count = results.len(), "search complete");
    format_output(
        &OutputData::SearchResults {
            query: query.trim().to_string(),
            results,
        },
        &cli.output,
    )
}
