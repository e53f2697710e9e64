use crate::cli::Cli;
use crate::commands::{create_connector, spinner, Result};
use crate::output::{format_output, OutputData};
use sra_core::connectors::sra::ContentWindow;
use tracing::debug;

pub async fn run(
    cli: &Cli,
    url: &str,
    max_length: i64,
    start_index: i64,
    all: bool,
) -> Result<()> {
    let connector = create_connector()?;

    let progress = spinner(format!("Reading {}...", url));
    let window = match connector.read_content(url, max_length, start_index).await {
        Ok(first) if all => {
            read_rest(first, |next| connector.read_content(url, max_length, next)).await
        }
        other => other,
    };
    progress.finish_and_clear();

    format_output(&OutputData::Content(window?), &cli.output)
}

/// Follow `next_start_index` until the document is exhausted, merging the
/// windows into one.
async fn read_rest<F, Fut>(
    mut merged: ContentWindow,
    mut read: F,
) -> std::result::Result<ContentWindow, sra_core::ConnectorError>
where
    F: FnMut(i64) -> Fut,
    Fut: std::future::Future<Output = std::result::Result<ContentWindow, sra_core::ConnectorError>>,
{
    while let Some(next) = merged.next_start_index {
        debug!(next, total = merged.total_length, "reading next window");
        let page = read(next as i64).await?;
        merged.content.push_str(&page.content);
        merged.next_start_index = page.next_start_index;
    }
    Ok(merged)
}
