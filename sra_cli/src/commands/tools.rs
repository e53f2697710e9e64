use crate::cli::Cli;
use crate::commands::{create_connector, Result};
use crate::output::{format_output, OutputData, ToolSummary};
use sra_core::{Connector, Tool};

pub async fn run(cli: &Cli) -> Result<()> {
    let connector = create_connector()?;
    let tools = connector.list_tools(None).await?.tools;
    let summaries = tools.iter().map(summarize).collect();
    format_output(&OutputData::ToolsList(summaries), &cli.output)
}

/// Argument names from the input schema, required ones first.
fn summarize(tool: &Tool) -> ToolSummary {
    let required: Vec<String> = tool
        .input_schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|r| r.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    let mut arguments = required.clone();
    if let Some(properties) = tool.input_schema.get("properties").and_then(|p| p.as_object()) {
        arguments.extend(
            properties
                .keys()
                .filter(|k| !required.contains(k))
                .map(|k| format!("[{}]", k)),
        );
    }

    ToolSummary {
        name: tool.name.to_string(),
        title: tool.title.clone(),
        description: tool
            .description
            .as_deref()
            .unwrap_or_default()
            .to_string(),
        arguments,
    }
}
