use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sra")]
#[command(about = "Search and read AWS Security Reference Architecture content")]
#[command(version)]
#[command(after_help = "\x1b[1;36mExamples:\x1b[0m
  sra search \"multi-account logging\"          Search docs and the SRA GitHub repos
  sra read https://docs.aws.amazon.com/prescriptive-guidance/latest/security-reference-architecture/welcome.html
  sra read <url> --start-index 5000           Continue a truncated page
  sra recommend <url> <url>                   Related content for one or more pages
  sra tools                                   List the MCP tools

\x1b[1;36mEnvironment:\x1b[0m
  GITHUB_TOKEN                                Enables GitHub code search
  RUST_LOG                                    Log filter (logs go to stderr)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Verbose logging (-v for all crates at info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search SRA documentation and GitHub content
    Search {
        /// Search phrase
        query: String,

        /// Maximum number of results (1-50)
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },

    /// Read a documentation page, GitHub file, issue or pull request as markdown
    Read {
        /// URL on docs.aws.amazon.com or github.com
        url: String,

        /// Maximum characters to return
        #[arg(long, default_value_t = 5000)]
        max_length: i64,

        /// Character offset to start at
        #[arg(long, default_value_t = 0)]
        start_index: i64,

        /// Keep reading until the whole document has been fetched
        #[arg(long)]
        all: bool,
    },

    /// Recommend content related to documentation pages
    Recommend {
        /// One or more docs.aws.amazon.com URLs
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,

        /// Maximum recommendations per page (1-50)
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },

    /// List the tools the MCP server exposes
    Tools,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Plain text output
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_defaults() {
        let cli = Cli::try_parse_from(["sra", "search", "kms"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Pretty);
        match cli.command {
            Commands::Search { query, limit } => {
                assert_eq!(query, "kms");
                assert_eq!(limit, 10);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_global_output_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sra",
            "read",
            "https://docs.aws.amazon.com/a.html",
            "--start-index",
            "5000",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Read {
                max_length,
                start_index,
                all,
                ..
            } => {
                assert_eq!(max_length, 5000);
                assert_eq!(start_index, 5000);
                assert!(!all);
            }
            _ => panic!("expected read"),
        }
    }

    #[test]
    fn test_recommend_needs_a_url() {
        assert!(Cli::try_parse_from(["sra", "recommend"]).is_err());
        let cli = Cli::try_parse_from(["sra", "recommend", "a", "b", "-l", "3"]).unwrap();
        match cli.command {
            Commands::Recommend { urls, limit } => {
                assert_eq!(urls, vec!["a", "b"]);
                assert_eq!(limit, 3);
            }
            _ => panic!("expected recommend"),
        }
    }
}
