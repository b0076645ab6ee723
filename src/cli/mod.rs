pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{SourceInput, SourcePatch};
use crate::scraper::DEFAULT_PREVIEW_LIMIT;

#[derive(Parser)]
#[command(name = "feedwatch")]
#[command(about = "Watch RSS/Atom feeds and web pages, email digests of new items", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/feedwatch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check every due source now and send digests
    Run,
    /// Run checks periodically until interrupted
    Daemon {
        /// Check interval (e.g., "30s", "5m", "1h"); overrides the config file
        #[arg(short, long)]
        interval: Option<String>,

        /// Skip the run on start
        #[arg(long)]
        no_initial_run: bool,
    },
    /// Add a feed or scraped page
    Add(AddArgs),
    /// Change fields of an existing source
    Update(UpdateArgs),
    /// Remove a source
    Remove {
        /// Source id
        id: String,
    },
    /// List configured sources
    List {
        /// Print the stored records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the items a set of selectors would extract from a page
    Preview {
        /// Page URL
        url: String,

        #[arg(long)]
        title_selector: String,

        #[arg(long)]
        link_selector: String,

        #[arg(long)]
        description_selector: Option<String>,

        /// Number of items to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_PREVIEW_LIMIT)]
        limit: usize,
    },
    /// Delete expired entries from the store
    Purge,
}

#[derive(Args)]
pub struct AddArgs {
    /// Feed or page URL
    pub url: String,

    #[arg(long)]
    pub title: Option<String>,

    /// Sources sharing a group are sent in one digest
    #[arg(short, long)]
    pub group: Option<String>,

    /// Minutes between checks (default: 60)
    #[arg(short, long)]
    pub interval: Option<i64>,

    /// Prepended to every item link in digests
    #[arg(long)]
    pub link_prefix: Option<String>,

    /// Scrape the page with selectors instead of parsing a feed
    #[arg(long)]
    pub scrape: bool,

    #[arg(long, requires = "scrape")]
    pub title_selector: Option<String>,

    #[arg(long, requires = "scrape")]
    pub link_selector: Option<String>,

    #[arg(long, requires = "scrape")]
    pub description_selector: Option<String>,
}

impl From<AddArgs> for SourceInput {
    fn from(args: AddArgs) -> Self {
        Self {
            url: Some(args.url),
            title: args.title,
            group: args.group,
            interval_minutes: args.interval,
            link_prefix: args.link_prefix,
            scrape: args.scrape,
            title_selector: args.title_selector,
            link_selector: args.link_selector,
            description_selector: args.description_selector,
        }
    }
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Source id
    pub id: String,

    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    /// Empty string moves the source back to the default group
    #[arg(short, long)]
    pub group: Option<String>,

    #[arg(short, long)]
    pub interval: Option<i64>,

    #[arg(long)]
    pub link_prefix: Option<String>,

    /// Switch between scraping (true) and feed parsing (false)
    #[arg(long)]
    pub scrape: Option<bool>,

    #[arg(long)]
    pub title_selector: Option<String>,

    #[arg(long)]
    pub link_selector: Option<String>,

    #[arg(long)]
    pub description_selector: Option<String>,
}

impl From<UpdateArgs> for SourcePatch {
    fn from(args: UpdateArgs) -> Self {
        Self {
            url: args.url,
            title: args.title,
            group: args.group,
            interval_minutes: args.interval,
            link_prefix: args.link_prefix,
            scrape: args.scrape,
            title_selector: args.title_selector,
            link_selector: args.link_selector,
            description_selector: args.description_selector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_scrape() {
        let cli = Cli::parse_from([
            "feedwatch",
            "add",
            "https://example.com/news",
            "--scrape",
            "--title-selector",
            "h2",
            "--link-selector",
            "a.more",
            "--group",
            "tech",
        ]);
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        let input = SourceInput::from(args);
        assert!(input.scrape);
        assert_eq!(input.title_selector.as_deref(), Some("h2"));
        assert_eq!(input.group.as_deref(), Some("tech"));
    }

    #[test]
    fn test_parse_update_with_global_config() {
        let cli = Cli::parse_from([
            "feedwatch",
            "update",
            "abc",
            "--interval",
            "15",
            "--config",
            "/tmp/fw.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/fw.toml")));
        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };
        let patch = SourcePatch::from(args);
        assert_eq!(patch.interval_minutes, Some(15));
        assert!(patch.title.is_none());
    }

    #[test]
    fn test_selectors_require_scrape_flag() {
        let result = Cli::try_parse_from([
            "feedwatch",
            "add",
            "https://example.com",
            "--title-selector",
            "h2",
        ]);
        assert!(result.is_err());
    }
}
