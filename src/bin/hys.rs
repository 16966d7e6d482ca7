use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use hys_feedback::cli::{
    run_compare, run_download, run_fetch, run_organize, CompareCommandConfig,
    DownloadCommandConfig, FetchCommandConfig, OrganizeCommandConfig, OrganizeStrategy,
};
use hys_feedback::logging::init_tracing;
use hys_feedback::util::env;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hys", version, about = "Have Your Say consultation feedback tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Fetch all feedback for a publication and write the normalized tables
    Fetch {
        /// Consultation publication id
        #[arg(long)]
        publication_id: i64,
        /// Output directory
        #[arg(long, default_value = "data")]
        out: PathBuf,
        /// Items per page (defaults to HYS_PAGE_SIZE or 100)
        #[arg(long)]
        page_size: Option<u32>,
        /// Language code passed to the API
        #[arg(long, default_value = "EN")]
        language: String,
        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u32>,
        /// Override the portal base URL
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Download the attachments listed in an attachments.csv
    Download {
        #[arg(long)]
        attachments_csv: PathBuf,
        /// Directory to save files into
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = "EN")]
        language: String,
        /// Comma-separated userType values to keep
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// Download again even when the file already exists
        #[arg(long, default_value_t = false)]
        no_skip_existing: bool,
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Sort downloaded attachments into one directory per userType
    Organize {
        #[arg(long)]
        attachments_dir: PathBuf,
        #[arg(long)]
        feedback_csv: PathBuf,
        /// Needed by the table strategy
        #[arg(long)]
        attachments_csv: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        /// Comma-separated userType values to keep
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// Move files instead of copying them
        #[arg(long = "move", default_value_t = false)]
        move_files: bool,
        #[arg(long, value_enum, default_value_t = OrganizeStrategy::Table)]
        strategy: OrganizeStrategy,
    },
    /// Compare two snapshots of feedback.csv / attachments.csv
    Compare {
        #[arg(long)]
        feedback_1: PathBuf,
        #[arg(long)]
        feedback_2: PathBuf,
        #[arg(long)]
        attachments_1: PathBuf,
        #[arg(long)]
        attachments_2: PathBuf,
        #[arg(long, default_value = "Phase 1")]
        label_1: String,
        #[arg(long, default_value = "Phase 2")]
        label_2: String,
        /// Write up to 50 exclusive ids per side to this CSV
        #[arg(long)]
        output_csv: Option<PathBuf>,
        /// Write the full comparison as JSON
        #[arg(long)]
        json_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing("info")?;
    env::bootstrap_cli("hys");

    if env::env_flag("HYS_LIST_SUBCOMMANDS", false) {
        let names: Vec<String> = Cli::command()
            .get_subcommands()
            .map(|cmd| cmd.get_name().to_string())
            .collect();
        eprintln!("available subcommands: {:?}", names);
        return Ok(());
    }

    let cli = Cli::parse();
    env::preflight_check(
        "hys",
        &[],
        &[
            "HYS_BASE_URL",
            "HYS_TIMEOUT_SECS",
            "HYS_DOWNLOAD_TIMEOUT_SECS",
            "HYS_RETRY_ATTEMPTS",
            "HYS_RETRY_BASE_DELAY_MS",
        ],
    )?;

    match cli.command {
        Commands::Fetch {
            publication_id,
            out,
            page_size,
            language,
            max_pages,
            base_url,
        } => {
            let summary = run_fetch(FetchCommandConfig {
                publication_id,
                out_dir: out.clone(),
                page_size: page_size.unwrap_or_else(|| env::env_parse("HYS_PAGE_SIZE", 100)),
                language,
                max_pages,
                base_url,
            })
            .await?;
            println!(
                "Fetched {} feedback entries ({} attachments) into {}",
                summary.feedback_rows,
                summary.attachment_rows,
                out.display()
            );
        }
        Commands::Download {
            attachments_csv,
            out,
            language,
            only,
            no_skip_existing,
            base_url,
        } => {
            let summary = run_download(DownloadCommandConfig {
                attachments_csv,
                out_dir: out,
                language,
                only_user_types: only,
                skip_existing: !no_skip_existing,
                base_url,
            })
            .await?;
            println!("Downloaded: {}, Failed: {}", summary.downloaded, summary.failed);
        }
        Commands::Organize {
            attachments_dir,
            feedback_csv,
            attachments_csv,
            out,
            only,
            move_files,
            strategy,
        } => {
            let organized = run_organize(OrganizeCommandConfig {
                attachments_dir,
                feedback_csv,
                attachments_csv,
                out_dir: out.clone(),
                only_user_types: only,
                move_files,
                strategy,
            })?;
            println!("Organized {} files into {}", organized, out.display());
        }
        Commands::Compare {
            feedback_1,
            feedback_2,
            attachments_1,
            attachments_2,
            label_1,
            label_2,
            output_csv,
            json_out,
        } => {
            let report = run_compare(CompareCommandConfig {
                feedback_1,
                feedback_2,
                attachments_1,
                attachments_2,
                label_1,
                label_2,
                output_csv,
                json_out,
            })?;
            println!("{report}");
        }
    }

    info!("hys: done");
    Ok(())
}
