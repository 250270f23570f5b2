use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::warn;

use ghra::{
    application::{
        BulkSelector, CreateOptions, DeleteOptions, DeleteRequest, DownloadOptions,
        DownloadRequest, ListOptions,
    },
    commands::{self, AssetSelection, config::Config, services},
    context::ExecutionContext,
    fetch::DEFAULT_ITEMS_PER_PAGE,
    github::{TagTarget, parse_release_id},
    runtime::RealRuntime,
    selection::{MatchMode, StateFilter},
};

const SIGINT: u8 = 2;
#[cfg(unix)]
const SIGTERM: u8 = 15;

/// ghra - GitHub Release Administration
///
/// List, create, delete and download GitHub releases and their assets.
/// Every command prints its result as JSON. Commands that change anything
/// run dry unless --no-dry-run is given.
///
/// GITHUB_TOKEN is used for authentication, GITHUB_REPOSITORY and
/// GITHUB_API_URL provide defaults for --repo and --api-url.
///
/// Examples:
///   ghra -R owner/repo list all
///   ghra create v1.2.0@main 'app-.*\.tar\.gz' --regex --dir dist --no-dry-run
///   ghra download latest app-linux.tar.gz --no-dry-run
#[derive(Parser, Debug)]
#[command(author, version = env!("GHRA_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output and dump the JSON of every release acted on
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The GitHub repository in the format "owner/repo"
    #[arg(short = 'R', long = "repo", value_name = "OWNER/REPO", global = true)]
    repo: Option<String>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List releases, stable ones unless a view is given
    List(ListArgs),

    /// Create a release and upload the matching files as assets
    Create(CreateArgs),

    /// Delete releases together with their tags
    Delete(DeleteArgs),

    /// Download one asset of a release
    Download(DownloadArgs),
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ListView {
    Draft,
    Prerelease,
    All,
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    /// Which releases to show besides stable ones
    #[arg(value_enum)]
    view: Option<ListView>,

    /// Only releases targeting this branch
    #[arg(long, value_name = "BRANCH")]
    branch: Option<String>,

    /// Only releases whose target is an existing branch or a commit on one
    #[arg(long)]
    branch_exists: bool,

    /// Stop after this many releases (0 for no limit)
    #[arg(long, value_name = "N", default_value_t = 0)]
    max: usize,

    /// Releases requested per page
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ITEMS_PER_PAGE)]
    per_page: u32,
}

impl ListArgs {
    fn options(&self) -> ListOptions {
        let state = match self.view {
            None => StateFilter::Stable,
            Some(ListView::Draft) => StateFilter::listing(true, false),
            Some(ListView::Prerelease) => StateFilter::listing(false, true),
            Some(ListView::All) => StateFilter::Any,
        };
        ListOptions {
            state,
            branch: self.branch.clone(),
            branch_exists: self.branch_exists,
            max_items: self.max,
            items_per_page: self.per_page,
        }
    }
}

#[derive(clap::Args, Debug)]
struct PatternArgs {
    /// Treat the name as a regular expression
    #[arg(long)]
    regex: bool,

    /// Treat the name as a POSIX extended regular expression
    #[arg(long)]
    posix: bool,
}

impl PatternArgs {
    fn mode(&self) -> MatchMode {
        MatchMode::from_flags(self.regex, self.posix)
    }
}

#[derive(clap::Args, Debug)]
struct CreateArgs {
    /// Tag of the new release, optionally with the commitish to tag
    #[arg(value_name = "TAG[@TARGET]")]
    tag: TagTarget,

    /// Name (or pattern) of the files to upload
    #[arg(value_name = "FILENAME")]
    filename: String,

    #[arg(long, default_value = "")]
    title: String,

    #[arg(long, default_value = "")]
    body: String,

    /// Directory searched for asset files
    #[arg(long, value_name = "DIR", default_value = ".")]
    dir: PathBuf,

    #[command(flatten)]
    pattern: PatternArgs,

    /// Publish a regular release instead of a draft
    #[arg(long)]
    no_draft: bool,

    /// Do not mark the release as a prerelease
    #[arg(long)]
    no_prerelease: bool,

    /// Actually create the release and upload the files
    #[arg(long)]
    no_dry_run: bool,
}

impl CreateArgs {
    fn options(&self) -> CreateOptions {
        CreateOptions {
            tag: self.tag.tag.clone(),
            target: self.tag.target.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            draft: !self.no_draft,
            prerelease: !self.no_prerelease,
            dry_run: !self.no_dry_run,
        }
    }

    fn assets(&self) -> AssetSelection {
        AssetSelection {
            dir: self.dir.clone(),
            filename: self.filename.clone(),
            mode: self.pattern.mode(),
        }
    }
}

#[derive(clap::Args, Debug)]
#[command(args_conflicts_with_subcommands = true, arg_required_else_help = true)]
struct DeleteArgs {
    #[command(subcommand)]
    command: Option<DeleteCommands>,

    /// Id of the release to delete
    #[arg(value_name = "RELEASE_ID", value_parser = parse_release_id)]
    release_id: Option<u64>,

    #[command(flatten)]
    dry_run: DryRunArgs,
}

#[derive(clap::Subcommand, Debug)]
enum DeleteCommands {
    /// Delete the release with the given tag, or every release matching a pattern
    ByTag(DeleteByTagArgs),
    /// Delete releases whose target is not part of any branch
    Unbranched(DryRunArgs),
    /// Delete every draft release
    Drafts(DryRunArgs),
    /// Delete every prerelease
    Prereleases(DryRunArgs),
}

#[derive(clap::Args, Debug)]
struct DryRunArgs {
    /// Actually apply the changes
    #[arg(long)]
    no_dry_run: bool,
}

#[derive(clap::Args, Debug)]
struct DeleteByTagArgs {
    #[arg(value_name = "TAG[@TARGET]")]
    tag: TagTarget,

    #[command(flatten)]
    pattern: PatternArgs,

    /// Only delete draft releases
    #[arg(long)]
    draft: bool,

    /// Only delete prereleases
    #[arg(long)]
    prerelease: bool,

    #[command(flatten)]
    dry_run: DryRunArgs,
}

impl DeleteArgs {
    fn request(&self) -> Result<(DeleteRequest, DeleteOptions)> {
        let (request, dry_run) = match (&self.command, self.release_id) {
            (Some(DeleteCommands::ByTag(args)), _) => (
                DeleteRequest::ByTag {
                    tag: args.tag.clone(),
                    mode: args.pattern.mode(),
                    draft: args.draft,
                    prerelease: args.prerelease,
                },
                &args.dry_run,
            ),
            (Some(DeleteCommands::Unbranched(args)), _) => {
                (DeleteRequest::Bulk(BulkSelector::Unbranched), args)
            }
            (Some(DeleteCommands::Drafts(args)), _) => {
                (DeleteRequest::Bulk(BulkSelector::Drafts), args)
            }
            (Some(DeleteCommands::Prereleases(args)), _) => {
                (DeleteRequest::Bulk(BulkSelector::PreReleases), args)
            }
            (None, Some(id)) => (DeleteRequest::ById(id), &self.dry_run),
            (None, None) => anyhow::bail!("a release id or a delete command is required"),
        };
        let options = DeleteOptions {
            dry_run: !dry_run.no_dry_run,
            ..Default::default()
        };
        Ok((request, options))
    }
}

#[derive(clap::Args, Debug)]
#[command(args_conflicts_with_subcommands = true, arg_required_else_help = true)]
struct DownloadArgs {
    #[command(subcommand)]
    command: Option<DownloadCommands>,

    /// Id of the release to download from
    #[arg(value_name = "RELEASE_ID", value_parser = parse_release_id)]
    release_id: Option<u64>,

    #[command(flatten)]
    asset: AssetArgs,
}

#[derive(clap::Subcommand, Debug)]
enum DownloadCommands {
    /// Download from the latest release
    Latest(AssetArgs),
    /// Download from the release with the given tag
    ByTag(DownloadByTagArgs),
}

#[derive(clap::Args, Debug)]
struct AssetArgs {
    /// Name of the asset
    #[arg(value_name = "FILENAME")]
    filename: Option<String>,

    /// Where to save the asset (defaults to its name)
    #[arg(long, value_name = "PATH")]
    save_as: Option<PathBuf>,

    /// Actually download the asset
    #[arg(long)]
    no_dry_run: bool,
}

#[derive(clap::Args, Debug)]
struct DownloadByTagArgs {
    #[arg(value_name = "TAG[@TARGET]")]
    tag: TagTarget,

    #[command(flatten)]
    asset: AssetArgs,
}

impl AssetArgs {
    fn options(&self) -> Result<DownloadOptions> {
        let Some(filename) = self.filename.clone() else {
            anyhow::bail!("the asset file name is required");
        };
        Ok(DownloadOptions {
            asset_name: filename,
            save_as: self.save_as.clone(),
            dry_run: !self.no_dry_run,
        })
    }
}

impl DownloadArgs {
    fn request(&self) -> Result<(DownloadRequest, DownloadOptions)> {
        match (&self.command, self.release_id) {
            (Some(DownloadCommands::Latest(args)), _) => Ok((DownloadRequest::Latest, args.options()?)),
            (Some(DownloadCommands::ByTag(args)), _) => Ok((
                DownloadRequest::ByTag(args.tag.clone()),
                args.asset.options()?,
            )),
            (None, Some(id)) => Ok((DownloadRequest::ById(id), self.asset.options()?)),
            (None, None) => anyhow::bail!("a release id or a download command is required"),
        }
    }
}

async fn run(cli: Cli, ctx: &ExecutionContext) -> Result<()> {
    let runtime = RealRuntime;
    let config = Config::load(&runtime, cli.repo.as_deref(), cli.api_url.as_deref())?;
    let github = services::build_github(&config, ctx)?;
    let mut out = io::stdout();

    match cli.command {
        Commands::List(args) => commands::list(&github, ctx, &args.options(), &mut out).await,
        Commands::Create(args) => {
            commands::create(
                &runtime,
                &github,
                ctx,
                &args.options(),
                &args.assets(),
                &mut out,
            )
            .await
        }
        Commands::Delete(args) => {
            let (request, options) = args.request()?;
            commands::delete(&github, ctx, &request, &options, &mut out).await
        }
        Commands::Download(args) => {
            let (request, options) = args.request()?;
            commands::download(&github, ctx, &request, &options, &mut out).await
        }
    }
}

async fn interrupt() -> u8 {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for SIGINT: {}", e);
        std::future::pending::<()>().await;
    }
    SIGINT
}

/// Resolves with the number of the first SIGINT or SIGTERM received.
async fn wait_for_signal() -> u8 {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                return interrupt().await;
            }
        };
        tokio::select! {
            signo = interrupt() => signo,
            _ = terminate.recv() => SIGTERM,
        }
    }
    #[cfg(not(unix))]
    {
        interrupt().await
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let filter = if cli.verbose { "warn,ghra=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let ctx = ExecutionContext::new(cli.verbose);
    let work = run(cli, &ctx);
    tokio::pin!(work);

    let result = tokio::select! {
        result = &mut work => result,
        signo = wait_for_signal() => {
            warn!("Received signal {}, cancelling", signo);
            ctx.cancel();
            tokio::select! {
                _ = &mut work => {}
                _ = wait_for_signal() => warn!("Received another signal, exiting"),
            }
            return ExitCode::from(signo);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
