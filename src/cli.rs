use clap::{Args, Parser, Subcommand};
use crowdin_contributors::config::{AppConfig, ContributorsTableConfig, TelemetryConfig};
use crowdin_contributors::error::AppError;
use crowdin_contributors::telemetry;
use crowdin_contributors::workflows::contributors::{
    select_without_avatars, ContributorsWorkflow, CrowdinClient, ReportPayload, SelectionRules,
    TableRenderer,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "crowdin-contributors",
    about = "Generate a Crowdin top-contributors table and inject it into project files",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the report and update every target file (default command)
    Generate(GenerateArgs),
    /// Render a table from a saved report without contacting Crowdin
    Render(RenderArgs),
}

#[derive(Args, Debug, Default)]
struct TableArgs {
    /// Target file to update; repeat to override FILES
    #[arg(long = "file")]
    files: Vec<PathBuf>,
    /// Override MAX_CONTRIBUTORS
    #[arg(long)]
    max_contributors: Option<usize>,
    /// Override CONTRIBUTORS_PER_LINE
    #[arg(long)]
    contributors_per_line: Option<usize>,
    /// Override MIN_WORDS_CONTRIBUTED
    #[arg(long)]
    min_words: Option<u64>,
}

impl TableArgs {
    fn apply(self, table: &mut ContributorsTableConfig) {
        if !self.files.is_empty() {
            table.files = self.files;
        }
        if let Some(max) = self.max_contributors {
            table.max_contributors = max;
        }
        if let Some(per_line) = self.contributors_per_line {
            table.contributors_per_line = per_line;
        }
        if let Some(min_words) = self.min_words {
            table.min_words_contributed = Some(min_words);
        }
    }
}

#[derive(Args, Debug, Default)]
struct GenerateArgs {
    #[command(flatten)]
    table: TableArgs,
    /// Print the rendered table instead of writing files
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Downloaded top-members report (JSON)
    #[arg(long)]
    input: PathBuf,
    /// Render as an organization project (no profile links)
    #[arg(long)]
    organization: Option<String>,
    #[command(flatten)]
    table: TableArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Generate(GenerateArgs::default()));

    match command {
        Command::Generate(args) => run_generate(args).await,
        Command::Render(args) => run_render(args),
    }
}

async fn run_generate(args: GenerateArgs) -> Result<(), AppError> {
    let GenerateArgs { table, dry_run } = args;

    let mut config = AppConfig::load()?;
    table.apply(&mut config.table);
    config.table.validate()?;

    telemetry::init(&config.telemetry)?;

    let gateway = Arc::new(CrowdinClient::new(&config.credentials)?);
    let workflow = ContributorsWorkflow::new(
        gateway,
        &config.credentials,
        &config.table,
        config.polling,
    );

    let pipeline = async {
        if dry_run {
            workflow.preview().await
        } else {
            workflow.generate().await
        }
    };

    let outcome = tokio::select! {
        result = pipeline => result?,
        _ = tokio::signal::ctrl_c() => return Err(AppError::Interrupted),
    };

    if dry_run {
        println!("{}", outcome.fragment);
    } else {
        info!(
            contributors = outcome.contributors.len(),
            files = outcome.files_written,
            "contributors table updated"
        );
    }
    Ok(())
}

fn run_render(args: RenderArgs) -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    telemetry::init(&TelemetryConfig::from_env())?;

    let RenderArgs {
        input,
        organization,
        table,
    } = args;

    let mut config = ContributorsTableConfig::from_env()?;
    table.apply(&mut config);
    config.validate()?;

    let organization = organization.or_else(|| {
        std::env::var("CROWDIN_ORGANIZATION")
            .ok()
            .filter(|org| !org.trim().is_empty())
    });

    let raw = std::fs::read_to_string(&input)?;
    let report: ReportPayload = serde_json::from_str(&raw)?;
    let contributors = select_without_avatars(&SelectionRules::from_config(&config), &report.data);
    let fragment = TableRenderer::from_config(&config, organization.as_deref()).render(&contributors);

    info!(
        contributors = contributors.len(),
        input = %input.display(),
        "rendered table from saved report"
    );
    println!("{fragment}");
    Ok(())
}

