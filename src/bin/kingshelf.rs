use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kingshelf::api::CatalogHttpClient;
use kingshelf::config::ConfigLoader;
use kingshelf::domain::PublisherFilter;
use kingshelf::error::ShelfError;
use kingshelf::output::{BrowseResult, DomainsResult, JsonOutput, OutputMode};
use kingshelf::session::CatalogSession;
use kingshelf::supplement::SupplementIndex;
use kingshelf::tui::Tui;

#[derive(Parser)]
#[command(name = "kingshelf")]
#[command(about = "Terminal catalog browser for Stephen King's bibliography")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch and filter the catalog")]
    Catalog(CatalogArgs),
}

#[derive(Args)]
struct CatalogArgs {
    #[command(subcommand)]
    command: Option<CatalogCommand>,
}

#[derive(Subcommand)]
enum CatalogCommand {
    #[command(about = "Fetch the catalog and print the filtered view")]
    Browse(BrowseArgs),
    #[command(about = "Fetch the catalog and print the filter domains")]
    Domains,
}

#[derive(Args, Clone, Default)]
struct BrowseArgs {
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    publisher: Option<String>,

    #[arg(long)]
    year_from: Option<i32>,

    #[arg(long)]
    year_to: Option<i32>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(shelf) = report.downcast_ref::<ShelfError>() {
            return ExitCode::from(map_exit_code(shelf));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ShelfError) -> u8 {
    match error {
        ShelfError::ConfigRead(_)
        | ShelfError::ConfigParse(_)
        | ShelfError::SupplementRead(_)
        | ShelfError::SupplementParse(_)
        | ShelfError::UnknownPublisher(_) => 2,
        ShelfError::CatalogHttp(_) | ShelfError::CatalogStatus { .. } => 3,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    let supplement = match &config.covers {
        Some(path) => SupplementIndex::from_file(path).into_diagnostic()?,
        None => SupplementIndex::bundled().into_diagnostic()?,
    };
    let client = CatalogHttpClient::new(&config.endpoint, config.timeout).into_diagnostic()?;

    match cli.command {
        Some(Commands::Catalog(args)) => {
            let command = args
                .command
                .unwrap_or(CatalogCommand::Browse(BrowseArgs::default()));
            match command {
                CatalogCommand::Browse(args) => {
                    run_browse(args, client, supplement, output_mode)
                }
                CatalogCommand::Domains => run_domains(client, supplement),
            }
        }
        None => match output_mode {
            OutputMode::Interactive => Tui::new(client, supplement).run(),
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `kingshelf catalog --help`)",
            )),
        },
    }
}

fn run_browse(
    args: BrowseArgs,
    client: CatalogHttpClient,
    supplement: SupplementIndex,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let mut session = load_session(&client, supplement)?;

    if let Some(search) = args.search {
        session.set_search(search);
    }
    if let Some(publisher) = args.publisher {
        session
            .set_publisher(PublisherFilter::Named(publisher))
            .into_diagnostic()?;
    }
    match (args.year_from, args.year_to) {
        (None, None) => {}
        (from, to) => {
            let bounds = session.domain().year_bounds;
            let low = from.or(bounds.map(|range| range.low()));
            let high = to.or(bounds.map(|range| range.high()));
            if let (Some(low), Some(high)) = (low, high) {
                session.set_year_range(low, high);
            }
        }
    }

    let result = BrowseResult {
        status: session.status(),
        matched: session.view().len(),
        books: session.view().to_vec(),
    };
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_browse(&result).into_diagnostic(),
        OutputMode::Interactive => {
            print_browse_summary(&result);
            Ok(())
        }
    }
}

fn run_domains(client: CatalogHttpClient, supplement: SupplementIndex) -> miette::Result<()> {
    let session = load_session(&client, supplement)?;
    let result = DomainsResult {
        status: session.status(),
        domains: session.domain().clone(),
    };
    JsonOutput::print_domains(&result).into_diagnostic()
}

fn load_session(
    client: &CatalogHttpClient,
    supplement: SupplementIndex,
) -> miette::Result<CatalogSession> {
    let mut session = CatalogSession::new(supplement);
    // One-shot commands consume the initial load request right here; a
    // fetch failure is fatal for them, there is no older catalog to fall
    // back to.
    session.take_load_request();
    session.load(client, &JsonOutput).into_diagnostic()?;
    Ok(session)
}

fn print_browse_summary(result: &BrowseResult) {
    let cyan = "\x1b[36m";
    let dim = "\x1b[2m";
    let reset = "\x1b[0m";

    println!(
        "{cyan}{} of {} books match{reset}",
        result.matched, result.status.total
    );
    if result.status.rejected > 0 {
        println!("{dim}({} malformed records skipped){reset}", result.status.rejected);
    }
    for book in &result.books {
        let cover = book.image.as_deref().unwrap_or("-");
        println!(
            "  {} ({}) - {}  {dim}{}{reset}",
            book.title, book.year, book.publisher, cover
        );
    }
}
