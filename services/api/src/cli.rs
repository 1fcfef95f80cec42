use crate::demo::{run_assign, run_demo, run_preview, AssignArgs, DemoArgs, PreviewArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use courier_dispatch::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Courier Dispatch",
    about = "Serve the dispatch API or run job-to-driver allocation from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Auto-assign every pending job in a JSON snapshot
    Assign(AssignArgs),
    /// Show the per-driver scoring breakdown for one job
    Preview(PreviewArgs),
    /// Run a batch over a seeded roster and print the result
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the in-memory store from a JSON snapshot instead of the demo roster
    #[arg(long)]
    pub(crate) snapshot: Option<std::path::PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assign(args) => run_assign(args),
        Command::Preview(args) => run_preview(args),
        Command::Demo(args) => run_demo(args),
    }
}
