use crate::demo::{run_demo, run_ledger_export, run_task, DemoArgs, LedgerExportArgs, TaskRunArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rentwise::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Rentwise",
    about = "Run the tenant-isolated property management service and its background tasks",
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
    /// Run a named background task against the sample portfolio
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Inspect an organization's accounting ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommand,
    },
    /// Seed two organizations and run every task kind, printing the outcome
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Dispatch one task in the foreground and print its final state as JSON
    Run(TaskRunArgs),
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    /// Sync accounting and write the ledger as CSV to stdout
    Export(LedgerExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Task {
            command: TaskCommand::Run(args),
        } => run_task(args),
        Command::Ledger {
            command: LedgerCommand::Export(args),
        } => run_ledger_export(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentwise::tasks::MessageKind;

    #[test]
    fn task_run_parses_tenant_and_period() {
        let cli = Cli::try_parse_from([
            "rentwise-api",
            "task",
            "run",
            "generate_rent",
            "--organization",
            "1",
            "--company",
            "11",
            "--period",
            "2025-10",
        ])
        .expect("arguments parse");

        let Some(Command::Task {
            command: TaskCommand::Run(args),
        }) = cli.command
        else {
            panic!("expected task run command");
        };
        assert_eq!(args.name, MessageKind::GenerateRent);
        assert_eq!(args.organization, 1);
        assert_eq!(args.company, Some(11));
        assert!(args.period.is_some());
        assert!(args.date.is_none());
    }

    #[test]
    fn task_run_rejects_date_with_period() {
        let parsed = Cli::try_parse_from([
            "rentwise-api",
            "task",
            "run",
            "sync_accounting",
            "--organization",
            "1",
            "--date",
            "2025-10-31",
            "--period",
            "2025-10",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_task_names_are_rejected() {
        let parsed = Cli::try_parse_from([
            "rentwise-api",
            "task",
            "run",
            "rebuild_search_index",
            "--organization",
            "1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["rentwise-api"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
