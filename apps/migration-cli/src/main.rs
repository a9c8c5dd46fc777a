use clap::{Parser, ValueEnum};
use migration::sea_orm::{ConnectOptions, Database};
use migration::{migrate, MigrationCommand};

#[derive(Clone, Copy, ValueEnum)]
enum Command {
    Up,
    Down,
    Fresh,
    Reset,
    Refresh,
    Status,
}

impl From<Command> for MigrationCommand {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Up => MigrationCommand::Up,
            Command::Down => MigrationCommand::Down,
            Command::Fresh => MigrationCommand::Fresh,
            Command::Reset => MigrationCommand::Reset,
            Command::Refresh => MigrationCommand::Refresh,
            Command::Status => MigrationCommand::Status,
        }
    }
}

#[derive(Parser)]
#[command(name = "migration-cli")]
#[command(about = "Arena database migration tool")]
struct Args {
    /// Migration command to run
    #[arg(value_enum)]
    command: Command,

    /// Postgres or SQLite file URL, e.g. `sqlite://arena.db?mode=rwc`
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_env_filter("migration=info,sqlx=warn")
        .init();

    let args = Args::parse();

    // Each CLI run would get a brand new in-memory database.
    if args.database_url.contains(":memory:") {
        eprintln!("In-memory SQLite is not supported here: the schema would vanish on exit.");
        std::process::exit(2);
    }

    let mut opts = ConnectOptions::new(args.database_url.clone());
    opts.sqlx_logging(false);
    let db = match Database::connect(opts).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Could not connect to database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = migrate(&db, args.command.into()).await {
        eprintln!("Migration failed: {e}");
        std::process::exit(1);
    }
}
