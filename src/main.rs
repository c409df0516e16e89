use clap::{Parser, Subcommand};

mod books;
mod cmd;
mod period;
mod records;
mod summary;
mod tax;

#[derive(Parser, Debug)]
#[command(name = "motax", version, about = "UK Corporation Tax summary for a small motor trade business")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate a period and estimate Corporation Tax
    Summary(cmd::summary::SummaryCommand),
    /// Export records or the tax summary as CSV
    Export(cmd::export::ExportCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Summary(cmd) => cmd.exec(),
        Command::Export(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
