use clap::Parser;

use pinecone::cli::Cli;
use pinecone::config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::try_from(cli)?;
    pinecone::run(&config)
}
