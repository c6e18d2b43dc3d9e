mod backend;
mod cli;
mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use userstore::MembershipOp;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("userstore=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    // Commands that never touch a store
    match &cli.command {
        Commands::Hash { plaintext } => {
            return commands::hash::hash(&cli.store_config, plaintext, format).await;
        }
        Commands::Verify { plaintext, record } => {
            let matched =
                commands::hash::verify(&cli.store_config, plaintext, record, format).await?;
            if !matched {
                std::process::exit(1);
            }
            return Ok(());
        }
        _ => {}
    }

    let backend = backend::create_backend(&cli.backend_config).await?;
    tracing::info!(
        backend = %backend::backend_label(&cli.backend_config),
        "Opening users collection"
    );
    let store = backend::open_store(backend.clone(), &cli.store_config).await?;

    let result = match &cli.command {
        Commands::Add { user } => commands::users::add(&store, user, format).await,
        Commands::Get { filter } => commands::users::get(&store, filter, format).await,
        Commands::Update(args) => commands::users::update(&store, args, format).await,
        Commands::Remove { filter } => commands::users::remove(&store, filter, format).await,
        Commands::Count { filter } => commands::users::count(&store, filter, format).await,
        Commands::AddMembership {
            filter,
            memberships,
        } => {
            let op = MembershipOp::add(memberships.iter().cloned());
            commands::users::membership(&store, filter, op, format).await
        }
        Commands::RemoveMembership {
            filter,
            memberships,
        } => {
            let op = MembershipOp::remove(memberships.iter().cloned());
            commands::users::membership(&store, filter, op, format).await
        }
        Commands::Hash { .. } | Commands::Verify { .. } => Ok(()),
    };

    // Persist whatever the command managed to write, then report its outcome
    backend::persist(&backend, &cli.backend_config).await?;
    result
}
