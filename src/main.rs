use std::path::PathBuf;

use clap::{Parser, Subcommand};
use inkstone::config::Overrides;
use inkstone::{ConfigLoader, Role, api, db, server, users};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// Content-management API with role-based access control.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// TOML config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// libsql database URL
    #[arg(long)]
    database_url: Option<String>,

    /// JWT signing secret (at least 32 bytes)
    #[arg(long)]
    jwt_secret: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Change a user's role, e.g. to bootstrap the first admin
    SetRole {
        /// Account email
        email: String,
        /// viewer, editor or admin
        #[arg(value_parser = parse_role)]
        role: Role,
    },
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse().map_err(|e: inkstone::Error| e.to_string())
}

#[tokio::main]
async fn main() -> inkstone::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("inkstone=info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = ConfigLoader::new("INKSTONE").load(
        cli.config.as_deref(),
        Overrides {
            host: cli.host.as_deref(),
            port: cli.port,
            database_url: cli.database_url.as_deref(),
            jwt_secret: cli.jwt_secret.as_deref(),
        },
    )?;

    let db = db::connect(&config.database.url).await?;
    db::migrate(&db).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let router = api::router()?;
            server::run(config, Some(db), router.into_handle(), async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
        }
        Command::SetRole { email, role } => {
            let conn = db::connection(&db)?;
            let user = users::find_by_email(&conn, &email)
                .await?
                .ok_or_else(|| inkstone::Error::NotFound(format!("user {email}")))?;
            let user = users::set_role(&conn, &user.id, role).await?;
            info!(email = %user.email, role = %user.role, "Role updated");
            Ok(())
        }
    }
}
