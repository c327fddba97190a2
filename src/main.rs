use anyhow::Context;
use blogicum::{create_staff_user, init_db, run_app, Config, RegistrationForm};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "blogicum", version, about = "A small multi-author blogging site")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web server (the default).
    Serve,
    /// Create a staff account able to use /admin/, or promote an existing user.
    CreateStaff {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long)]
        password: String,
    },
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogicum=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    install_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_app(config).await,
        Command::CreateStaff {
            username,
            email,
            password,
        } => {
            let pool = init_db(&config.database_url).await?;
            let form = RegistrationForm {
                username,
                email,
                password1: password.clone(),
                password2: password,
            };
            match create_staff_user(&pool, &form)
                .await
                .context("Failed to create staff user")?
            {
                Ok(user) => {
                    println!("Staff user {} is ready", user.username);
                    Ok(())
                }
                Err(errors) => {
                    for (field, message) in &errors {
                        eprintln!("{}: {}", field, message);
                    }
                    anyhow::bail!("invalid staff user details")
                }
            }
        }
    }
}
