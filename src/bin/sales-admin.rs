use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use sales_api::cli::{create_admin, gen_token};
use sales_api::modules::users::{PgUserRepository, UserService};
use sales_auth::{Auth, KeyStore};
use sales_config::{AuthConfig, DbConfig};

#[derive(Parser)]
#[command(name = "sales-admin")]
#[command(about = "Administrative tools for the Sales API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create an administrator account
    CreateAdmin {
        /// Display name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Print a token for an existing user
    GenToken {
        /// Email of the user the token is for
        #[arg(short = 'e', long)]
        email: String,

        /// Key id to sign with (defaults to SALES_AUTH_ACTIVE_KID)
        #[arg(short = 'k', long)]
        kid: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().with_target(false).compact().init();

    let cli = Cli::parse();

    let db_config = DbConfig::from_env()?;
    let pool = sales_db::open(&db_config).context("opening database pool")?;

    match cli.command {
        Commands::Migrate => {
            sales_db::status_check(&pool).await.context("waiting for database")?;
            sales_db::migrate(&pool).await?;
            println!("migrations complete");
        }
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => {
            let name = match name {
                Some(name) => name,
                None => Input::<String>::new().with_prompt("Name").interact_text()?,
            };
            let email = match email {
                Some(email) => email,
                None => Input::<String>::new().with_prompt("Email address").interact_text()?,
            };
            let password = match password {
                Some(password) => password,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords don't match")
                    .interact()?,
            };

            let users = UserService::new(Arc::new(PgUserRepository::new(pool)));
            let admin = create_admin(&users, &name, &email, &password).await?;
            println!("admin created");
            println!("   ID:    {}", admin.id);
            println!("   Email: {}", admin.email);
        }
        Commands::GenToken { email, kid } => {
            let auth_config = AuthConfig::from_env()?;
            let keys = KeyStore::from_dir(&auth_config.keys_folder)?;
            let auth = Auth::new(Arc::new(keys), auth_config.issuer, auth_config.token_ttl);
            let kid = kid.unwrap_or(auth_config.active_kid);

            let users = UserService::new(Arc::new(PgUserRepository::new(pool)));
            let token = gen_token(&users, &auth, &email, &kid).await?;
            println!("{}", token);
        }
    }

    Ok(())
}
