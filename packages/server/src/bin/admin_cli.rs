//! Operator CLI: schema migrations, admin bootstrap and manual job runs.
//!
//! Every command prints a single JSON object.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value as JsonValue;
use server_core::common::validation::{email, password};
use server_core::common::{UserId, UserRole};
use server_core::config::Config;
use server_core::domains::auth::models::{User, UserProfile, UserStatus};
use server_core::domains::auth::password::hash_password;
use server_core::domains::auth::JwtService;
use server_core::kernel::{scheduled_tasks, ServerDeps, SimulatedPaymentGateway, TokenPolicy};
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "admin_cli")]
#[command(about = "Şeffaf Bağış operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,

    /// Create an active, verified ADMIN account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },

    /// Run one scheduled job immediately
    RunJob { name: String },
}

#[derive(Serialize)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
}

impl Response {
    fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            user_id: None,
            result: None,
        }
    }
}

fn output(resp: &Response) -> Result<()> {
    println!("{}", serde_json::to_string(resp)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Migrate => cmd_migrate().await,
        Commands::CreateAdmin {
            email,
            password,
            first_name,
            last_name,
        } => cmd_create_admin(&email, &password, &first_name, &last_name).await,
        Commands::RunJob { name } => cmd_run_job(&name).await,
    };

    match outcome {
        Ok(resp) => output(&resp),
        Err(e) => {
            output(&Response {
                success: false,
                message: Some(format!("{:#}", e)),
                user_id: None,
                result: None,
            })?;
            std::process::exit(1);
        }
    }
}

async fn get_pool(config: &Config) -> Result<PgPool> {
    PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

async fn cmd_migrate() -> Result<Response> {
    let config = Config::from_env()?;
    let pool = get_pool(&config).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    Ok(Response::message("Migrations applied"))
}

async fn cmd_create_admin(
    raw_email: &str,
    raw_password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<Response> {
    let address = email::normalize(raw_email);
    email::validate(&address).into_api_result("email")?;
    password::validate(raw_password).into_api_result("password")?;

    let config = Config::from_env()?;
    let pool = get_pool(&config).await?;
    if User::email_exists(&address, &pool).await? {
        anyhow::bail!("A user with e-mail {} already exists", address);
    }

    let password_hash = hash_password(raw_password)?;
    let mut tx = pool.begin().await?;
    let user = User::create(&address, &password_hash, UserRole::Admin, UserStatus::Active, &mut tx).await?;
    User::mark_email_verified(user.id, &mut tx).await?;
    UserProfile::create(user.id, first_name.trim(), last_name.trim(), &mut tx).await?;
    tx.commit().await?;

    Ok(Response {
        success: true,
        message: Some(format!("Admin {} created", address)),
        user_id: Some(user.id),
        result: None,
    })
}

async fn cmd_run_job(name: &str) -> Result<Response> {
    let config = Config::from_env()?;
    let pool = get_pool(&config).await?;
    let deps = Arc::new(ServerDeps::new(
        pool,
        Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone())),
        Arc::new(SimulatedPaymentGateway::new()),
        TokenPolicy::default(),
        config.admin_emails.clone(),
    ));

    let result = scheduled_tasks::run_job(name, &deps).await?;
    Ok(Response {
        success: true,
        message: Some(format!("Job {} finished", name)),
        user_id: None,
        result: Some(result),
    })
}
