use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use pcf_client::api::types::{ExportFormat, LoginRequest, User};
use pcf_client::api::{audit, companies, products, ApiClient};
use pcf_client::config::Config;
use pcf_client::session::{Session, SessionState};
use pcf_client::store::{FileStore, SessionStore};
use pcf_client::trace::MentionSeverity;

#[derive(Parser)]
#[command(name = "pcf", version, about = "Client for the PCF calculator backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session
    Login {
        username: String,
        #[arg(long, env = "PCF_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Drop the stored session
    Logout,
    /// Show the authenticated user
    Whoami,
    /// List companies and select the active one
    Companies {
        /// Select this company for subsequent commands
        #[arg(long)]
        select: Option<Uuid>,
    },
    /// List products of the selected company, or show one in detail
    Products {
        /// Show this product instead of listing all
        product: Option<Uuid>,
    },
    /// Render a product's emission breakdown tree
    Trace {
        product: Uuid,
        /// Re-derive every total and report disagreements with the backend
        #[arg(long)]
        verify: bool,
    },
    /// Download a product report
    Export {
        product: Uuid,
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        #[arg(long)]
        out: PathBuf,
    },
    /// Ask for AI reduction advice on a product
    Advice { product: Uuid },
    /// Show the selected company's audit log
    Audit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    let backing = FileStore::open(&config.storage.state_path)
        .await
        .context("Failed to open state store")?;
    let store = SessionStore::new(Arc::new(backing));
    let api = ApiClient::new(&config.api, &config.request, store.clone())
        .context("Failed to initialize API client")?;
    let session = Arc::new(Session::new(api.clone(), store.clone(), config.session.clone()));

    match cli.command {
        Command::Login { username, password } => {
            let user = session
                .login(&LoginRequest { username, password })
                .await
                .context("Login failed")?;
            println!("Logged in as {}", display_name(&user));
        }
        Command::Logout => {
            session.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => {
            let user = require_user(&session).await?;
            println!("{} <{}>", display_name(&user), user.email);
        }
        Command::Companies { select } => {
            require_user(&session).await?;
            let list = companies::list(&api).await?;
            if let Some(id) = select {
                if !list.iter().any(|c| c.id == id) {
                    bail!("Not a member of company {id}");
                }
                store.set_selected_company(Some(&id.to_string())).await?;
            }
            let selected = store.selected_company().await;
            for company in &list {
                let marker = if selected.as_deref() == Some(company.id.to_string().as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}  {}  (VAT {})", marker, company.id, company.name, company.vat_number);
            }
        }
        Command::Products { product } => {
            require_user(&session).await?;
            let company_id = selected_company(&store).await?;
            match product {
                Some(product_id) => {
                    let product = products::get(&api, company_id, product_id).await?;
                    println!("{}  [{}]", product.name, product.sku);
                    println!("  manufacturer: {}", product.manufacturer_name);
                    if !product.description.is_empty() {
                        println!("  description:  {}", product.description);
                    }
                    println!(
                        "  footprint:    {:.3} kg CO2e ({:.3} biogenic + {:.3} non-biogenic)",
                        product.emission_total,
                        product.emission_total_biogenic,
                        product.emission_total_non_biogenic
                    );
                    println!(
                        "  visibility:   {}",
                        if product.is_public { "public" } else { "private" }
                    );
                    for factor in &product.override_emission_factors {
                        println!(
                            "  override {}: {:.3} biogenic + {:.3} non-biogenic",
                            factor.lifecycle_stage, factor.biogenic, factor.non_biogenic
                        );
                    }
                }
                None => {
                    for product in products::list(&api, company_id).await? {
                        println!(
                            "{}  {}  [{}]  {:.2} kg CO2e",
                            product.id, product.name, product.sku, product.emission_total
                        );
                    }
                }
            }
        }
        Command::Trace { product, verify } => {
            require_user(&session).await?;
            let company_id = selected_company(&store).await?;
            let trace = products::emission_trace(&api, company_id, product).await?;

            for row in trace.flatten() {
                let indent = "  ".repeat(row.depth);
                println!(
                    "{}{} [{}] x{}  own {:.3}  total {:.3} kg CO2e/{}",
                    indent,
                    row.label,
                    row.source.display_name(),
                    row.quantity,
                    row.own_contribution,
                    row.weighted_total,
                    row.unit,
                );
                for (stage, split) in row.subtotals {
                    println!(
                        "{}    {}: {:.3} biogenic + {:.3} non-biogenic",
                        indent, stage, split.biogenic, split.non_biogenic
                    );
                }
                for mention in row.mentions {
                    let tag = match mention.severity {
                        MentionSeverity::Info => "note",
                        MentionSeverity::Warning => "warning",
                        MentionSeverity::Error => "error",
                    };
                    println!("{}    [{}] {}", indent, tag, mention.message);
                }
            }

            if verify {
                let violations = trace.verify_totals(1e-6);
                if violations.is_empty() {
                    println!("All totals consistent with recomputation");
                } else {
                    for violation in &violations {
                        eprintln!("{}", violation);
                    }
                    bail!("{} total(s) disagree with recomputation", violations.len());
                }
            }
        }
        Command::Export {
            product,
            format,
            out,
        } => {
            require_user(&session).await?;
            let company_id = selected_company(&store).await?;
            let bytes = products::export(&api, company_id, product, format).await?;
            tokio::fs::write(&out, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote {} bytes to {}", bytes.len(), out.display());
        }
        Command::Advice { product } => {
            require_user(&session).await?;
            let company_id = selected_company(&store).await?;
            let advice = products::ai_advice(&api, company_id, product).await?;
            println!("{}", advice.advice);
        }
        Command::Audit => {
            require_user(&session).await?;
            let company_id = selected_company(&store).await?;
            for entry in audit::list_or_empty(&api, company_id).await {
                println!(
                    "{}  {}  {}  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.actor,
                    entry.action,
                    entry.summary
                );
            }
        }
    }

    Ok(())
}

/// Resolve the stored session, refreshing if needed, and insist on a user.
async fn require_user(session: &Arc<Session>) -> anyhow::Result<User> {
    match session.bootstrap().await? {
        SessionState::Authenticated(user) => {
            info!(user = %user.username, "Session resumed");
            Ok(user)
        }
        _ => bail!("Not logged in - run `pcf login <username>` first"),
    }
}

async fn selected_company(store: &SessionStore) -> anyhow::Result<Uuid> {
    let Some(raw) = store.selected_company().await else {
        bail!("No company selected - run `pcf companies --select <id>` first");
    };
    raw.parse().context("Stored company id is not a UUID")
}

fn display_name(user: &User) -> String {
    match (&user.first_name, &user.last_name) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first.clone(),
        _ => user.username.clone(),
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        pcf_client::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        pcf_client::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
