use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::{CategoryFilter, Price},
    protocol::ProductDraft,
};
use storage::Storage;
use storefront_core::demo_products;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/storefront.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the demo catalog into an empty store.
    SeedCatalog {
        #[arg(long)]
        force: bool,
    },
    CreateAdmin {
        email: String,
        name: String,
        password: String,
        #[arg(long, default_value_t = 10)]
        cost: u32,
    },
    ListProducts {
        #[arg(long, default_value = "todos")]
        category: String,
        #[arg(long)]
        search: Option<String>,
    },
    /// Record an order so the dashboard has something to show.
    AddOrder {
        customer_name: String,
        total_cents: i64,
        #[arg(long, default_value = "pending")]
        status: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::SeedCatalog { force } => {
            let existing = storage.count_products().await?;
            if existing > 0 && !force {
                bail!("store already holds {existing} products; pass --force to seed anyway");
            }
            for product in demo_products() {
                let name = product.name.clone();
                let product_id = storage.create_product(&ProductDraft::from(product)).await?;
                info!(product_id = product_id.0, %name, "seeded product");
            }
            println!("seeded {} products", storage.count_products().await? - existing);
        }
        Command::CreateAdmin {
            email,
            name,
            password,
            cost,
        } => {
            if storage.find_admin_by_email(&email).await?.is_some() {
                bail!("admin '{email}' already exists");
            }
            let hash = bcrypt::hash(password, cost)?;
            let admin_id = storage.create_admin_user(&email, &name, &hash).await?;
            println!("created admin_id={}", admin_id.0);
        }
        Command::ListProducts { category, search } => {
            let filter = CategoryFilter::from_label(&category);
            for product in storage.list_products(&filter, search.as_deref()).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    product.id.0,
                    product.category,
                    product.price.format_brl(),
                    product.name
                );
            }
        }
        Command::AddOrder {
            customer_name,
            total_cents,
            status,
        } => {
            let total = Price::from_cents(total_cents);
            if !total.is_valid() {
                bail!("order total must be between 0 and {} cents", Price::MAX_CENTS);
            }
            let order_id = storage.insert_order(&customer_name, total, &status).await?;
            println!("created order_id={}", order_id.0);
        }
    }

    Ok(())
}
