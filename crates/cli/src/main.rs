//! Horologe CLI - Database, catalog and local cart tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! horologe migrate
//!
//! # Create an administrator
//! horologe admin create -e admin@example.com -f Admin -l User
//!
//! # Load the sample watches
//! horologe seed products
//!
//! # Work with a local cart against a running API
//! horologe cart add 1 --quantity 2
//! horologe cart list
//! horologe checkout --first-name Ada --last-name Lovelace ...
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` / `admin promote` - Manage administrators
//! - `seed products` - Seed the catalog
//! - `cart add|remove|set|list|clear` - Edit the local cart
//! - `checkout` - Place an order for the local cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;

use horologe_cart::{CartStore, JsonFileCartStorage, StoreClient};
use horologe_core::{ProductId, ShippingAddress};

mod commands;

#[derive(Parser)]
#[command(name = "horologe")]
#[command(author, version, about = "Horologe CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database with sample data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Edit the local cart
    Cart {
        #[command(flatten)]
        file: CartFile,

        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for everything in the local cart
    Checkout {
        #[command(flatten)]
        file: CartFile,

        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        shipping: ShippingArgs,

        /// Payment method recorded on the order
        #[arg(long, default_value = "Cash on Delivery")]
        payment_method: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        first_name: String,

        #[arg(short, long, default_value = "")]
        last_name: String,

        /// Password (at least 8 characters)
        #[arg(short, long, env = "HOROLOGE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Grant admin rights to an existing account
    Promote {
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert the sample watch catalog
    Products {
        /// Insert even if the catalog already has products
        #[arg(long)]
        append: bool,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product, fetching its details from the API
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        #[command(flatten)]
        api: ApiArgs,
    },
    /// Remove a product
    Remove { product_id: ProductId },
    /// Set a product's quantity (0 removes it)
    Set {
        product_id: ProductId,

        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Show the cart
    List,
    /// Empty the cart
    Clear,
}

#[derive(Args)]
struct CartFile {
    /// Where the cart is stored
    #[arg(long, global = true, default_value = ".horologe/cart.json")]
    cart_file: PathBuf,
}

#[derive(Args)]
struct ApiArgs {
    /// Base URL of the Horologe API
    #[arg(long, env = "HOROLOGE_API_URL", default_value = "http://localhost:5000")]
    api_url: String,

    /// Bearer token from `POST /api/auth/login`
    #[arg(long, env = "HOROLOGE_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl ApiArgs {
    fn client(self) -> Result<StoreClient, horologe_cart::CheckoutError> {
        StoreClient::new(&self.api_url, self.token.map(SecretString::from))
    }
}

#[derive(Args)]
struct ShippingArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    state: String,
    #[arg(long)]
    postal_code: String,
    #[arg(long, default_value = "India")]
    country: String,
    #[arg(long)]
    phone: String,
}

impl From<ShippingArgs> for ShippingAddress {
    fn from(args: ShippingArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            address: args.address,
            city: args.city,
            state: args.state,
            postal_code: args.postal_code,
            country: args.country,
            phone: args.phone,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                first_name,
                last_name,
                password,
            } => {
                let password = SecretString::from(password);
                commands::admin::create_user(&email, &first_name, &last_name, &password).await?;
            }
            AdminAction::Promote { email } => {
                commands::admin::promote(&email).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { append } => {
                commands::seed::products(append).await?;
            }
        },
        Commands::Cart { file, action } => {
            let mut store = CartStore::open(JsonFileCartStorage::new(file.cart_file))?;
            match action {
                CartAction::Add {
                    product_id,
                    quantity,
                    api,
                } => {
                    let client = api.client()?;
                    commands::cart::add(&mut store, &client, product_id, quantity).await?;
                }
                CartAction::Remove { product_id } => {
                    commands::cart::remove(&mut store, product_id)?;
                }
                CartAction::Set {
                    product_id,
                    quantity,
                } => commands::cart::set(&mut store, product_id, quantity)?,
                CartAction::List => {}
                CartAction::Clear => commands::cart::clear(&mut store)?,
            }
            #[allow(clippy::print_stdout)]
            {
                print!("{}", commands::cart::summary(&store));
            }
        }
        Commands::Checkout {
            file,
            api,
            shipping,
            payment_method,
        } => {
            let mut store = CartStore::open(JsonFileCartStorage::new(file.cart_file))?;
            let client = api.client()?;
            commands::cart::checkout(&mut store, &client, shipping.into(), &payment_method)
                .await?;
        }
    }
    Ok(())
}
