//! Ecomai CLI - terminal client for the Ecomai store.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! ecomai products list
//! ecomai products offers
//! ecomai products search keyboard
//!
//! # Log in (password or face) and shop
//! ecomai login --email ana@example.com --password s3cret!
//! ecomai face login --email ana@example.com --camera /dev/shm/cam.jpg
//! ecomai cart add 42 --quantity 2
//! ecomai cart show
//!
//! # Ask the shopping assistant
//! ecomai chat "Which keyboard is best for gaming?"
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout` - Manage the stored token
//! - `face login`, `face register` - Face authentication through a camera
//! - `products` - Browse the catalog
//! - `cart` - Manage the cart (requires login)
//! - `admin` - Create and delete products (requires an admin account)
//! - `chat` - Ask the shopping assistant
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL` - Commerce backend base URL
//! - `AI_SERVICE_URL` - Shopping assistant base URL
//! - `BACKEND_TIMEOUT_SECS` - Per-request timeout
//! - `ECOMAI_TOKEN_FILE` - Where the login token is kept between runs
//! - `ECOMAI_PASSWORD` - Password for `login` and `register`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ecomai_core::{CartItemId, ProductId};
use ecomai_storefront::config::{BackendConfig, DEFAULT_AI_SERVICE_URL, DEFAULT_BACKEND_API_URL};
use tracing_subscriber::EnvFilter;
use url::Url;

mod commands;
mod error;
mod output;
mod token_file;

use commands::Context;
use commands::admin::ProductArgs;
use commands::face::CaptureOptions;
use commands::products::Listing;
use error::CliError;
use token_file::FileTokenStore;

#[derive(Parser)]
#[command(name = "ecomai")]
#[command(author, version, about = "Ecomai terminal client")]
struct Cli {
    /// Commerce backend base URL
    #[arg(long, global = true, env = "BACKEND_API_URL", default_value = DEFAULT_BACKEND_API_URL)]
    api_url: Url,

    /// Shopping assistant base URL
    #[arg(long, global = true, env = "AI_SERVICE_URL", default_value = DEFAULT_AI_SERVICE_URL)]
    ai_url: Url,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "BACKEND_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// File holding the login token between runs
    #[arg(long, global = true, env = "ECOMAI_TOKEN_FILE", default_value = ".ecomai-token")]
    token_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "ECOMAI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Register {
        /// Full name
        #[arg(short, long)]
        name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(short, long, env = "ECOMAI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored login token
    Logout,
    /// Face authentication through a camera
    Face {
        #[command(subcommand)]
        action: FaceAction,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage products
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Ask the shopping assistant
    Chat {
        /// Your question
        message: String,

        /// What the shopper is looking at
        #[arg(long)]
        context: Option<String>,
    },
}

#[derive(clap::Args)]
struct CaptureArgs {
    /// Frame file kept fresh by the camera
    #[arg(long, env = "ECOMAI_CAMERA")]
    camera: PathBuf,

    /// Countdown before the photo is taken
    #[arg(long, default_value_t = 3)]
    countdown: u8,

    /// Acquisition retries after a camera error
    #[arg(long, default_value_t = 2)]
    retries: u8,

    /// Seconds to wait for the camera
    #[arg(long, default_value_t = 30)]
    camera_timeout_secs: u64,
}

impl From<CaptureArgs> for CaptureOptions {
    fn from(args: CaptureArgs) -> Self {
        Self {
            camera: args.camera,
            countdown: args.countdown,
            retries: args.retries,
            acquire_timeout: Duration::from_secs(args.camera_timeout_secs),
        }
    }
}

#[derive(Subcommand)]
enum FaceAction {
    /// Log in with your face
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        #[command(flatten)]
        capture: CaptureArgs,
    },
    /// Register your face for the logged-in account
    Register {
        #[command(flatten)]
        capture: CaptureArgs,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List all products
    List,
    /// List discounted products
    Offers,
    /// Show one product
    Show { id: ProductId },
    /// List products of a category
    Category { name: String },
    /// Search products by name
    Search { query: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change a line's quantity (0 removes it)
    Update { item_id: CartItemId, quantity: u32 },
    /// Remove a line
    Remove { item_id: CartItemId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a product
    CreateProduct {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// List price, e.g. 25.00
        #[arg(long)]
        price: String,

        #[arg(long)]
        discount_price: Option<String>,

        #[arg(long, default_value = "")]
        image_url: String,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(long, default_value_t = 0)]
        stock: i32,
    },
    /// Delete a product
    DeleteProduct { id: ProductId },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ecomai=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{e}");
        if e.needs_login() {
            tracing::info!("Log in with `ecomai login` or `ecomai face login`");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = BackendConfig {
        api_url: cli.api_url,
        ai_url: cli.ai_url,
        timeout: Duration::from_secs(cli.timeout_secs),
    };
    let ctx = Context::new(&config, FileTokenStore::new(cli.token_file))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&ctx, &email, password).await?,
        Commands::Register {
            name,
            email,
            password,
        } => commands::auth::register(&ctx, &name, &email, password).await?,
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Face { action } => match action {
            FaceAction::Login { email, capture } => {
                commands::face::login(&ctx, &email, &capture.into()).await?;
            }
            FaceAction::Register { capture } => {
                commands::face::register(&ctx, &capture.into()).await?;
            }
        },
        Commands::Products { action } => match action {
            ProductsAction::List => commands::products::list(&ctx, Listing::All, &mut out).await?,
            ProductsAction::Offers => {
                commands::products::list(&ctx, Listing::Offers, &mut out).await?;
            }
            ProductsAction::Show { id } => commands::products::show(&ctx, id, &mut out).await?,
            ProductsAction::Category { name } => {
                commands::products::list(&ctx, Listing::Category(name), &mut out).await?;
            }
            ProductsAction::Search { query } => {
                commands::products::list(&ctx, Listing::Search(query), &mut out).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx, &mut out).await?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&ctx, product_id, quantity, &mut out).await?,
            CartAction::Update { item_id, quantity } => {
                commands::cart::update(&ctx, item_id, quantity, &mut out).await?;
            }
            CartAction::Remove { item_id } => commands::cart::remove(&ctx, item_id, &mut out).await?,
            CartAction::Clear => commands::cart::clear(&ctx).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::CreateProduct {
                name,
                description,
                price,
                discount_price,
                image_url,
                category,
                stock,
            } => {
                let args = ProductArgs {
                    name,
                    description,
                    price,
                    discount_price,
                    image_url,
                    category,
                    stock,
                };
                commands::admin::create_product(&ctx, args, &mut out).await?;
            }
            AdminAction::DeleteProduct { id } => commands::admin::delete_product(&ctx, id).await?,
        },
        Commands::Chat { message, context } => {
            commands::chat::ask(&ctx, &message, context.as_deref(), &mut out).await?;
        }
    }

    out.flush()?;
    Ok(())
}
