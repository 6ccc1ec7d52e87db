use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Args, Parser, Subcommand};
use client_core::{
    load_settings, ApiClient, AuthSession, BulkDraftList, CategoryStore, ClientSettings,
    Dashboard, FetchPhase, FileTokenStore, FilterPatch, NotificationInbox, PlatformStore,
    ProductCatalog, ProductFilters, QueryIntent, Sorter,
};
use shared::{
    domain::{CategoryId, NotificationId, PlatformId, ProductId, SortOrder},
    error::ApiError,
    protocol::{CategoryInput, LoginRequest, PlatformInput, ProductInput},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "catalog-admin", about = "Admin client for the product catalog API")]
struct Cli {
    /// Base URL of the catalog API, e.g. http://127.0.0.1:8000/api
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// File holding the session token.
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
    /// Request timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a login captcha and save its image.
    Captcha {
        #[arg(long, default_value = "captcha.png")]
        out: PathBuf,
    },
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        captcha_key: String,
        #[arg(long)]
        captcha_value: String,
    },
    Logout,
    Whoami,
    #[command(subcommand)]
    Products(ProductCommand),
    #[command(subcommand)]
    Categories(CategoryCommand),
    #[command(subcommand)]
    Platforms(PlatformCommand),
    #[command(subcommand)]
    Notifications(NotificationCommand),
    /// Dashboard counts, distributions and best sellers.
    Stats,
}

#[derive(Subcommand, Debug)]
enum ProductCommand {
    List(ListArgs),
    Show { id: i64 },
    Delete { id: i64 },
    /// Import a product from its shop page.
    Scrape { url: String },
    /// Bulk-create products from a JSON array of product inputs.
    Import { file: PathBuf },
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long)]
    category: Option<i64>,
    #[arg(long)]
    platform: Option<i64>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    min_price: Option<f64>,
    #[arg(long)]
    max_price: Option<f64>,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    page_size: Option<u32>,
    /// name, price, sales or updated_at
    #[arg(long, requires = "sort_order")]
    sort_field: Option<String>,
    /// asc or desc
    #[arg(long, requires = "sort_field")]
    sort_order: Option<SortOrder>,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Remove { id: i64 },
}

#[derive(Subcommand, Debug)]
enum PlatformCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        website: String,
        #[arg(long)]
        logo_url: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Remove { id: i64 },
}

#[derive(Subcommand, Debug)]
enum NotificationCommand {
    List {
        #[arg(long)]
        unread: bool,
    },
    Read { id: i64 },
    ReadAll,
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli);
    debug!(
        api_base_url = %settings.api_base_url,
        token_path = %settings.token_path.display(),
        "catalog-admin: settings resolved"
    );
    let tokens = Arc::new(FileTokenStore::new(settings.token_path.clone()));
    let api = ApiClient::new(&settings, tokens).context("failed to build api client")?;

    let outcome = run(cli.command, &settings, Arc::clone(&api)).await;
    if let Err(err) = &outcome {
        if err
            .downcast_ref::<ApiError>()
            .is_some_and(ApiError::is_unauthorized)
        {
            eprintln!("Session expired or missing; run `catalog-admin login` again.");
        }
    }
    outcome
}

fn resolve_settings(cli: &Cli) -> ClientSettings {
    let mut settings = load_settings();
    if let Some(url) = &cli.api_url {
        settings.api_base_url = url.clone();
    }
    if let Some(path) = &cli.token_file {
        settings.token_path = path.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        settings.request_timeout_secs = secs;
    }
    settings
}

async fn run(command: Command, settings: &ClientSettings, api: Arc<ApiClient>) -> Result<()> {
    match command {
        Command::Captcha { out } => {
            let challenge = AuthSession::new(api).captcha().await?;
            let encoded = challenge
                .captcha_image
                .split_once("base64,")
                .map_or(challenge.captcha_image.as_str(), |(_, data)| data);
            let image = STANDARD
                .decode(encoded.trim())
                .context("captcha image is not valid base64")?;
            fs::write(&out, image)
                .with_context(|| format!("failed to write captcha to {}", out.display()))?;
            println!("captcha key: {}", challenge.captcha_key);
            println!("image saved to {}", out.display());
        }
        Command::Login {
            username,
            password,
            captcha_key,
            captcha_value,
        } => {
            let session = AuthSession::new(api);
            let user = session
                .login(&LoginRequest {
                    username,
                    password,
                    captcha_key,
                    captcha_value,
                })
                .await?;
            println!(
                "Logged in as {} (user_id={}{})",
                user.username,
                user.id,
                if user.is_admin { ", admin" } else { "" }
            );
        }
        Command::Logout => {
            AuthSession::new(api).logout().await;
            println!("Logged out.");
        }
        Command::Whoami => {
            let session = AuthSession::new(api);
            if !session.check_auth().await {
                bail!("not logged in");
            }
            let user = session
                .current_user()
                .await
                .ok_or_else(|| anyhow!("not logged in"))?;
            render::user(&user);
        }
        Command::Products(command) => run_products(command, settings, api).await?,
        Command::Categories(command) => {
            let store = CategoryStore::new(api);
            match command {
                CategoryCommand::List => render::categories(&store.refresh().await?),
                CategoryCommand::Add { name, description } => {
                    let created = store.create(&CategoryInput { name, description }).await?;
                    println!("Created category {} ({})", created.name, created.id);
                }
                CategoryCommand::Remove { id } => {
                    store.delete(CategoryId(id)).await?;
                    println!("Deleted category {id}");
                }
            }
        }
        Command::Platforms(command) => {
            let store = PlatformStore::new(api);
            match command {
                PlatformCommand::List => render::platforms(&store.refresh().await?),
                PlatformCommand::Add {
                    name,
                    website,
                    logo_url,
                    description,
                } => {
                    let created = store
                        .create(&PlatformInput {
                            name,
                            website,
                            logo_url,
                            description,
                        })
                        .await?;
                    println!("Created platform {} ({})", created.name, created.id);
                }
                PlatformCommand::Remove { id } => {
                    store.delete(PlatformId(id)).await?;
                    println!("Deleted platform {id}");
                }
            }
        }
        Command::Notifications(command) => {
            let inbox = NotificationInbox::new(api);
            match command {
                NotificationCommand::List { unread } => {
                    render::notifications(&inbox.refresh(unread).await?)
                }
                NotificationCommand::Read { id } => {
                    inbox.mark_read(NotificationId(id)).await?;
                    println!("Marked notification {id} as read");
                }
                NotificationCommand::ReadAll => {
                    inbox.mark_all_read().await?;
                    println!("Marked all notifications as read");
                }
                NotificationCommand::Delete { id } => {
                    inbox.delete(NotificationId(id)).await?;
                    println!("Deleted notification {id}");
                }
            }
        }
        Command::Stats => render::dashboard(&Dashboard::new(api).load().await?),
    }

    Ok(())
}

async fn run_products(
    command: ProductCommand,
    settings: &ClientSettings,
    api: Arc<ApiClient>,
) -> Result<()> {
    let catalog = ProductCatalog::from_settings(api, settings);
    match command {
        ProductCommand::List(args) => list_products(&catalog, args).await?,
        ProductCommand::Show { id } => render::product_detail(&catalog.get(ProductId(id)).await?),
        ProductCommand::Delete { id } => {
            catalog.delete(ProductId(id)).await?;
            println!("Deleted product {id}");
        }
        ProductCommand::Scrape { url } => {
            let product = catalog.scrape(&url).await?;
            println!("Imported product {} ({})", product.name, product.id);
            render::product_detail(&product);
        }
        ProductCommand::Import { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let inputs: Vec<ProductInput> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of products", file.display()))?;
            let mut drafts = BulkDraftList::new();
            for input in inputs {
                drafts.add(input);
            }
            let created = drafts.submit(&catalog).await?;
            println!("Imported {} products", created.len());
        }
    }
    Ok(())
}

async fn list_products(catalog: &ProductCatalog, args: ListArgs) -> Result<()> {
    let filters = ProductFilters {
        category_id: args.category.map(CategoryId),
        platform_id: args.platform.map(PlatformId),
        name: args.name.clone(),
        min_price: args.min_price,
        max_price: args.max_price,
    };
    filters.validate()?;

    let listing = catalog.listing();
    listing
        .set_filters(
            FilterPatch::new()
                .category(filters.category_id)
                .platform(filters.platform_id)
                .name(filters.name)
                .price_range(filters.min_price, filters.max_price),
        )
        .await;
    if let (Some(field), Some(order)) = (args.sort_field, args.sort_order) {
        listing.set_sorter(Sorter::new(field, order)).await;
    }
    if let Some(page_size) = args.page_size {
        listing.set_page_size(page_size).await;
    }
    listing.dispatch(QueryIntent::ChangePage(args.page)).await;

    let view = listing.snapshot().await;
    if view.phase == FetchPhase::Failed {
        bail!(
            "{} (re-run the command to retry)",
            view.error.unwrap_or_else(|| "failed to fetch product list".into())
        );
    }
    render::product_page(&view);
    Ok(())
}
