use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use home_finder::compare::{AttributeValue, ComparisonRow, MAX_SELECTION};
use home_finder::config::{load_config, Backend, Config};
use home_finder::filters::{price_range, price_ranges, FilterSpec};
use home_finder::models::{Property, PropertyType};
use home_finder::repository::{LocalRepository, PropertyRepository, RemoteRepository};
use home_finder::sort::SortKey;
use home_finder::storage::JsonFileStore;
use home_finder::HomeFinder;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "home-finder", version, about = "Search, filter, favorite and compare property listings")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "home-finder.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List properties matching the saved filters
    Browse {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        sort: Option<SortKey>,
    },
    /// List featured properties
    Featured,
    /// Show one property in detail
    Show { id: String },
    /// Toggle a property's favorited state
    Favorite { id: String },
    /// List favorited properties
    Favorites {
        #[arg(long, default_value = "saved-newest")]
        sort: SortKey,
    },
    /// Remove every favorite
    ClearFavorites,
    /// Compare two or three favorites side by side; lists the candidates
    /// when no ids are given
    Compare {
        ids: Vec<String>,
        /// Accept any listing id, not only favorites
        #[arg(long)]
        any: bool,
    },
    /// Inspect or change the saved filters
    Filters {
        #[command(subcommand)]
        action: FilterAction,
    },
}

#[derive(Subcommand)]
enum FilterAction {
    Show,
    Reset,
    Set {
        #[arg(long)]
        price_min: Option<f64>,
        #[arg(long)]
        price_max: Option<f64>,
        /// Quick price range label, e.g. "$200K - $400K"
        #[arg(long, conflicts_with_all = ["price_min", "price_max"])]
        range: Option<String>,
        #[arg(long)]
        beds: Option<u32>,
        #[arg(long)]
        baths: Option<f64>,
        /// Property type; repeat to accept several
        #[arg(long = "type")]
        types: Vec<PropertyType>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        sqft: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli.config)?;
    let repository = open_repository(&config).await?;
    info!("Using {} property backend", repository.backend_name());

    let state = Arc::new(JsonFileStore::new(&config.storage.path));
    let finder = HomeFinder::open(repository, state)
        .await
        .with_context(|| format!("Failed to open state at {}", config.storage.path.display()))?;

    match cli.command {
        Command::Browse { search, sort } => {
            let sort = sort.unwrap_or(config.browse.default_sort);
            let properties = finder.browse(&search, sort).await?;
            println!("{} Properties Found (sorted by {})\n", properties.len(), sort.label());
            let favorites = finder.favorites();
            for (i, property) in properties.iter().enumerate() {
                let saved = favorites.is_favorite(&property.id).await;
                print_summary(i + 1, property, saved);
            }
        }
        Command::Featured => {
            let properties = finder.repository().featured().await?;
            for (i, property) in properties.iter().enumerate() {
                print_summary(i + 1, property, finder.favorites().is_favorite(&property.id).await);
            }
        }
        Command::Show { id } => {
            let property = finder.repository().get_property(&id).await?;
            print_detail(&property, finder.favorites().is_favorite(&id).await);
        }
        Command::Favorite { id } => {
            // Make sure the listing exists before saving it
            finder.repository().get_property(&id).await?;
            let status = finder.toggle_favorite(&id).await?;
            if status.is_favorite {
                println!("Added {} to favorites", id);
            } else {
                println!("Removed {} from favorites", id);
            }
        }
        Command::Favorites { sort } => {
            let saved = finder.saved_properties(sort).await?;
            println!(
                "{} saved {}\n",
                saved.len(),
                if saved.len() == 1 { "property" } else { "properties" }
            );
            for (i, entry) in saved.iter().enumerate() {
                print_summary(i + 1, &entry.property, true);
                if let Some(saved_at) = entry.saved_at {
                    println!("   Saved: {}", saved_at.format("%Y-%m-%d %H:%M"));
                }
                println!();
            }
        }
        Command::ClearFavorites => {
            let removed = finder.favorites().clear().await?;
            println!("Removed {} favorites", removed);
        }
        Command::Compare { ids, any } => {
            if ids.is_empty() {
                let candidates = finder.comparison_candidates().await?;
                println!("{} favorites available to compare\n", candidates.len());
                for (i, entry) in candidates.iter().enumerate() {
                    print_summary(i + 1, &entry.property, true);
                }
                return Ok(());
            }
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            let rows = if any {
                finder.compare_selection(&ids).await?
            } else {
                match finder.compare_favorites(&ids).await {
                    Err(e) if e.is_selection_full() => {
                        warn!("{}; comparing the first {}", e, MAX_SELECTION);
                        finder.compare_favorites(&ids[..MAX_SELECTION]).await?
                    }
                    other => other?,
                }
            };
            print_comparison(&rows);
        }
        Command::Filters { action } => run_filters(&finder, action).await?,
    }

    Ok(())
}

async fn open_repository(config: &Config) -> Result<Arc<dyn PropertyRepository>> {
    let repo = &config.repository;
    let normalizer = repo.shape.normalizer();
    let repository: Arc<dyn PropertyRepository> = match repo.backend {
        Backend::Local => Arc::new(
            LocalRepository::from_seed_file(&repo.seed_path, normalizer.as_ref())
                .await
                .with_context(|| format!("Failed to load {}", repo.seed_path.display()))?,
        ),
        Backend::Remote => {
            let base_url = repo
                .base_url
                .as_deref()
                .context("repository.base_url is required for the remote backend")?;
            Arc::new(RemoteRepository::new(
                base_url,
                &repo.table,
                Duration::from_secs(repo.timeout_secs),
                normalizer,
            )?)
        }
    };
    Ok(repository)
}

async fn run_filters(finder: &HomeFinder, action: FilterAction) -> Result<()> {
    let spec = match action {
        FilterAction::Show => finder.filters().current().await,
        FilterAction::Reset => finder.filters().reset().await?,
        FilterAction::Set {
            price_min,
            price_max,
            range,
            beds,
            baths,
            types,
            location,
            sqft,
        } => {
            let range = match range {
                Some(label) => Some(price_range(&label).with_context(|| {
                    let labels: Vec<_> = price_ranges().iter().map(|r| r.label).collect();
                    format!("Unknown price range '{}'. Choose one of: {}", label, labels.join(", "))
                })?),
                None => None,
            };
            finder
                .filters()
                .update(|f| {
                    if let Some(range) = &range {
                        f.apply_price_range(range);
                    }
                    f.price_min = price_min.or(f.price_min);
                    f.price_max = price_max.or(f.price_max);
                    f.bedrooms_min = beds.or(f.bedrooms_min);
                    f.bathrooms_min = baths.or(f.bathrooms_min);
                    if !types.is_empty() {
                        f.property_types = types.into_iter().collect();
                    }
                    f.location = location.or(f.location.take());
                    f.square_feet_min = sqft.or(f.square_feet_min);
                })
                .await?
        }
    };
    if let Err(e) = spec.validate() {
        warn!("{} (no property will match)", e);
    }
    print_filters(&spec);
    Ok(())
}

fn print_summary(index: usize, property: &Property, saved: bool) {
    println!(
        "{}. {} (${}){}",
        index,
        property.title,
        format_number(property.price),
        if saved { " ♥" } else { "" }
    );
    println!(
        "   {} · {} bd, {} ba, {} sqft",
        property.property_type,
        property.bedrooms,
        format_number(property.bathrooms),
        property.square_feet
    );
    println!("   {}, {}", property.address.street, property.location_label());
    println!("   ID: {}", property.id);
}

fn print_detail(property: &Property, saved: bool) {
    print_summary(1, property, saved);
    println!("   Status: {}", property.status);
    println!("   Year built: {}", property.year_built);
    if !property.amenities.is_empty() {
        println!("   Amenities: {}", property.amenities.join(", "));
    }
    if let Some(image) = property.primary_image() {
        println!("   Image: {} (+{} more)", image, property.images.len() - 1);
    }
    if !property.description.is_empty() {
        println!();
        println!("{}", property.description);
    }
}

fn print_comparison(rows: &[ComparisonRow]) {
    for row in rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|c| {
                let value = match &c.value {
                    AttributeValue::Number(n) => format_number(*n),
                    AttributeValue::Text(t) => t.clone(),
                };
                if c.is_best {
                    format!("{} *", value)
                } else {
                    value
                }
            })
            .collect();
        println!("{:<14} {}", row.label, cells.join(" | "));
    }
}

fn print_filters(spec: &FilterSpec) {
    if spec.is_empty() {
        println!("No filters set");
        return;
    }
    let show = |name: &str, value: Option<String>| {
        if let Some(v) = value {
            println!("{:<14} {}", name, v);
        }
    };
    show("Price min", spec.price_min.map(format_number));
    show("Price max", spec.price_max.map(format_number));
    show("Bedrooms", spec.bedrooms_min.map(|b| format!("{}+", b)));
    show("Bathrooms", spec.bathrooms_min.map(|b| format!("{}+", b)));
    if !spec.property_types.is_empty() {
        let kinds: Vec<&str> = spec.property_types.iter().map(|t| t.as_str()).collect();
        show("Types", Some(kinds.join(", ")));
    }
    show("Location", spec.location.clone());
    show("Min sqft", spec.square_feet_min.map(|s| s.to_string()));
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}
