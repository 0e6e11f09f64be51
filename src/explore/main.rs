//! Command-line explorer for the postal-code catalog.
//!
//! Walks the same path a user takes on the map: pick a country, pick a city,
//! optionally filter and activate a record, then print what the table and
//! the map would show.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use postmap::explorer::{format_count, SelectOption};
use postmap::map::{HeadlessCanvas, MapCanvas};
use postmap::table::TableView;
use postmap::{CatalogClient, Config, Explorer, LoadOutcome};

#[derive(Parser, Debug)]
#[command(name = "explore")]
#[command(about = "Browse postal codes by country and city")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog URL, overrides the config file
    #[arg(long)]
    base_url: Option<String>,

    /// ISO country code, lists countries when omitted
    #[arg(long)]
    country: Option<String>,

    /// City name, lists cities when omitted
    #[arg(long, requires = "country")]
    city: Option<String>,

    /// Filter on postal code, place or region
    #[arg(long)]
    search: Option<String>,

    /// Row to make active, counted from 0 in the filtered table
    #[arg(long)]
    select: Option<usize>,

    /// Rows to print
    #[arg(long, default_value = "20")]
    limit: usize,

    /// Print the table as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(url) = &args.base_url {
        config.catalog.base_url = url.clone();
    }

    info!("Postmap explorer");
    info!("Catalog at {}", config.catalog.base_url);

    let client = CatalogClient::new(config.catalog.clone())?;
    let canvas = HeadlessCanvas::new(1280, 800)
        .with_zoom_range(config.map.min_zoom, config.map.max_zoom)
        .with_view(config.map.initial_center(), config.map.initial_zoom);
    let mut explorer = Explorer::new(client, canvas, &config);
    explorer.open_map("map")?;

    if explorer.load_countries().await == LoadOutcome::Failed {
        let message = explorer.store().snapshot().last_error.unwrap_or_default();
        bail!("Failed to load countries: {}", message);
    }

    let Some(country) = &args.country else {
        print_options("Countries", &explorer.country_options());
        return Ok(());
    };
    explorer
        .choose_country(&country.to_uppercase())
        .await
        .with_context(|| format!("Cannot select country {}", country))?;

    if let Some(stats) = explorer.store().snapshot().country_stats() {
        println!(
            "{} cities, {} postal codes, {} per city on average",
            format_count(stats.total_cities as u64),
            format_count(stats.total_postal_codes),
            format_count(stats.avg_postal_codes_per_city)
        );
    }

    let Some(city) = &args.city else {
        print_options("Cities", &explorer.city_options());
        return Ok(());
    };
    let outcome = explorer
        .choose_city(city)
        .await
        .with_context(|| format!("Cannot select city {}", city))?;
    if outcome == LoadOutcome::Failed {
        let message = explorer.store().snapshot().last_error.unwrap_or_default();
        bail!("Failed to load postal codes of {}: {}", city, message);
    }

    if let Some(query) = &args.search {
        explorer.search(query);
    }

    let mut view = explorer.render();
    if let Some(index) = args.select {
        let Some(row) = view.rows.get(index) else {
            bail!("Row {} out of range, {} rows", index, view.rows.len());
        };
        let record = row.record.clone();
        explorer.row_clicked(&record);
        view = explorer.render();
    }

    let state = explorer.store().snapshot();
    if let Some(stats) = state.city_stats() {
        println!(
            "{} of {} postal codes shown ({} expected), {} regions, centroid {:.4}, {:.4}",
            stats.filtered_count,
            stats.total_codes,
            stats.expected_codes,
            stats.regions,
            stats.centroid.lat,
            stats.centroid.lon
        );
    }

    let canvas = explorer.map().canvas();
    if let Some(center) = canvas.center() {
        println!(
            "Map: {} markers, center {:.4}, {:.4}, zoom {}",
            explorer.map().marker_count(),
            center.lat,
            center.lon,
            canvas.zoom()
        );
    }

    print_table(&view, args.limit, args.json)
}

fn print_options(title: &str, options: &[SelectOption]) {
    println!("{} ({}):", title, options.len());
    for option in options {
        println!("  {:<24} {}", option.value, option.label);
    }
}

fn print_table(view: &TableView, limit: usize, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    if let Some(message) = view.empty_message {
        println!("{}", message);
        return Ok(());
    }

    println!(
        "  {:<12} {:<28} {:<24} {:>10} {:>10}",
        "Code", "Place", "Region", "Lat", "Lon"
    );
    for row in view.rows.iter().take(limit) {
        let marker = if row.is_active { '*' } else { ' ' };
        println!(
            "{} {:<12} {:<28} {:<24} {:>10} {:>10}",
            marker, row.postal_code, row.place_name, row.region, row.latitude, row.longitude
        );
    }
    if view.rows.len() > limit {
        println!("  ... {} more", view.rows.len() - limit);
    }
    Ok(())
}
