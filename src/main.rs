use ai_stays::{Backend, FallbackOrchestrator, Listing, ProviderConfig, SearchSession};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Ask a generative AI for four places to stay and print them.
#[derive(Parser, Debug)]
#[command(name = "ai-stays", version, about)]
struct Cli {
    /// Where to stay, e.g. "Lisbon"
    destination: String,

    /// Check-in date (YYYY-MM-DD)
    #[arg(long)]
    check_in: Option<NaiveDate>,

    /// Check-out date (YYYY-MM-DD)
    #[arg(long)]
    check_out: Option<NaiveDate>,

    /// Provider family: gemini or mistral
    #[arg(long, default_value = "gemini")]
    backend: Backend,

    #[arg(long)]
    max_price: Option<f64>,

    #[arg(long)]
    min_rating: Option<f64>,

    /// Only listings carrying a special offer
    #[arg(long)]
    offers_only: bool,

    /// Print the visible listings as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ProviderConfig::from_env().context("Reading provider configuration")?;
    let orchestrator = FallbackOrchestrator::from_config(&config, cli.backend)?;
    info!(
        primary = orchestrator.primary_name(),
        fallback = orchestrator.fallback_name(),
        "Providers ready"
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling search");
            on_interrupt.cancel();
        }
    });

    let mut session = SearchSession::new(orchestrator);
    session.destination = cli.destination;
    session.check_in = cli.check_in;
    session.check_out = cli.check_out;
    session.search(&cancel).await;

    if let Some(message) = session.error() {
        bail!("{}", message);
    }

    if let Some(max_price) = cli.max_price {
        session.filters.max_price = max_price;
    }
    if let Some(min_rating) = cli.min_rating {
        session.filters.min_rating = min_rating;
    }
    session.filters.offers_only = cli.offers_only;

    let visible = session.visible_listings();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
        return Ok(());
    }

    if visible.is_empty() {
        println!("No stays match your filters. Try adjusting them to see more results.");
        return Ok(());
    }

    for (i, listing) in visible.iter().enumerate() {
        print_listing(i + 1, listing);
    }
    if let Some(provider) = session.served_by() {
        println!("Generated by {}", provider);
    }

    Ok(())
}

fn print_listing(position: usize, listing: &Listing) {
    let pick = if listing.ai_suggested() { "  [AI pick]" } else { "" };
    println!("{}. {}{}", position, listing.name, pick);
    println!("   {}", listing.tagline);
    println!(
        "   £{:.0}/night, {:.1} ({} reviews), {}",
        listing.price_per_night, listing.rating, listing.review_count, listing.style
    );
    println!("   {}", listing.location);
    let amenities: Vec<&str> = listing.amenities.iter().map(|a| a.label()).collect();
    println!("   Amenities: {}", amenities.join(", "));
    println!("   \"{}\"", listing.guest_highlight);
    if let Some(offer) = listing.special_offer.as_deref().filter(|_| listing.has_offer()) {
        println!("   Offer: {}", offer);
    }
    println!();
}
