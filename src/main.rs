use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDate;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use sentiment_dashboard::config::{DashboardConfig, ViewDefaults, DEFAULT_PORT, DEFAULT_THRESHOLD};
use sentiment_dashboard::error::QueryError;
use sentiment_dashboard::filter::parse_bound;
use sentiment_dashboard::generator::{write_csv, SampleGenerator};
use sentiment_dashboard::loader::Dataset;
use sentiment_dashboard::selection::{headline_for, price_info};
use sentiment_dashboard::types::{SentimentSelector, ALL_KINDS};
use sentiment_dashboard::{aggregate, tui, views, web};

#[derive(Parser)]
#[command(name = "sentiment-dashboard", about = "Stock prices and news sentiment dashboard")]
struct Cli {
    /// Run mode: tui, web, headless, or generate
    #[arg(long, default_value = "tui")]
    mode: String,

    /// Sentiment CSV to load (or write, in generate mode)
    #[arg(long, env = "SENTIMENT_DATA", default_value = "sentiment.csv")]
    data: PathBuf,

    /// Web server port (web mode only)
    #[arg(long, env = "DASHBOARD_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory of static dashboard assets (web mode only)
    #[arg(long, default_value = "static")]
    static_dir: PathBuf,

    /// Initial stock (defaults to the first one in the file)
    #[arg(long)]
    stock: Option<String>,

    /// Sentiment type: positive, neutral, negative, or all
    #[arg(long, default_value = "all")]
    sentiment: SentimentSelector,

    /// Sentiment threshold (0.0-1.0)
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Range start, YYYY-MM-DD (defaults to the earliest date)
    #[arg(long, value_parser = parse_cli_date)]
    start: Option<NaiveDate>,

    /// Range end, YYYY-MM-DD (defaults to the latest date)
    #[arg(long, value_parser = parse_cli_date)]
    end: Option<NaiveDate>,

    /// Month to show price info for (headless mode)
    #[arg(long, value_parser = parse_cli_date)]
    month: Option<NaiveDate>,

    /// Date to show the headline for (headless mode)
    #[arg(long, value_parser = parse_cli_date)]
    date: Option<NaiveDate>,

    /// First calendar day of generated data (generate mode)
    #[arg(long, value_parser = parse_cli_date, default_value = "2023-01-02")]
    generate_from: NaiveDate,

    /// Calendar days of generated data (generate mode)
    #[arg(long, default_value = "365")]
    days: usize,

    /// Random seed (generate mode)
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Log file for tui mode; logging is discarded otherwise
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, QueryError> {
    parse_bound(s)
}

impl Cli {
    fn config(&self) -> DashboardConfig {
        DashboardConfig {
            data_path: self.data.clone(),
            port: self.port,
            static_dir: self.static_dir.clone(),
            view: ViewDefaults {
                stock: self.stock.clone(),
                selector: self.sentiment,
                threshold: self.threshold,
                start: self.start,
                end: self.end,
            },
        }
    }
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // The terminal UI owns the screen, so its logs go to a file or nowhere.
    let (writer, ansi) = match (cli.mode.as_str(), &cli.log_file) {
        ("tui", Some(path)) => (BoxMakeWriter::new(Mutex::new(std::fs::File::create(path)?)), false),
        ("tui", None) => (BoxMakeWriter::new(std::io::sink), false),
        _ => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(ansi);
    if json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli)?;
    let config = cli.config();

    if cli.mode == "generate" {
        let rows = SampleGenerator::new(cli.seed).generate(cli.generate_from, cli.days);
        write_csv(&config.data_path, &rows)?;
        return Ok(());
    }

    let dataset = Dataset::load(&config.data_path)?;
    if dataset.is_empty() {
        warn!(path = %config.data_path.display(), "no usable rows in dataset");
    }

    match cli.mode.as_str() {
        "tui" => tui::run(&config, &dataset)?,
        "web" => web::run(config, dataset).await?,
        "headless" => run_headless(&config, &dataset, cli.month, cli.date)?,
        other => eprintln!("Unknown mode: {other}. Use --mode tui|web|headless|generate"),
    }

    Ok(())
}

fn run_headless(
    config: &DashboardConfig,
    dataset: &Dataset,
    month: Option<NaiveDate>,
    date: Option<NaiveDate>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(query) = config.view.resolve(dataset) else {
        return Err("dataset is empty, nothing to report".into());
    };
    info!(stock = %query.stock, start = %query.start, end = %query.end, "headless report");

    let snap = views::snapshot(dataset, &query);

    println!("=== sentiment-dashboard (headless) ===");
    println!("Stock: {}  Range: {} .. {}", query.stock, query.start, query.end);
    println!("Sentiment: {}  Threshold: {:.2}", query.selector.label(), query.threshold);
    println!("Symbols: {}", dataset.symbols().join(", "));
    println!();

    println!("  Price points:       {}", snap.line.prices.len());
    println!("  Sentiment markers:  {}", snap.line.markers.len());
    for kind in ALL_KINDS {
        let n = snap.line.markers.iter().filter(|m| m.label == kind).count();
        println!("    {:<10} {}", kind.label(), n);
    }
    println!();

    println!("  Monthly:");
    println!("    {:<12} {:>10} {:>10} {:>9} {:>7}", "month", "compound", "price", "change", "scaled");
    for b in &snap.monthly {
        println!(
            "    {:<12} {:>10.3} {:>10.2} {:>9} {:>7}",
            b.month_end.to_string(),
            b.compound,
            b.price,
            b.pct_change.map_or("-".to_string(), |p| format!("{p:+.2}%")),
            b.scaled_pct_change.map_or("-".to_string(), |s| format!("{s:.3}")),
        );
    }
    println!();

    match &snap.composition {
        Some(c) => {
            println!("  Composition:");
            for kind in ALL_KINDS {
                println!("    {:<10} {:.2}", kind.label(), c.get(kind));
            }
        }
        None => println!("  Composition: no data"),
    }

    if let Some(m) = month {
        let month_end = aggregate::month_end(m);
        println!();
        match price_info(&snap.monthly, month_end) {
            Some(info) => println!(
                "  Price Information ({}): Price: {}  Percent Change: {}",
                month_end,
                info.price_text(),
                info.pct_change_text()
            ),
            None => println!("  Price Information ({}): no data", month_end),
        }
    }

    if let Some(d) = date {
        println!();
        println!("  {}", headline_for(dataset, &query.stock, d).message());
    }

    Ok(())
}
