use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "autoeval")]
#[command(about = "Automated filling of SPA evaluation forms")]
#[command(version)]
struct Cli {
    /// Config file to run
    config: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Target URL (overrides config)
    #[arg(long)]
    url: Option<String>,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> autoeval::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut config = autoeval::Config::load(&cli.config)?;

    if cli.check {
        println!("Config valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        println!("  Fill view prefix: {}", config.fill.route_prefix);
        println!("  Retry attempts: {}", config.fill.max_retry_attempts);
        println!("  TA pool: {} answers", config.fill.ta_pool.len());
        println!("  Course pool: {} answers", config.fill.course_pool.len());
        println!("  Block auto-submit: {}", config.fill.block_auto_submit);
        return Ok(());
    }

    if cli.headless {
        config.browser.headless = true;
    }
    if let Some(url) = cli.url {
        config.target.url = url;
    }

    println!("Running: {}", config.name);

    let stealth = eoka::StealthConfig {
        headless: config.browser.headless,
        proxy: config.browser.proxy.clone(),
        user_agent: config.browser.user_agent.clone(),
        viewport_width: config.browser.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
        viewport_height: config.browser.viewport.as_ref().map(|v| v.height).unwrap_or(720),
        ..Default::default()
    };

    let browser = eoka::Browser::launch_with_config(stealth).await?;
    let page = browser.new_page("about:blank").await?;

    info!("navigating to {}", config.target.url);
    page.goto(&config.target.url).await?;

    let mut watcher = autoeval::PageWatcher::new(config);
    tokio::select! {
        result = watcher.run(&page) => result?,
        _ = tokio::signal::ctrl_c() => info!("interrupted, shutting down"),
    }

    browser.close().await?;
    Ok(())
}
