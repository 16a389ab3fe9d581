//! Speedtest Publisher - Main CLI Application
//!
//! Runs one measurement pass (ping, download, upload), publishes the result
//! over MQTT and exits. Scheduling is left to cron or a systemd timer.

use clap::Parser;
use speedtest_publisher::{
    app::App,
    cli::Cli,
    config::{display_config_summary, load_config, Config, EnvManager},
    error::{AppError, ErrorReporter, Result},
    logging::LoggerFactory,
    output::{render_summary, OutputFormatterFactory},
    PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();

    if cli.help_env {
        println!("{}", EnvManager::display_env_help());
        return;
    }

    if cli.debug {
        println!("{} v{}", PKG_NAME, VERSION);
        println!("Debug mode enabled");
        println!("{}", cli.get_config_summary());
    }

    let config = match load_config(cli.clone()) {
        Ok(config) => config,
        // ENABLE_COLOR is not known yet
        Err(e) => exit_with_error(&e, cli.color_override().unwrap_or(true), cli.verbose),
    };

    if let Err(e) = run_application(&cli, &config).await {
        exit_with_error(&e, config.enable_color, config.verbose);
    }
}

/// Main application logic
async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    if cli.dry_run {
        println!("{}", display_config_summary(config));
        println!();
        println!("Configuration is valid; dry run, nothing measured or published.");
        return Ok(());
    }

    if config.debug {
        println!("Configuration loaded successfully:");
        println!("{}", display_config_summary(config));
        println!();
    }

    let factory = LoggerFactory::new(config.clone());
    let mut app = App::from_config(config.clone())?.with_loggers(
        factory.create_measurement_logger().await,
        factory.create_error_logger().await,
    );

    let report = app.execute().await?;

    if config.verbose {
        let formatter = OutputFormatterFactory::create_formatter(config.enable_color);
        println!();
        println!("{}", render_summary(formatter.as_ref(), &report, config.percentile)?);
    }

    Ok(())
}

/// Report `error` and exit with its code
fn exit_with_error(error: &AppError, use_color: bool, verbose: bool) -> ! {
    ErrorReporter::new(use_color, verbose).report_error(error);
    print_error_suggestions(error);
    process::exit(error.exit_code());
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Run with --help-env to list supported variables");
            eprintln!("  - Iteration plans may have at most 9 comma-separated counts");
            eprintln!("  - PERCENTILE must leave a valid rank for the planned transfers");
        }
        AppError::ProbeTimeout(_) => {
            eprintln!();
            eprintln!("Latency probe help:");
            eprintln!("  - Check that PING_HOST accepts connections on port 443");
            eprintln!("  - Set PING_MAX_ATTEMPTS=0 to retry without limit");
        }
        AppError::Publish(_) => {
            eprintln!();
            eprintln!("Broker troubleshooting:");
            eprintln!("  - Verify MQTT_SERVER and MQTT_SERVER_PORT");
            eprintln!("  - Set both MQTT_USERNAME and MQTT_PASSWORD if the broker needs auth");
        }
        AppError::HttpRequest(_) | AppError::Timeout(_) => {
            eprintln!();
            eprintln!("Speed-test troubleshooting:");
            eprintln!("  - Check SPEEDTEST_URL");
            eprintln!("  - Increase TIMEOUT_SECONDS or use --timeout");
        }
        _ => {}
    }
}
