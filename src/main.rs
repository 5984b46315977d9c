use certsync::{output, runner, Cli};
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter())),
        )
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.json {
        let result = runner::run(&cli.conf, &|_| {}, &|_| {}).await?;
        return output::print_json(&result);
    }

    let result = runner::run(
        &cli.conf,
        &output::print_local_certificate,
        &output::print_reconcile_report,
    )
    .await?;

    println!();
    output::print_success(&format!(
        "{} provider(s) reconciled",
        result.reports.len()
    ));
    Ok(())
}
