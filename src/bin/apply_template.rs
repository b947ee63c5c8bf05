//! Re-applies the default activity template to stored weeks.

use clap::Parser;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};
use weekly_tracker::{
    clock::SystemClock,
    config::resolve_data_path,
    load_data, persist_data,
    template::{ReseedOptions, Template, reseed},
};

#[derive(Parser, Debug)]
#[command(name = "apply_template")]
#[command(about = "Applies the default activity template to one user or every user", long_about = None)]
struct Args {
    /// Only process this user (default: every user)
    #[arg(long, value_name = "USERNAME")]
    user: Option<String>,

    /// Delete the user's own activities before applying the template
    #[arg(long)]
    clear_existing: bool,

    /// Only apply to the current week
    #[arg(long)]
    current_week_only: bool,

    /// Data file (default: $APP_DATA_PATH or data/tracker.json)
    #[arg(long, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Template file (default: $TRACKER_TEMPLATE_PATH or the built-in template)
    #[arg(long, value_name = "PATH")]
    template: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args = Args::parse();
    let data_path = args.data.unwrap_or_else(resolve_data_path);
    let template_path = args
        .template
        .or_else(|| std::env::var("TRACKER_TEMPLATE_PATH").ok().map(PathBuf::from));
    let template = Template::from_config(template_path.as_deref())?;

    let mut data = load_data(&data_path).await?;
    let options = ReseedOptions {
        username: args.user,
        clear_existing: args.clear_existing,
        current_week_only: args.current_week_only,
    };

    let report = match reseed(&mut data, &template, &SystemClock, &options) {
        Ok(report) => report,
        Err(err) => {
            error!("reseed aborted: {err}");
            return Err(err.into());
        }
    };
    persist_data(&data_path, &data).await?;

    println!("Applied template '{}' v{}", template.name, template.version);
    for user in &report.users {
        println!("\n{}", user.username);
        for week in &user.weeks {
            println!(
                "  {} - {}: removed {} custom, {} default; created {}",
                week.start_date, week.end_date, week.deleted_custom, week.deleted_default, week.created
            );
        }
        println!("  total: deleted {}, created {}", user.deleted(), user.created());
    }
    println!(
        "\nUsers processed: {}\nDeleted: {}\nCreated: {}",
        report.users.len(),
        report.total_deleted(),
        report.total_created()
    );

    Ok(())
}
