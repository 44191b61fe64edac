//! taskdeck CLI - a role-gated task and project tracker.

use clap::Parser;
use std::process;
use taskdeck::cli::{Cli, Commands, ProjectCommands, TaskCommands};
use taskdeck::commands::{self, AppContext, output};
use taskdeck::config::{self, ConfigFile, OutputFormat};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so JSON output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TD_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Data dir: --data-dir flag > TD_DATA_DIR env > platform data dir
    let data_dir = config::resolve_data_dir(cli.data_dir.clone()).value;

    let config_file = ConfigFile::load(&data_dir).unwrap_or_default();
    let format = config::resolve_output_format(cli.human_readable, &config_file).value;

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => fail(&taskdeck::Error::Io(e), format),
    };

    if let Err(e) = runtime.block_on(run_command(cli.command, &data_dir, format)) {
        fail(&e, format);
    }
}

fn fail(e: &taskdeck::Error, format: OutputFormat) -> ! {
    match format {
        OutputFormat::Human => eprintln!("Error: {}", e),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": e.to_string() })),
    }
    process::exit(1);
}

async fn run_command(
    command: Commands,
    data_dir: &std::path::Path,
    format: OutputFormat,
) -> Result<(), taskdeck::Error> {
    let ctx = AppContext::open(data_dir).await?;

    match command {
        Commands::Signup {
            email,
            password,
            username,
            role,
        } => {
            let result = commands::signup(&ctx, &email, &password, &username, &role).await?;
            output(&result, format);
        }

        Commands::Login { email, password } => {
            let result = commands::login(&ctx, &email, &password).await?;
            output(&result, format);
        }

        Commands::Logout => {
            let result = commands::logout(&ctx).await?;
            output(&result, format);
        }

        Commands::Whoami => {
            let result = commands::whoami(&ctx).await?;
            output(&result, format);
        }

        Commands::Dashboard => {
            let result = commands::dashboard(&ctx).await?;
            output(&result, format);
        }

        Commands::Task { command } => match command {
            TaskCommands::Create {
                name,
                description,
                assignee,
                due,
            } => {
                let result =
                    commands::task_create(&ctx, &name, &description, &assignee, &due).await?;
                output(&result, format);
            }
            TaskCommands::List => {
                let result = commands::task_list(&ctx).await?;
                output(&result, format);
            }
            TaskCommands::Toggle { id } => {
                let result = commands::task_toggle(&ctx, &id).await?;
                output(&result, format);
            }
            TaskCommands::Progress { id, percent } => {
                let result = commands::task_progress(&ctx, &id, percent).await?;
                output(&result, format);
            }
            TaskCommands::Delete { id, yes } => {
                let result = commands::task_delete(&ctx, &id, yes).await?;
                output(&result, format);
            }
            TaskCommands::Watch { count } => {
                let result = commands::task_watch(&ctx, count, format).await?;
                output(&result, format);
            }
        },

        Commands::Project { command } => match command {
            ProjectCommands::Create {
                title,
                description,
                teammates,
            } => {
                let result =
                    commands::project_create(&ctx, &title, &description, teammates).await?;
                output(&result, format);
            }
            ProjectCommands::List => {
                let result = commands::project_list(&ctx).await?;
                output(&result, format);
            }
        },
    }

    Ok(())
}
