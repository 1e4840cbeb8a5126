use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

mod app;
mod ui;

use app::{App, AppEvent};
use cosmic::api::ApiClient;
use cosmic::config::{Config, API_BASE_ENV};
use cosmic::controller::{Controller, NoticeLevel};
use cosmic::session::SessionStore;
use cosmic::storage::{Database, DatabaseError};

/// Get the config directory path (~/.config/cosmic/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("cosmic");
    Ok(config_dir)
}

/// Delete the client database and its WAL sidecars.
///
/// Returns `false` when there was no database to delete.
fn reset_session(db_path: &Path) -> Result<bool> {
    let removed = match std::fs::remove_file(db_path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(e).context("Failed to delete client database"),
    };
    for suffix in ["-wal", "-shm"] {
        let mut sidecar = db_path.as_os_str().to_owned();
        sidecar.push(suffix);
        if let Err(e) = std::fs::remove_file(&sidecar) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = ?sidecar, error = %e, "Failed to delete database sidecar");
            }
        }
    }
    Ok(removed)
}

#[derive(Parser, Debug)]
#[command(name = "cosmic", about = "Terminal client for the Cosmic blog API")]
struct Args {
    /// API base URL (overrides COSMIC_API_BASE and the config file)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Register an account and store its token, then exit
    #[arg(long, num_args = 2, value_names = ["USERNAME", "EMAIL"])]
    register: Option<Vec<String>>,

    /// Sign out and forget the stored token, then exit
    #[arg(long)]
    logout: bool,

    /// Check that the server is reachable, then exit
    #[arg(long)]
    health: bool,

    /// Print the most used tags, then exit
    #[arg(long)]
    top_tags: bool,

    /// Delete the local client database (stored session included)
    #[arg(long)]
    reset_session: bool,
}

impl Args {
    fn is_one_shot(&self) -> bool {
        self.register.is_some() || self.logout || self.health || self.top_tags
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent unless RUST_LOG is set
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // User-only access: the database holds the bearer token
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config = Config::load(&config_dir.join("config.toml")).context("Failed to load config")?;
    let env_base = std::env::var(API_BASE_ENV).ok();
    let base_url = config.resolve_base_url(args.base_url.as_deref(), env_base.as_deref());

    let db_path = config_dir.join("client.db");

    // Handle --reset-session flag
    if args.reset_session {
        if reset_session(&db_path)? {
            println!("Session reset.");
        } else {
            println!("No stored session.");
        }
        if !args.is_one_shot() {
            return Ok(());
        }
    }

    // Open database
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: {}", DatabaseError::InstanceLocked);
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let session = SessionStore::load(db)
        .await
        .context("Failed to restore session")?;
    let api = ApiClient::new(&base_url, session)
        .with_context(|| format!("Invalid API base URL '{}'", base_url))?;
    tracing::info!(base_url = %api.base_url(), "API client ready");

    let mut controller = Controller::new(api, config.settings());

    if args.is_one_shot() {
        let ok = run_one_shot(&mut controller, &args).await?;
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut app = App::new(controller);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Run the TUI
    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}

/// Run the non-interactive flags through the controller.
///
/// Returns `false` when the last notice was an error.
async fn run_one_shot(controller: &mut Controller, args: &Args) -> Result<bool> {
    if args.logout {
        controller.logout().await.context("Failed to sign out")?;
        print_notice(controller);
    }

    if let Some([username, email]) = args.register.as_deref() {
        match controller.register(username, email) {
            Ok(tasks) => controller.run(tasks).await,
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(false);
            }
        }
        if !print_notice(controller) {
            return Ok(false);
        }
    }

    if args.health {
        let tasks = controller.check_health();
        controller.run(tasks).await;
        if !print_notice(controller) {
            return Ok(false);
        }
    }

    if args.top_tags {
        let tasks = controller.load_top_tags();
        controller.run(tasks).await;
        if !print_notice(controller) {
            return Ok(false);
        }
        if controller.top_tags().is_empty() {
            println!("No tags");
        }
        for entry in controller.top_tags() {
            println!("{:>6}  #{}", entry.count, cosmic::util::single_line(&entry.tag));
        }
    }

    Ok(true)
}

/// Print and dismiss the current notice. Returns `false` for an error notice.
fn print_notice(controller: &mut Controller) -> bool {
    let ok = match controller.notice() {
        Some(notice) if notice.level == NoticeLevel::Error => {
            eprintln!("Error: {}", notice.message);
            false
        }
        Some(notice) => {
            println!("{}", notice.message);
            true
        }
        None => true,
    };
    controller.dismiss_notice();
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_db(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cosmic-{}-{}.db", name, std::process::id()))
    }

    #[test]
    fn test_reset_session_without_database() {
        let path = scratch_db("missing");
        let _ = std::fs::remove_file(&path);
        assert!(!reset_session(&path).unwrap());
    }

    #[test]
    fn test_reset_session_removes_database_and_sidecars() {
        let path = scratch_db("present");
        let wal = PathBuf::from(format!("{}-wal", path.display()));
        std::fs::write(&path, b"db").unwrap();
        std::fs::write(&wal, b"wal").unwrap();

        assert!(reset_session(&path).unwrap());
        assert!(!path.exists());
        assert!(!wal.exists());
    }

    #[test]
    fn test_reset_session_alone_is_not_one_shot() {
        let args = Args::try_parse_from(["cosmic", "--reset-session"]).unwrap();
        assert!(args.reset_session);
        assert!(!args.is_one_shot());

        let args = Args::try_parse_from(["cosmic", "--reset-session", "--health"]).unwrap();
        assert!(args.is_one_shot());
    }
}
