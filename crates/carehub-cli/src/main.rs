//! CareHub console - command-line access to the CareHub administrative API.
//!
//! Shares the dashboard's session handling: a durable session file, the
//! same auth key registry and the same forced-logout behavior on 401.

mod credentials;
mod observer;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use carehub_core::api::MultipartPayload;
use carehub_core::session::{FileStore, MemoryStore};
use carehub_core::{ApiClient, AppConfig, AuthService, ClientConfig, SessionScope};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use credentials::CredentialStore;
use observer::{ConsoleObserver, CONSOLE_PATH, LOGIN_PATH};

const USAGE: &str = "\
Usage: carehub <command> [args]

Commands:
  login <email> [--remember]    Log in (remembered passwords come from the OS keychain)
  superuser-login <email>       Log in to the superuser area
  logout                        End the session everywhere
  forget <email>                Remove a remembered password
  whoami                        Show the logged-in account
  get <path>                    GET a path and print the JSON response
  post <path> <json>            POST a JSON body
  upload <path> <field> <file>  POST a file as multipart form data";

/// Initialize the tracing subscriber: stderr plus a daily log file.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::daily(log_dir, "carehub.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(filter)
        .init();
    guard
}

struct Console {
    app_config: AppConfig,
    api: ApiClient,
    auth: AuthService,
    observer: Arc<ConsoleObserver>,
}

impl Console {
    fn new(app_config: AppConfig, data_dir: &Path) -> Result<Self> {
        let mut config = ClientConfig::from_env()?;
        app_config.apply(&mut config);

        let observer = Arc::new(ConsoleObserver::new());
        let api = ApiClient::builder(config)
            .primary_store(Arc::new(FileStore::in_dir(data_dir)))
            .mirror_store(Arc::new(MemoryStore::new()))
            .observer(observer.clone())
            .build()?;

        // Reuse a persisted session's token as the cached default header.
        if let Some(token) = api.session().token() {
            api.set_auth_header(&token)?;
        }

        Ok(Self {
            app_config,
            auth: AuthService::new(api.clone()),
            api,
            observer,
        })
    }

    async fn run(&mut self, args: &[String]) -> Result<()> {
        let command = args.first().map(String::as_str).unwrap_or("help");
        let rest = &args[1.min(args.len())..];

        match (command, rest) {
            ("login", [email, flags @ ..]) => {
                let remember = flags.iter().any(|f| f == "--remember");
                self.login(email, remember).await
            }
            ("superuser-login", [email]) => self.superuser_login(email).await,
            ("logout", []) => {
                let report = self.auth.logout().await;
                println!(
                    "Logged out ({} keys, {} cookies removed)",
                    report.keys_removed, report.cookies_expired
                );
                Ok(())
            }
            ("forget", [email]) => {
                CredentialStore::delete(email)?;
                println!("Forgot password for {}", email);
                Ok(())
            }
            ("whoami", []) => {
                match self.auth.current_user() {
                    Some(user) => println!("{} <{}> [{}]", user.display_name(), user.email, user.role.as_str()),
                    None => println!("Not logged in"),
                }
                if self.api.session().get_scoped(SessionScope::Superuser).is_some() {
                    println!("Superuser session active");
                }
                Ok(())
            }
            ("get", [path]) => {
                let value: serde_json::Value = self.api.get(path).await?;
                print_json(&value)
            }
            ("post", [path, body]) => {
                let body: serde_json::Value =
                    serde_json::from_str(body).context("Body is not valid JSON")?;
                let value: serde_json::Value = self.api.post(path, &body).await?;
                print_json(&value)
            }
            ("upload", [path, field, file]) => self.upload(path, field, Path::new(file)).await,
            ("help" | "--help" | "-h", _) => {
                println!("{}", USAGE);
                Ok(())
            }
            _ => bail!("Unrecognized command\n\n{}", USAGE),
        }
    }

    async fn login(&mut self, email: &str, remember: bool) -> Result<()> {
        let password = match CredentialStore::get_password(email) {
            Some(password) => password,
            None => rpassword::prompt_password(format!("Password for {}: ", email))
                .context("Failed to read password")?,
        };

        self.observer.enter(LOGIN_PATH);
        let result = self.auth.login(email, &password).await;
        self.observer.enter(CONSOLE_PATH);
        let session = result?;

        if remember {
            CredentialStore::store(email, &password)?;
        }
        self.app_config.last_email = Some(email.to_string());
        self.app_config.save()?;

        info!(user = %session.user.email, "Logged in");
        println!("Welcome, {}", session.user.display_name());
        Ok(())
    }

    async fn superuser_login(&self, email: &str) -> Result<()> {
        let password = rpassword::prompt_password(format!("Superuser password for {}: ", email))
            .context("Failed to read password")?;

        self.observer.enter(LOGIN_PATH);
        let result = self.auth.superuser_login(email, &password).await;
        self.observer.enter(CONSOLE_PATH);

        let session = result?;
        println!("Superuser session for {}", session.user.email);
        Ok(())
    }

    async fn upload(&self, path: &str, field: &str, file: &Path) -> Result<()> {
        let bytes = std::fs::read(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let payload = MultipartPayload::new().file(field, file_name, None, bytes);
        let value: serde_json::Value = self.api.upload(path, payload).await?;
        print_json(&value)
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let app_config = AppConfig::load()?;
    let data_dir = app_config
        .data_dir()
        .unwrap_or_else(|_| PathBuf::from("./carehub-data"));
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let _log_guard = init_tracing(&data_dir);
    info!("CareHub console starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut console = Console::new(app_config, &data_dir)?;
    let result = console.run(&args).await;

    if let Some(target) = console.observer.take_redirect() {
        eprintln!("Session expired. Log in again (dashboard would open {}).", target);
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
