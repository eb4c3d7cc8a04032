use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use obs_object_store::{ObjectClient, ObjectKey, ObsStorage, ObsStorageConfig};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "obs-cli")]
#[command(about = "CLI for reading and writing objects in an OBS bucket", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Whole-request timeout in seconds
    #[arg(long, env = "OBS_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a file as an object
    Put {
        /// Object key
        key: String,
        /// File path to upload
        file: String,
    },

    /// Download an object
    Get {
        /// Object key
        key: String,
        /// Output file path; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List objects and common prefixes
    List {
        /// Prefix to filter objects
        #[arg(short, long, default_value = "")]
        prefix: String,
        /// Delimiter used to group keys into common prefixes
        #[arg(short, long, default_value = "/")]
        delimiter: String,
    },

    /// Delete an object
    Delete {
        /// Object key
        key: String,
    },
}

impl Cli {
    fn init_logging(&self) {
        let env_filter = match self.log_level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        };

        tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter)),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn object_key(key: &str) -> Result<ObjectKey> {
    ObjectKey::new(key.to_string()).with_context(|| format!("invalid object key '{}'", key))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let matches = ObsStorageConfig::register_flags(Cli::command()).get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    cli.init_logging();

    let mut config = ObsStorageConfig::from_arg_matches(&matches);
    config.timeout_secs = cli.timeout_secs;

    let storage = ObsStorage::new(&config).context("failed to set up OBS client")?;

    match cli.command {
        Commands::Put { key, file } => {
            let key = object_key(&key)?;
            let file = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("failed to open {}", file))?;

            storage
                .put_object(&key, Box::new(BufReader::new(file)))
                .await
                .with_context(|| format!("failed to upload {}", key))?;
            info!(key = %key, bucket = storage.bucket(), "uploaded object");
        }
        Commands::Get { key, output } => {
            let key = object_key(&key)?;
            let mut reader = storage
                .get_object(&key)
                .await
                .with_context(|| format!("failed to download {}", key))?;

            let copied = match output {
                Some(path) => {
                    let mut file = tokio::fs::File::create(&path)
                        .await
                        .with_context(|| format!("failed to create {}", path))?;
                    let copied = tokio::io::copy(&mut reader, &mut file).await?;
                    file.flush().await?;
                    copied
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    let copied = tokio::io::copy(&mut reader, &mut stdout).await?;
                    stdout.flush().await?;
                    copied
                }
            };
            info!(key = %key, bytes = copied, "downloaded object");
        }
        Commands::List { prefix, delimiter } => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let listing = storage
                .list_cancellable(&prefix, &delimiter, &cancel)
                .await
                .with_context(|| format!("failed to list '{}'", prefix))?;

            for common_prefix in &listing.common_prefixes {
                println!("{}", common_prefix);
            }
            for object in &listing.objects {
                println!("{}\t{}", object.size, object.key);
            }
        }
        Commands::Delete { key } => {
            let key = object_key(&key)?;
            storage
                .delete_object(&key)
                .await
                .with_context(|| format!("failed to delete {}", key))?;
            info!(key = %key, "deleted object");
        }
    }

    storage.stop();
    Ok(())
}
