//! modelpush CLI - publish a local model folder to the HuggingFace Hub.

use std::path::{Component, PathBuf};

use clap::{Parser, Subcommand};
use modelpush_core::{RepoId, RepoKind, SecretString, UploadConfig, DEFAULT_INFERENCE_ENDPOINT};
use modelpush_hub::{
    resolve_token, save_token, HttpHub, HubApi, InferenceClient, TokenSource, UploadOutcome,
};

mod progress;

use progress::SpinnerReporter;

#[derive(Parser)]
#[command(name = "modelpush")]
#[command(author, version, about = "Upload a local model folder to the HuggingFace Hub", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a folder to a Hub repository, creating the repository if needed
    Upload {
        /// Local folder with the model files
        path: Option<PathBuf>,

        /// Target repository (e.g. "username/model-name")
        #[arg(short, long)]
        repo_id: Option<RepoId>,

        /// Write token (falls back to HF_TOKEN, then to a saved login)
        #[arg(short, long)]
        token: Option<String>,

        /// Path to upload configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Commit summary
        #[arg(short = 'm', long)]
        commit_message: Option<String>,

        /// Commit description
        #[arg(long)]
        description: Option<String>,

        /// Repository type: model or dataset
        #[arg(long)]
        repo_type: Option<RepoKind>,

        /// Branch to commit to
        #[arg(long)]
        revision: Option<String>,

        /// Create the repository as private
        #[arg(long)]
        private: bool,

        /// Hub base URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Extra ignore pattern (repeatable, gitignore syntax)
        #[arg(long = "ignore")]
        ignore: Vec<String>,
    },

    /// Show the account behind the current token
    Whoami {
        /// Token to check instead of the resolved one
        #[arg(short, long)]
        token: Option<String>,

        /// Hub base URL
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Verify a token and save it for later runs
    Login {
        /// Write token
        #[arg(short, long)]
        token: String,

        /// Hub base URL
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Classify an image with a model served by the hosted inference API
    Classify {
        /// Image file to send
        image: PathBuf,

        /// Model repository (e.g. "username/model-name")
        #[arg(short, long, required_unless_present = "api_url")]
        repo_id: Option<RepoId>,

        /// Token (falls back to HF_TOKEN, then to a saved login)
        #[arg(short, long)]
        token: Option<String>,

        /// Full model URL, replacing the one built from --repo-id
        #[arg(long)]
        api_url: Option<String>,

        /// Inference API base URL
        #[arg(long, default_value = DEFAULT_INFERENCE_ENDPOINT)]
        inference_endpoint: String,
    },

    /// Generate a sample upload configuration file
    Init {
        /// Output path for the config file
        #[arg(short, long, default_value = "upload.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Upload {
            path,
            repo_id,
            token,
            config,
            commit_message,
            description,
            repo_type,
            revision,
            private,
            endpoint,
            ignore,
        } => {
            let mut upload = match config {
                Some(path) => {
                    tracing::info!("Loading configuration from {}", path.display());
                    UploadConfig::from_yaml_file(&path)?
                }
                None => UploadConfig::default(),
            };

            // Command-line flags win over the file
            if let Some(path) = path {
                upload.model_path = path;
            }
            if repo_id.is_some() {
                upload.repo_id = repo_id;
            }
            if let Some(token) = SecretString::non_empty(token) {
                upload.token = Some(token);
            }
            if let Some(message) = commit_message {
                upload.commit_message = message;
            }
            if description.is_some() {
                upload.commit_description = description;
            }
            if let Some(kind) = repo_type {
                upload.repo_type = kind;
            }
            if let Some(revision) = revision {
                upload.revision = revision;
            }
            if let Some(endpoint) = endpoint {
                upload.endpoint = Some(endpoint);
            }
            upload.private |= private;
            upload.ignore_patterns.extend(ignore);

            let upload = upload.merge_env();
            upload.validate()?;

            run_upload(upload).await?;
        }

        Commands::Whoami { token, endpoint } => {
            let endpoint = resolve_endpoint(endpoint);
            let Some((token, source)) = resolve_token(SecretString::non_empty(token)) else {
                anyhow::bail!("No token found. Pass --token, set HF_TOKEN or run `modelpush login`.");
            };
            tracing::debug!(?source, "Resolved token");

            let hub = HttpHub::new(&endpoint, Some(token.clone()))?;
            let user = hub.login(&token).await?;
            println!("{}", user.name);
            if !user.orgs.is_empty() {
                let orgs: Vec<_> = user.orgs.iter().map(|o| o.name.as_str()).collect();
                println!("orgs: {}", orgs.join(", "));
            }
            if let Some(role) = user.token_role() {
                println!("token role: {role}");
            }
        }

        Commands::Login { token, endpoint } => {
            let endpoint = resolve_endpoint(endpoint);
            let Some(token) = SecretString::non_empty(Some(token)) else {
                anyhow::bail!("Token must not be empty");
            };

            let hub = HttpHub::new(&endpoint, Some(token.clone()))?;
            let user = hub.login(&token).await?;
            let path = save_token(&token)?;
            println!("Logged in as {}. Token saved to {}", user.name, path.display());
        }

        Commands::Classify {
            image,
            repo_id,
            token,
            api_url,
            inference_endpoint,
        } => {
            let token = resolve_token(SecretString::non_empty(token)).map(|(token, source)| {
                tracing::debug!(?source, "Resolved token");
                token
            });
            let client = match (api_url, repo_id) {
                (Some(url), _) => InferenceClient::with_url(&url, token)?,
                (None, Some(repo_id)) => {
                    InferenceClient::for_model(&inference_endpoint, &repo_id, token)?
                }
                (None, None) => anyhow::bail!("Pass --repo-id or --api-url"),
            };

            let predictions = client.classify_image(&image).await?;
            let Some(top) = predictions.first() else {
                anyhow::bail!("The model returned no predictions");
            };
            println!("Prediction: {} ({} confidence)", top.label, top.confidence());
            for prediction in &predictions {
                println!("  {:<24} {:>6}", prediction.label, prediction.confidence());
            }
        }

        Commands::Init { output, force } => {
            // Validate output path to prevent path traversal attacks
            let validated_output = validate_output_path(&output, "config output")?;
            if validated_output.exists() && !force {
                anyhow::bail!(
                    "{} already exists, use --force to overwrite",
                    validated_output.display()
                );
            }
            std::fs::write(&validated_output, UploadConfig::sample_yaml())?;
            println!("Sample configuration written to {}", validated_output.display());
        }
    }

    Ok(())
}

/// Resolve credentials, build the client and run the upload flow.
///
/// Remote failures are reported by the flow itself and do not change the
/// exit status.
async fn run_upload(config: UploadConfig) -> anyhow::Result<()> {
    let resolved = resolve_token(config.token.clone());

    // Only a token handed to this run is checked up front. A saved login was
    // already checked by `modelpush login`.
    let login_token = match &resolved {
        Some((token, TokenSource::Explicit | TokenSource::Environment)) => Some(token.clone()),
        Some((_, TokenSource::SavedLogin)) => {
            tracing::info!("Using token from saved login");
            None
        }
        None => {
            tracing::warn!("No token found, requests will be anonymous");
            None
        }
    };

    let hub = HttpHub::new(config.endpoint(), resolved.map(|(token, _)| token))?;
    let reporter = SpinnerReporter::new();

    let outcome = modelpush_hub::run(&hub, &config, login_token.as_ref(), &reporter).await;
    match &outcome {
        UploadOutcome::Uploaded { commit, .. } => {
            tracing::info!(commit = %commit.commit_oid, "Upload complete");
        }
        UploadOutcome::Failed { .. } | UploadOutcome::Skipped { .. } => {
            tracing::debug!(?outcome, "Upload did not complete");
        }
    }

    Ok(())
}

/// `--endpoint`, else `HF_ENDPOINT`, else the public Hub.
fn resolve_endpoint(flag: Option<String>) -> String {
    let config = UploadConfig {
        endpoint: flag,
        ..UploadConfig::default()
    }
    .merge_env();
    config.endpoint().to_string()
}

/// Reject `..` components and make sure the parent directory exists.
fn validate_output_path(path: &str, context: &str) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(path);

    // Check for explicit ".." components in the path
    if path
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        anyhow::bail!(
            "Path traversal detected in {}: '{}' contains '..' component. \
             Please use a path within the current directory.",
            context,
            path.display()
        );
    }

    let resolved = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };

    if let Some(parent) = resolved.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Ok(resolved)
}
