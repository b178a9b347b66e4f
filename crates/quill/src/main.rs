use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use quill::ed25519::Ed25519Signer;
use quill::{
    build_graph, build_preparator, check_schema, issue_ed25519, list_links, load_credential,
    load_schema, prepare_output, select_output, verify_ed25519, IssueTemplate, RootConfig,
    RootError, SelectArgs,
};

/// Quill: credential attribute encoding
///
/// Turns credential attributes into the flat value sequences signers and
/// verifiers operate on.
#[derive(Parser, Debug)]
#[command(name = "quill", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// List the links of the configured transformation graph
    Links,

    /// Validate a schema file against the configured graph
    CheckSchema {
        /// Schema JSON file
        schema: PathBuf,
    },

    /// Print the prepared sequence of a credential proof
    Prepare {
        /// Credential JSON file
        credential: PathBuf,

        /// Prepare the signature envelope instead of the attributes
        #[arg(long)]
        signature: bool,

        /// Print the canonical byte form as hex
        #[arg(long)]
        bytes: bool,

        #[command(flatten)]
        select: SelectArgs,
    },

    /// Show which proof and schema version a selector resolves to
    Select {
        /// Credential JSON file
        credential: PathBuf,

        #[command(flatten)]
        select: SelectArgs,
    },

    /// Sign a credential with an Ed25519 key and attach the proof
    Issue {
        /// Credential JSON file
        credential: PathBuf,

        /// Proof template JSON file (type and schema versions)
        #[arg(long)]
        template: PathBuf,

        /// File holding the hex-encoded 32-byte signing seed
        #[arg(long)]
        key: PathBuf,

        /// Schema version to sign under
        #[arg(long, default_value = "default")]
        version: String,

        /// Write the credential here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify an Ed25519 proof of a credential
    Verify {
        /// Credential JSON file
        credential: PathBuf,

        #[command(flatten)]
        select: SelectArgs,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("quill=debug,quill_cred=debug,quill_proof=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quill=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<RootConfig, RootError> {
    match path {
        Some(p) => RootConfig::load(p),
        None => {
            let default_path = RootConfig::default_config_path();
            RootConfig::load(&default_path)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but its check failed.
fn run(cli: Cli) -> Result<bool, RootError> {
    let config_path = cli.config.as_ref();
    match cli.command {
        Commands::Init { force } => cmd_init(config_path, force).map(|_| true),
        Commands::Links => cmd_links(config_path).map(|_| true),
        Commands::CheckSchema { schema } => cmd_check_schema(config_path, &schema),
        Commands::Prepare {
            credential,
            signature,
            bytes,
            select,
        } => cmd_prepare(config_path, &credential, &select, signature, bytes).map(|_| true),
        Commands::Select { credential, select } => {
            cmd_select(config_path, &credential, &select).map(|_| true)
        }
        Commands::Issue {
            credential,
            template,
            key,
            version,
            output,
        } => cmd_issue(
            config_path,
            &credential,
            &template,
            &key,
            &version,
            output.as_deref(),
        )
        .map(|_| true),
        Commands::Verify { credential, select } => cmd_verify(config_path, &credential, &select),
    }
}

fn cmd_init(config_path: Option<&PathBuf>, force: bool) -> Result<(), RootError> {
    let save_path = config_path
        .cloned()
        .unwrap_or_else(RootConfig::default_config_path);
    if save_path.exists() && !force {
        return Err(RootError::Usage(format!(
            "{} already exists (use --force to overwrite)",
            save_path.display()
        )));
    }

    let config = RootConfig::default();
    config.save(&save_path)?;
    info!(path = %save_path.display(), "configuration written");

    println!("Quill initialized.");
    println!("  Config:          {}", save_path.display());
    println!(
        "  Default schema:  {}",
        config.preparator.default_schema_version
    );
    println!("  Extensions:      {}", config.graph.extensions.join(", "));
    Ok(())
}

fn cmd_links(config_path: Option<&PathBuf>) -> Result<(), RootError> {
    let config = load_config(config_path)?;
    let graph = build_graph(&config.graph)?;
    for line in list_links(&graph) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_check_schema(config_path: Option<&PathBuf>, schema_path: &Path) -> Result<bool, RootError> {
    let config = load_config(config_path)?;
    let graph = build_graph(&config.graph)?;
    let schema = load_schema(schema_path)?;

    let problems = check_schema(&graph, &schema);
    if problems.is_empty() {
        println!("Schema is valid.");
        return Ok(true);
    }
    for problem in &problems {
        println!("{}", problem);
    }
    Ok(false)
}

fn cmd_prepare(
    config_path: Option<&PathBuf>,
    credential_path: &Path,
    select: &SelectArgs,
    signature: bool,
    bytes: bool,
) -> Result<(), RootError> {
    let config = load_config(config_path)?;
    let preparator = build_preparator(&config)?;
    let cred = load_credential(credential_path)?;
    let selector = select.to_selector()?;

    println!(
        "{}",
        prepare_output(&preparator, &cred, &selector, signature, bytes)?
    );
    Ok(())
}

fn cmd_select(
    config_path: Option<&PathBuf>,
    credential_path: &Path,
    select: &SelectArgs,
) -> Result<(), RootError> {
    let config = load_config(config_path)?;
    let preparator = build_preparator(&config)?;
    let cred = load_credential(credential_path)?;
    let selector = select.to_selector()?;

    let summary = select_output(&preparator, &cred, &selector)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_issue(
    config_path: Option<&PathBuf>,
    credential_path: &Path,
    template_path: &Path,
    key_path: &Path,
    version: &str,
    output: Option<&Path>,
) -> Result<(), RootError> {
    let config = load_config(config_path)?;
    let preparator = build_preparator(&config)?;
    let cred = load_credential(credential_path)?;
    let template: IssueTemplate = serde_json::from_str(&std::fs::read_to_string(template_path)?)?;
    let signer = Ed25519Signer::from_hex(&std::fs::read_to_string(key_path)?)?;

    let issued = issue_ed25519(&preparator, cred, &template, &signer, version)?;
    let rendered = serde_json::to_string_pretty(&issued)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!(path = %path.display(), "credential written");
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn cmd_verify(
    config_path: Option<&PathBuf>,
    credential_path: &Path,
    select: &SelectArgs,
) -> Result<bool, RootError> {
    let config = load_config(config_path)?;
    let preparator = build_preparator(&config)?;
    let cred = load_credential(credential_path)?;
    let selector = select.to_selector()?;

    let outcome = verify_ed25519(&preparator, &cred, &selector)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome.valid)
}
