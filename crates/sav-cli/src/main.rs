use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::info;

use sav_core::config::{self, CONFIG_FILE_NAME, GenerateOptions, SavConfig, UnresolvedRefPolicy};
use sav_core::loader::{FsLoader, load_spec_file};
use sav_core::output::table::render_table;
use sav_core::output::{CodeFile, IteratorPath, Navigable};
use sav_core::transform::{generate_files, validate_files};
use sav_core::view::{ApiViewSpec, OperationView};

#[derive(Parser)]
#[command(name = "sav", about = "Swagger 2.0 API view generator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an API view code file from one or more Swagger documents
    Generate {
        /// Root Swagger documents (YAML or JSON); defaults to `inputs` from the config
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Output file; defaults to `output` from the config
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Package name shown in the view
        #[arg(long)]
        package_name: Option<String>,

        /// Abort on the first unresolved `$ref` instead of dropping it
        #[arg(long)]
        strict: bool,
    },

    /// Validate a Swagger document and everything it references
    Validate {
        /// Path to the Swagger document
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the resolved view of a Swagger document
    Inspect {
        /// Path to the Swagger document
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,

        /// Only show the operation with this operationId
        #[arg(long)]
        operation: Option<String>,

        /// Print the flattened schema tables instead of the summary
        #[arg(long)]
        tables: bool,
    },

    /// Initialize a new sav configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            package_name,
            strict,
        } => cmd_generate(input, output, package_name, strict),

        Commands::Validate { input } => cmd_validate(input),

        Commands::Inspect {
            input,
            format,
            operation,
            tables,
        } => cmd_inspect(input, format, operation, tables),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "sav", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<SavConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn build_views(inputs: &[PathBuf], options: &GenerateOptions) -> Result<Vec<ApiViewSpec>> {
    for input in inputs {
        if !input.exists() {
            anyhow::bail!("input {} does not exist", input.display());
        }
    }
    let views = generate_files(inputs, &mut FsLoader, options)
        .with_context(|| format!("failed to generate view for {}", display_list(inputs)))?;
    Ok(views)
}

fn display_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

fn cmd_generate(
    input: Vec<PathBuf>,
    output: Option<PathBuf>,
    package_name: Option<String>,
    strict: bool,
) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let inputs: Vec<PathBuf> = if input.is_empty() {
        cfg.inputs.iter().map(PathBuf::from).collect()
    } else {
        input
    };
    let output = output.unwrap_or_else(|| PathBuf::from(&cfg.output));

    let mut options = cfg.generate_options();
    if package_name.is_some() {
        options.package_name = package_name;
    }
    if strict {
        options.unresolved_refs = UnresolvedRefPolicy::Fail;
    }

    let views = build_views(&inputs, &options)?;
    if views.is_empty() {
        eprintln!("No input with paths; nothing to generate.");
        return Ok(());
    }

    let package_name = options
        .package_name
        .clone()
        .unwrap_or_else(|| views[0].package_name.clone());
    let code_file = CodeFile::from_views(&package_name, &views);
    let json = code_file.to_json()?;
    write_output(&output, &json)?;

    info!("wrote {} tokens to {}", code_file.tokens.len(), output.display());
    eprintln!(
        "Generated API view for {} ({} file(s)) in {}",
        package_name,
        views.len(),
        output.display()
    );
    Ok(())
}

fn cmd_validate(input: PathBuf) -> Result<()> {
    let parsed =
        load_spec_file(&input).with_context(|| format!("failed to load {}", input.display()))?;

    eprintln!(
        "Valid Swagger {} spec: {}",
        parsed.swagger, parsed.info.title
    );
    eprintln!("  Version: {}", parsed.info.version);
    eprintln!("  Paths: {}", parsed.paths.len());
    eprintln!("  Definitions: {}", parsed.definitions.len());
    eprintln!("  Parameters: {}", parsed.parameters.len());

    // Every reference must resolve, including those of definitions-only documents.
    let views = validate_files(std::slice::from_ref(&input), &mut FsLoader)
        .with_context(|| format!("failed to validate {}", input.display()))?;
    if let Some(view) = views.first() {
        eprintln!("  Operations: {}", view.operations().count());
    }

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(
    input: PathBuf,
    format: InspectFormat,
    operation: Option<String>,
    tables: bool,
) -> Result<()> {
    let views = build_views(std::slice::from_ref(&input), &GenerateOptions::default())?;
    let Some(view) = views.first() else {
        anyhow::bail!("{} has no paths", input.display());
    };

    if tables {
        let code_file = CodeFile::from_views(&view.package_name, std::slice::from_ref(view));
        for (anchor, rows) in &code_file.tables {
            println!("# {anchor}");
            print!("{}", render_table(rows));
            println!();
        }
        return Ok(());
    }

    let summary = match operation {
        Some(operation_id) => {
            let Some(op) = view.find_operation(&operation_id) else {
                anyhow::bail!("no operation {operation_id} in {}", input.display());
            };
            operation_summary(op)
        }
        None => build_inspect_summary(view),
    };

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(view: &ApiViewSpec) -> serde_json::Value {
    let operations: Vec<serde_json::Value> = view.operations().map(operation_summary).collect();
    let navigation = view.navigation_item(&mut IteratorPath::new());
    let navigation_ids: Vec<&str> = navigation
        .walk()
        .into_iter()
        .map(|item| item.navigation_id.as_str())
        .collect();

    serde_json::json!({
        "file": view.file_name,
        "package": view.package_name,
        "info": {
            "title": view.general.info.title,
            "version": view.general.info.version,
        },
        "operations": operations,
        "definitions": view.definitions.keys().collect::<Vec<_>>(),
        "parameters": view.global_parameters.keys().collect::<Vec<_>>(),
        "navigation": navigation_ids,
    })
}

fn operation_summary(op: &OperationView) -> serde_json::Value {
    serde_json::json!({
        "operation_id": op.operation_id,
        "method": op.method.as_str(),
        "path": op.path,
        "parameters": {
            "path": op.parameters.path.len(),
            "query": op.parameters.query.len(),
            "header": op.parameters.header.len(),
            "body": op.parameters.body.len(),
        },
        "responses": op.responses.iter().map(|r| &r.status_code).collect::<Vec<_>>(),
        "long_running": op.long_running,
    })
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
