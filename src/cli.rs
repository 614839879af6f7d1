use crate::config::{CliOverrides, Config};
use crate::error::{ForgeError, Result};
use crate::generation::{validate_wallet_address, GenerationRequest};
use crate::materializer::MaterializeStrategy;
use crate::sections::SchemaKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gameforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn a generated game response into a directory of files")]
#[command(
    long_about = "GameForge splits a generative-model response into its delimited sections \
                  (HTML, INSTRUCTIONS, CSS, JS or PYTHON_CODE) and writes each non-empty \
                  section to its fixed file in a freshly reset output directory."
)]
#[command(before_help = "🎮 GameForge - Generated Game Builder")]
#[command(after_help = "EXAMPLES:\n  \
    gameforge response.txt\n  \
    gameforge response.txt --output site --dry-run\n  \
    cat response.txt | gameforge - --schema pygame --output pygame_game\n  \
    gameforge --prompt \"a snake game\" --wallet 0x52908400098527886E0F7030069857D2E4169EE7\n  \
    gameforge response.txt --output-format json")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Raw model response file, or `-` to read it from stdin
    #[arg(conflicts_with = "prompt")]
    pub input: Option<String>,

    /// Describe the game and call the configured generator
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Wallet address appended to the prompt
    #[arg(
        long,
        requires = "prompt",
        conflicts_with = "input",
        value_parser = validate_wallet_address
    )]
    pub wallet: Option<String>,

    /// Section layout expected in the response
    #[arg(short, long, value_enum)]
    pub schema: Option<SchemaKind>,

    /// Expect each section body inside a ``` fence
    #[arg(long, conflicts_with = "plain")]
    pub fenced: bool,

    /// Expect bare section bodies between delimiter lines
    #[arg(long)]
    pub plain: bool,

    /// Output directory (reset on every run)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// How the output directory is replaced
    #[arg(long, value_enum)]
    pub strategy: Option<MaterializeStrategy>,

    /// Keep each raw response in this directory
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Parse and report without touching the output directory
    #[arg(long, help = "Show what would be written without writing it")]
    pub dry_run: bool,

    /// Fail when no section has any content
    #[arg(long)]
    pub require_sections: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

/// Where the raw response comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
    Prompt(GenerationRequest),
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_schema(self.schema)
            .with_fenced(self.fenced_override())
            .with_output_dir(self.output.clone())
            .with_strategy(self.strategy)
            .with_archive_dir(self.archive.clone())
    }

    pub fn fenced_override(&self) -> Option<bool> {
        if self.fenced {
            Some(true)
        } else if self.plain {
            Some(false)
        } else {
            None
        }
    }

    pub fn input_source(&self) -> Result<InputSource> {
        if let Some(ref prompt) = self.prompt {
            let request = GenerationRequest::new(prompt)?;
            let request = match self.wallet {
                Some(ref address) => request.with_wallet_address(address)?,
                None => request,
            };
            return Ok(InputSource::Prompt(request));
        }

        if self.wallet.is_some() {
            return Err(ForgeError::InvalidInput {
                message: "--wallet is only used together with --prompt".to_string(),
            });
        }

        match self.input.as_deref() {
            Some("-") => Ok(InputSource::Stdin),
            Some(path) => Ok(InputSource::File(PathBuf::from(path))),
            None => Err(ForgeError::InvalidInput {
                message: "no response file or prompt given".to_string(),
            }),
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
