pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod materializer;
pub mod sections;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, InputSource, OutputFormat};
pub use config::{ArchiveConfig, CliOverrides, Config, GeneratorConfig, OutputConfig, SchemaConfig};
pub use error::{ForgeError, Result, UserFriendlyError};

// Core functionality re-exports
pub use generation::{
    CommandGenerator, GenerationRequest, RawResponse, ResponseArchive, TextGenerator,
};
pub use materializer::{
    list_output_files, materialize, BuildReport, MaterializeStrategy, Materializer,
    SectionOutcome, SkipReason,
};
pub use sections::{
    parse_sections, Extraction, ParseWarning, ParsedSection, ParsedSections, Schema, SchemaKind,
};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use chrono::Utc;
use std::io;
use std::path::Path;

/// Options for a single build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Parse and plan only; the output directory is left alone.
    pub dry_run: bool,
    /// Fail with `NothingToWrite` when every section is blank.
    pub require_sections: bool,
}

/// Main library interface: response in, game directory out.
pub struct GameForge {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl GameForge {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(
            config,
            output_mode,
            cli_args.verbosity_level(),
            cli_args.quiet,
        ))
    }

    pub fn schema(&self) -> Schema {
        self.config.schema()
    }

    pub fn materializer(&self) -> Materializer {
        Materializer::new(self.config.output.directory.clone())
            .with_strategy(self.config.output.strategy)
    }

    /// Obtain the raw response for `source`, calling the generator for prompts.
    pub fn read_response(&self, source: &InputSource) -> Result<RawResponse> {
        match source {
            InputSource::File(path) => {
                self.output_formatter
                    .debug(&format!("Reading response from {}", path.display()));
                RawResponse::read_from_file(path)
            }
            InputSource::Stdin => RawResponse::read_from(io::stdin().lock()),
            InputSource::Prompt(request) => self.generate_with_config(request),
        }
    }

    /// Call `generator` once for `request`. Failures are not retried.
    pub fn generate(
        &self,
        generator: &dyn TextGenerator,
        request: &GenerationRequest,
    ) -> Result<RawResponse> {
        let system = self.config.system_prompt()?;
        let prompt = request.effective_prompt();

        self.output_formatter.start_operation("Generating game");
        log::info!("sending prompt ({} chars) to generator", prompt.len());

        let spinner = self.progress_manager.create_spinner("Waiting for the model");
        let text = match generator.generate(&system, &prompt) {
            Ok(text) => {
                ui::progress::finish_spinner(&spinner, "Response received");
                text
            }
            Err(source) => {
                ui::progress::abandon_spinner(&spinner, "Generation failed");
                return Err(ForgeError::Generation { source });
            }
        };

        let response = RawResponse::new(text);
        match self.config.archive.directory {
            Some(ref directory) => {
                let stored = ResponseArchive::new(directory).store(response)?;
                if let Some(handle) = stored.handle() {
                    self.output_formatter
                        .info(&format!("Saved raw response to {}", handle.display()));
                }
                Ok(stored)
            }
            None => Ok(response),
        }
    }

    /// Generate with the external command named in the configuration.
    pub fn generate_with_config(&self, request: &GenerationRequest) -> Result<RawResponse> {
        let generator = CommandGenerator::from_argv(&self.config.generator.command).ok_or_else(
            || ForgeError::Config {
                message: "no generator command is configured".to_string(),
            },
        )?;

        self.output_formatter
            .debug(&format!("Using generator {}", generator.program()));
        self.generate(&generator, request)
    }

    /// Parse `response` and materialize (or plan) the output directory.
    pub fn build(&self, response: &RawResponse, options: BuildOptions) -> Result<BuildReport> {
        let schema = self.schema();
        let parsed = schema.parse(response.text());

        for warning in parsed.warnings() {
            self.output_formatter.warning(&warning.to_string());
        }

        if options.require_sections && parsed.all_blank() {
            return Err(ForgeError::NothingToWrite {
                warnings: parsed.warnings().iter().map(ToString::to_string).collect(),
            });
        }

        let materializer = self.materializer();
        let (outcomes, files) = if options.dry_run {
            self.output_formatter
                .info("Dry run: the output directory will not be touched");
            (materializer.plan(&parsed), Vec::new())
        } else {
            self.output_formatter.start_operation(&format!(
                "Writing {}",
                materializer.output_dir().display()
            ));
            let outcomes = materializer.materialize(&parsed)?;
            let files = list_output_files(materializer.output_dir())?;
            (outcomes, files)
        };

        Ok(BuildReport {
            schema: schema.kind,
            extraction: schema.uniform_extraction(),
            output_directory: materializer.output_dir().to_path_buf(),
            strategy: materializer.strategy(),
            dry_run: options.dry_run,
            outcomes,
            sections: parsed,
            files,
            response_handle: response.handle().map(Path::to_path_buf),
            generated_at: Utc::now(),
        })
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &ForgeError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get build information
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GameForge {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const RESPONSE: &str = "--- HTML ---\n<h1>Hi</h1>\n--- INSTRUCTIONS ---\nPress space to jump\n";
    const HTML_ONLY: &str = "--- HTML ---\n<p>only</p>\n--- INSTRUCTIONS ---\n   \n";

    fn forge_in(dir: &Path) -> GameForge {
        let mut config = Config::default();
        config.output.directory = dir.join("game");
        GameForge::new(config, OutputMode::Plain, 0, true)
    }

    #[test]
    fn test_build_writes_non_empty_sections() {
        let temp_dir = TempDir::new().unwrap();
        let forge = forge_in(temp_dir.path());

        let report = forge
            .build(&RawResponse::new(RESPONSE), BuildOptions::default())
            .unwrap();

        assert_eq!(report.written_count(), 2);
        assert_eq!(report.files, vec!["index.html", "instructions.txt"]);
        assert_eq!(report.extraction, Some(Extraction::Plain));

        let game = temp_dir.path().join("game");
        assert_eq!(fs::read_to_string(game.join("index.html")).unwrap(), "<h1>Hi</h1>");
        assert_eq!(
            fs::read_to_string(game.join("instructions.txt")).unwrap(),
            "Press space to jump"
        );

        // A second run replaces the first; the blank section leaves no file.
        let report = forge
            .build(&RawResponse::new(HTML_ONLY), BuildOptions::default())
            .unwrap();
        assert_eq!(report.written_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.files, vec!["index.html"]);
        assert!(!game.join("instructions.txt").exists());
    }

    #[test]
    fn test_dry_run_leaves_directory_alone() {
        let temp_dir = TempDir::new().unwrap();
        let game = temp_dir.path().join("game");
        fs::create_dir_all(&game).unwrap();
        fs::write(game.join("old.txt"), "keep").unwrap();

        let forge = forge_in(temp_dir.path());
        let options = BuildOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = forge.build(&RawResponse::new(RESPONSE), options).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.written_count(), 2);
        assert!(report.files.is_empty());
        assert!(game.join("old.txt").exists());
        assert!(!game.join("index.html").exists());
    }

    #[test]
    fn test_require_sections() {
        let temp_dir = TempDir::new().unwrap();
        let forge = forge_in(temp_dir.path());
        let options = BuildOptions {
            require_sections: true,
            ..Default::default()
        };

        let result = forge.build(&RawResponse::new("no delimiters at all"), options);
        match result {
            Err(ForgeError::NothingToWrite { warnings }) => assert!(!warnings.is_empty()),
            other => panic!("unexpected result: {:?}", other.map(|r| r.outcomes)),
        }
        assert!(!temp_dir.path().join("game").exists());

        // Without the flag the directory is still reset.
        let report = forge
            .build(&RawResponse::new("no delimiters at all"), BuildOptions::default())
            .unwrap();
        assert_eq!(report.written_count(), 0);
        assert!(temp_dir.path().join("game").is_dir());
    }

    #[test]
    fn test_generate_calls_once_and_appends_wallet() {
        let temp_dir = TempDir::new().unwrap();
        let forge = forge_in(temp_dir.path());
        let calls = Cell::new(0);

        let generator = |_system: &str, prompt: &str| -> anyhow::Result<String> {
            calls.set(calls.get() + 1);
            assert!(prompt.ends_with("\n\nWallet Address: 0x52908400098527886E0F7030069857D2E4169EE7"));
            Ok(RESPONSE.to_string())
        };

        let request = GenerationRequest::new("a game")
            .unwrap()
            .with_wallet_address("0x52908400098527886E0F7030069857D2E4169EE7")
            .unwrap();

        let response = forge.generate(&generator, &request).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(response.text(), RESPONSE);
        assert!(response.handle().is_none());
    }

    #[test]
    fn test_generation_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let forge = forge_in(temp_dir.path());

        let failing =
            |_: &str, _: &str| -> anyhow::Result<String> { anyhow::bail!("quota exceeded") };
        let request = GenerationRequest::new("a game").unwrap();

        let err = forge.generate(&failing, &request).unwrap_err();
        assert!(matches!(err, ForgeError::Generation { .. }));
        assert!(err.user_message().contains("quota exceeded"));
        assert!(!temp_dir.path().join("game").exists());
    }

    #[test]
    fn test_generate_archives_each_response() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.output.directory = temp_dir.path().join("game");
        config.archive.directory = Some(temp_dir.path().join("responses"));
        let forge = GameForge::new(config, OutputMode::Plain, 0, true);

        let generator = |_: &str, prompt: &str| -> anyhow::Result<String> {
            Ok(format!("--- HTML ---\n{}", prompt))
        };

        let first = forge
            .generate(&generator, &GenerationRequest::new("one").unwrap())
            .unwrap();
        let second = forge
            .generate(&generator, &GenerationRequest::new("two").unwrap())
            .unwrap();

        let first_handle: PathBuf = first.handle().unwrap().to_path_buf();
        assert_ne!(first.handle(), second.handle());
        assert_eq!(fs::read_to_string(&first_handle).unwrap(), "--- HTML ---\none");

        let report = forge.build(&first, BuildOptions::default()).unwrap();
        assert_eq!(report.response_handle, Some(first_handle));
    }

    #[test]
    fn test_generate_without_command_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let forge = forge_in(temp_dir.path());
        let request = GenerationRequest::new("a game").unwrap();

        let err = forge.generate_with_config(&request).unwrap_err();
        assert!(matches!(err, ForgeError::Config { .. }));
    }

    #[test]
    fn test_pygame_schema_build() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.schema.kind = SchemaKind::Pygame;
        config.output.directory = temp_dir.path().join("pygame_game");
        let forge = GameForge::new(config, OutputMode::Plain, 0, true);

        let response = "--- PYTHON_CODE ---\n```python\nprint('hi')\n```\n--- INSTRUCTIONS ---\n```\nArrows move\n```";
        let report = forge
            .build(&RawResponse::new(response), BuildOptions::default())
            .unwrap();

        assert_eq!(report.files, vec!["app.py", "instructions.txt"]);
        let code = fs::read_to_string(temp_dir.path().join("pygame_game/app.py")).unwrap();
        assert_eq!(code, "python\nprint('hi')");
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        GameForge::generate_sample_config(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[schema]"));
        assert!(content.contains("[output]"));
    }

    #[test]
    fn test_build_info_display() {
        assert!(!version_info().is_empty());

        let build_info = build_info();
        let display_string = build_info.to_string();
        assert!(display_string.contains("GameForge"));
        assert!(display_string.contains(build_info.version));
    }
}
