use crate::error::{ForgeError, Result};
use crate::materializer::MaterializeStrategy;
use crate::sections::{Extraction, Schema, SchemaKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub schema: SchemaConfig,
    pub output: OutputConfig,
    pub archive: ArchiveConfig,
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub kind: SchemaKind,
    /// Overrides the kind's default delimiter style when set.
    pub fenced: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub strategy: MaterializeStrategy,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Keep every raw response here under its own file name.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Program and arguments; receives the prompt as JSON on stdin.
    pub command: Vec<String>,
    pub system_prompt_file: Option<PathBuf>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            kind: SchemaKind::Web,
            fenced: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("game"),
            strategy: MaterializeStrategy::StagedSwap,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ForgeError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ForgeError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ForgeError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["gameforge.toml", ".gameforge.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(kind) = cli_args.schema {
            self.schema.kind = kind;
        }

        if let Some(fenced) = cli_args.fenced {
            self.schema.fenced = Some(fenced);
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.directory = output_dir.clone();
        }

        if let Some(strategy) = cli_args.strategy {
            self.output.strategy = strategy;
        }

        if let Some(ref archive_dir) = cli_args.archive_dir {
            self.archive.directory = Some(archive_dir.clone());
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ForgeError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ForgeError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let output = &self.output.directory;

        if output.as_os_str().is_empty() {
            return Err(ForgeError::Config {
                message: "Output directory must not be empty".to_string(),
            });
        }

        // The directory is wiped on every run, so it needs a name of its own.
        if output.file_name().is_none() {
            return Err(ForgeError::Config {
                message: format!(
                    "Output directory {} cannot be used; choose a dedicated subdirectory",
                    output.display()
                ),
            });
        }

        if let Some(ref archive) = self.archive.directory {
            if archive.starts_with(output) {
                return Err(ForgeError::Config {
                    message: format!(
                        "Archive directory {} is inside the output directory {}, which is reset on every run",
                        archive.display(),
                        output.display()
                    ),
                });
            }
        }

        if let Some(program) = self.generator.command.first() {
            if program.trim().is_empty() {
                return Err(ForgeError::Config {
                    message: "Generator command must start with a program name".to_string(),
                });
            }
        }

        if let Some(ref prompt_file) = self.generator.system_prompt_file {
            if !prompt_file.is_file() {
                return Err(ForgeError::Config {
                    message: format!("System prompt file not found: {}", prompt_file.display()),
                });
            }
        }

        Ok(())
    }

    pub fn schema(&self) -> Schema {
        let schema = Schema::for_kind(self.schema.kind);
        match self.schema.fenced {
            Some(fenced) => schema.with_extraction(Extraction::from_fenced(fenced)),
            None => schema,
        }
    }

    /// System instruction for the generator; empty when none is configured.
    pub fn system_prompt(&self) -> Result<String> {
        match self.generator.system_prompt_file {
            Some(ref path) => std::fs::read_to_string(path).map_err(|e| ForgeError::Config {
                message: format!("Failed to read system prompt {}: {}", path.display(), e),
            }),
            None => Ok(String::new()),
        }
    }

    pub fn create_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.archive.directory = Some(PathBuf::from("output/responses"));
        sample_config.generator.command = vec!["my-model-cli".to_string(), "--json".to_string()];
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub schema: Option<SchemaKind>,
    pub fenced: Option<bool>,
    pub output_dir: Option<PathBuf>,
    pub strategy: Option<MaterializeStrategy>,
    pub archive_dir: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: Option<SchemaKind>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_fenced(mut self, fenced: Option<bool>) -> Self {
        self.fenced = fenced;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_strategy(mut self, strategy: Option<MaterializeStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_archive_dir(mut self, archive_dir: Option<PathBuf>) -> Self {
        self.archive_dir = archive_dir;
        self
    }
}
