use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid wallet address: {address}")]
    InvalidWalletAddress { address: String },

    #[error("Generation failed: {source}")]
    Generation {
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to reset output directory {path}")]
    ResetFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {filename} for section {section}")]
    WriteFailed {
        section: String,
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to swap staged output into {path}")]
    SwapFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No section produced any content")]
    NothingToWrite { warnings: Vec<String> },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ForgeError {
    fn user_message(&self) -> String {
        match self {
            ForgeError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            ForgeError::InvalidInput { message } => {
                format!("Invalid input: {}", message)
            }
            ForgeError::InvalidWalletAddress { address } => {
                format!("Invalid wallet address: {}", address)
            }
            ForgeError::Generation { source } => {
                format!("Generation failed: {:#}", source)
            }
            ForgeError::ResetFailed { path, source } => {
                format!(
                    "Could not reset output directory {}: {}",
                    path.display(),
                    source
                )
            }
            ForgeError::WriteFailed {
                section,
                filename,
                source,
            } => {
                format!(
                    "Could not write {} (section {}): {}",
                    filename, section, source
                )
            }
            ForgeError::SwapFailed { path, source } => {
                format!(
                    "Could not move staged output into {}: {}",
                    path.display(),
                    source
                )
            }
            ForgeError::NothingToWrite { warnings } => {
                if warnings.is_empty() {
                    "Every section was empty; nothing was written".to_string()
                } else {
                    format!(
                        "Every section was empty; nothing was written ({})",
                        warnings.join("; ")
                    )
                }
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ForgeError::Config { .. } => Some(
                "Check your configuration file syntax, or regenerate one with --generate-config.".to_string()
            ),
            ForgeError::InvalidInput { .. } => Some(
                "Pass a response file, '-' to read stdin, or --prompt to run the configured generator.".to_string()
            ),
            ForgeError::InvalidWalletAddress { .. } => Some(
                "Wallet addresses are 0x followed by 40 hexadecimal characters.".to_string()
            ),
            ForgeError::Generation { .. } => Some(
                "Check the generator command in [generator] and that the model service is reachable. Requests are not retried.".to_string()
            ),
            ForgeError::ResetFailed { .. } | ForgeError::SwapFailed { .. } => Some(
                "Ensure nothing else holds files open in the output directory and that you can write to its parent.".to_string()
            ),
            ForgeError::WriteFailed { .. } => Some(
                "Ensure you have write permission for the output directory and enough free space.".to_string()
            ),
            ForgeError::NothingToWrite { .. } => Some(
                "The response probably does not follow the '--- NAME ---' delimiter format. Try --schema or --fenced/--plain.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ForgeError {
    fn from(error: toml::de::Error) -> Self {
        ForgeError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;
