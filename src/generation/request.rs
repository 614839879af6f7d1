use crate::error::{ForgeError, Result};

/// One user request for a generated game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    wallet_address: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: &str) -> Result<Self> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ForgeError::InvalidInput {
                message: "prompt must not be empty".to_string(),
            });
        }

        Ok(Self {
            prompt: prompt.to_string(),
            wallet_address: None,
        })
    }

    pub fn with_wallet_address(mut self, address: &str) -> Result<Self> {
        let address = validate_wallet_address(address).map_err(|_| {
            ForgeError::InvalidWalletAddress {
                address: address.to_string(),
            }
        })?;
        self.wallet_address = Some(address);
        Ok(self)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet_address.as_deref()
    }

    /// Prompt text sent to the model, with the wallet address appended when present.
    pub fn effective_prompt(&self) -> String {
        match &self.wallet_address {
            Some(address) => format!("{}\n\nWallet Address: {}", self.prompt, address),
            None => self.prompt.clone(),
        }
    }
}

/// Accepts `0x` followed by 40 hex digits. Returns the trimmed address.
pub fn validate_wallet_address(s: &str) -> std::result::Result<String, String> {
    let s = s.trim();

    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| "Wallet address must start with 0x".to_string())?;

    if hex.len() != 40 {
        return Err(format!(
            "Wallet address must have 40 hex digits after 0x, found {}",
            hex.len()
        ));
    }

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("Wallet address contains non-hexadecimal characters".to_string());
    }

    Ok(s.to_string())
}
