pub mod archive;
pub mod generator;
pub mod request;

pub use archive::{RawResponse, ResponseArchive};
pub use generator::{CommandGenerator, TextGenerator};
pub use request::{validate_wallet_address, GenerationRequest};
