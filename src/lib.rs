use clap::ValueEnum;

pub mod chart;
pub mod error;
pub mod harness;
pub mod report;
pub mod schema;
pub mod trackalloc;

/// Symmetric cipher selection for the CLI.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum CipherVariant {
    /// Run every symmetric suite (AES-GCM, AES-CBC+HMAC, ChaCha20-Poly1305).
    #[default]
    All,
    /// AES-128/256 in GCM mode only.
    AesGcm,
    /// AES-128/256 in CBC mode with HMAC-SHA256 (encrypt-then-MAC) only.
    AesCbcHmac,
    /// ChaCha20-Poly1305 only.
    #[value(name = "chacha20-poly1305")]
    ChaCha20Poly1305,
}
