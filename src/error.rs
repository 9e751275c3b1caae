use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("the package is not signed")]
    NotSigned,

    #[error("the signature contains no signer info")]
    MissingSignerInfo,

    #[error("the signer certificate was not found among the embedded certificates")]
    MissingSignerCertificate,

    #[error("ASN.1 error: {0}")]
    Der(#[from] der::Error),

    #[error("package archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Process exit code for this error. An unsigned package exits with 1,
    /// everything else with 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotSigned => 1,
            _ => 2,
        }
    }
}
