use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nupkg_certs::error::ExtractError;
use nupkg_certs::filter::FilterSelection;
use nupkg_certs::writer::CertificateFormat;
use nupkg_certs::ExtractOptions;

#[derive(Parser)]
#[command(
    name = "nupkg-certs",
    about = "Extract certificate files from signed NuGet packages",
    long_about = "Extract certificate files from signed NuGet packages.\n\n\
        Combine selection flags to filter in categories of certificates \
        contained in a package. With no selection flags, no certificates \
        are extracted.\n\n\
        Formats: cer is the binary DER encoding (extension .cer); pem is \
        the base64 PEM encoding of the same bytes (extension .pem).",
    version
)]
struct Cli {
    /// A file path for an input .nupkg
    #[arg(long)]
    file: PathBuf,

    /// A destination directory for writing extracted certificates
    #[arg(long)]
    output: PathBuf,

    /// The format to use for writing certificate files (cer, pem)
    #[arg(long, default_value = "cer")]
    format: String,

    /// Extract all certificates
    #[arg(long)]
    all: bool,

    /// Extract certificates used in the author signature
    #[arg(long)]
    author: bool,

    /// Extract certificates used in the repository signature
    #[arg(long)]
    repository: bool,

    /// Extract leaf certificates
    #[arg(long)]
    leaf: bool,

    /// Extract intermediate certificates
    #[arg(long)]
    intermediate: bool,

    /// Extract root certificates
    #[arg(long)]
    root: bool,

    /// Extract certificates used in code sign signatures
    #[arg(long)]
    code_signing: bool,

    /// Extract certificates used in timestamp signatures
    #[arg(long)]
    timestamping: bool,

    /// The minimum log level to display (error, warn, info, debug, trace)
    #[arg(long, value_name = "level", default_value = "info")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let format = CertificateFormat::from_str_lenient(&cli.format).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using cer", cli.format);
        CertificateFormat::Cer
    });

    let options = ExtractOptions {
        format,
        filter: FilterSelection {
            all: cli.all,
            author: cli.author,
            repository: cli.repository,
            leaf: cli.leaf,
            intermediate: cli.intermediate,
            root: cli.root,
            code_signing: cli.code_signing,
            timestamping: cli.timestamping,
        },
    };

    match nupkg_certs::extract(&cli.file, &cli.output, &options) {
        Ok(_) => process::exit(0),
        Err(err) => {
            // The unsigned case is already reported as a warning by the
            // extraction itself.
            if !matches!(err, ExtractError::NotSigned) {
                eprintln!("Error: {err}");
            }
            process::exit(err.exit_code());
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| {
        eprintln!("Warning: unknown log level '{level}', using info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
