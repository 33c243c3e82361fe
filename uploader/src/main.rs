use benchflux_uploader::{
    publish,
    release::{
        ClientSettings, ReleaseClient, UploadError, DEFAULT_API_URL, DEFAULT_CONTENT_TYPE,
        DEFAULT_TOKEN_ENV, DEFAULT_UPLOAD_URL,
    },
};
use clap::{ArgAction, Parser};
use std::{env, path::PathBuf, process::ExitCode};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Create a release for a tag and upload a file as its asset
#[derive(Parser, Debug)]
#[command(name = "benchflux-upload", author, version, about)]
struct Cli {
    /// Tag the release is created for
    tag: String,

    /// File uploaded as release asset
    file: PathBuf,

    /// Repository as owner/name
    #[arg(long, env = "BENCHFLUX_REPOSITORY")]
    repository: String,

    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    #[arg(long, default_value = DEFAULT_UPLOAD_URL)]
    upload_url: String,

    /// Content type of the uploaded asset
    #[arg(long, default_value = DEFAULT_CONTENT_TYPE)]
    content_type: String,

    /// Environment variable holding the access token
    #[arg(long, default_value = DEFAULT_TOKEN_ENV)]
    token_env: String,

    /// More logging, can be repeated
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<u64, UploadError> {
    let token = env::var(&cli.token_env).map_err(|_| UploadError::MissingToken(cli.token_env))?;

    let client = ReleaseClient::new(
        ClientSettings {
            api_url: cli.api_url,
            upload_url: cli.upload_url,
            repository: cli.repository,
            content_type: cli.content_type,
        },
        token,
    );

    publish(&client, &cli.tag, &cli.file)
}

fn main() -> ExitCode {
    // usage errors exit with 1 instead of clap's default of 2
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();

            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(release) => {
            println!("{release}");

            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(error = ?error, "{error}");

            ExitCode::FAILURE
        }
    }
}
