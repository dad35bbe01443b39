use cabline_core::{DatabaseError, JsonDatabase, Site};
use cabline_server::{Config, ConfigError, ServerContext};
use colored::Colorize;
use log::{error, info};
use thiserror::Error;
use tokio::runtime::{self, Runtime};

mod logging;

pub struct Cabline {
    context: ServerContext,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum CablineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not open the data file: {0}")]
    Database(#[from] DatabaseError),

    #[error("Server stopped: {0}")]
    Server(std::io::Error),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Cabline {
    fn new() -> Result<Self, CablineError> {
        let config = Config::from_env()?;

        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("cabline-async")
            .build()
            .map_err(|e| CablineError::Fatal(e.to_string()))?;

        info!("Opening {}...", config.data_path.display());
        let database = runtime.block_on(JsonDatabase::open(config.data_path.clone()))?;
        let context = ServerContext::new(Site::new(database), config);

        Ok(Self { context, runtime })
    }

    fn run(&self) -> Result<(), CablineError> {
        self.runtime
            .block_on(cabline_server::run_server(self.context.clone()))
            .map_err(CablineError::Server)
    }
}

impl CablineError {
    fn hint(&self) -> String {
        match self {
            CablineError::Config(_) => format!(
                "Check the {} environment variables, or unset them to use the defaults.",
                "CABLINE_*".bold()
            ),
            CablineError::Database(_) => format!(
                "Make sure {} points to a writable location holding a valid JSON document.",
                Config::DATA_PATH_VAR.bold()
            ),
            CablineError::Server(_) => format!(
                "The port may already be in use. Pick another one with {}.",
                Config::PORT_VAR.bold()
            ),
            CablineError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn report(error: CablineError) {
    error!(
        "{} Read the error below to troubleshoot the issue.",
        "Cabline failed!".bold().red()
    );
    error!("{}", error);
    error!(
        "{}",
        format!("Hint: {}", error.hint())
            .bright_black()
            .italic()
    );
}

fn main() {
    if let Err(e) = logging::init_logger() {
        eprintln!("Could not initialize logging: {}", e);
    }

    match Cabline::new() {
        Ok(cabline) => {
            info!("Initialized successfully.");

            if let Err(error) = cabline.run() {
                report(error);
            }
        }
        Err(error) => report(error),
    }
}
