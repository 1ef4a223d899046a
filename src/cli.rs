use clap::{Parser, Subcommand};

/// scangate — scan-a-QR-code login service
#[derive(Parser)]
#[command(name = "scangate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the login server
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}
