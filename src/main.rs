//! # Struk CLI
//!
//! Command-line interface for BLE receipt printing.
//!
//! ## Usage
//!
//! ```bash
//! # Check the printer link with a test banner
//! struk test
//!
//! # Print a receipt document
//! struk receipt order.json
//!
//! # Print a receipt with the store logo on top
//! struk receipt --logo logo.png order.json
//!
//! # Print an image on its own
//! struk logo logo.png
//!
//! # Show the receipt layout without a printer
//! struk preview order.json
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `struk=info`).

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use struk::{
    CommandBuffer, PrinterConfig, PrinterDriver, PrinterError, PrinterProfile, ReceiptDocument,
    ReceiptFormatter, receipt::StoreProfile, transport::BleCentral,
};

/// Struk - BLE thermal receipt printer utility
#[derive(Parser, Debug)]
#[command(name = "struk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct PrinterArgs {
    /// Only accept printers whose name contains this (unfiltered scan only).
    ///
    /// Printers that do not advertise the 0x18F0 service are found by the
    /// unfiltered scan, which otherwise takes the first named device in
    /// range, phones and earbuds included. Set this for such printers.
    #[arg(long, env = "STRUK_PRINTER_NAME")]
    name: Option<String>,

    /// Seconds to scan before giving up on each discovery attempt
    #[arg(long, default_value = "10")]
    scan_secs: u64,

    /// Store profile JSON (name, tagline, address, venue_info, thanks)
    #[arg(long, value_name = "FILE", env = "STRUK_STORE")]
    store: Option<PathBuf>,

    /// Send a partial cut after the trailing feed
    #[arg(long)]
    cut: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and print a test banner
    Test {
        #[command(flatten)]
        printer: PrinterArgs,
    },

    /// Connect and print a receipt document
    Receipt {
        /// Receipt document (JSON)
        file: PathBuf,

        /// Image printed above the store name
        #[arg(long, value_name = "IMAGE")]
        logo: Option<PathBuf>,

        #[command(flatten)]
        printer: PrinterArgs,
    },

    /// Connect and print an image
    Logo {
        /// Image file (PNG, JPEG, ...)
        image: PathBuf,

        #[command(flatten)]
        printer: PrinterArgs,
    },

    /// Render a receipt document as text, without a printer
    Preview {
        /// Receipt document (JSON)
        file: PathBuf,

        /// Also dump the encoded bytes as hex
        #[arg(long)]
        hex: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("struk=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        if e.is_connection_error() {
            eprintln!("gagal terkoneksi ke printer: {}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), PrinterError> {
    match cli.command {
        Commands::Test { printer } => {
            let mut driver = connect(&printer, None).await?;
            let result = driver.print_test().await;
            driver.disconnect().await;
            result?;
            println!("Printed successfully!");
        }

        Commands::Receipt {
            file,
            logo,
            printer,
        } => {
            let doc = load_document(&file, &printer)?;
            let logo = logo.map(std::fs::read).transpose()?;
            let mut driver = connect(&printer, logo).await?;
            let result = driver.print_receipt(&doc).await;
            driver.disconnect().await;
            result?;
            println!("Printed successfully!");
        }

        Commands::Logo { image, printer } => {
            let encoded = std::fs::read(&image)?;
            let mut driver = connect(&printer, None).await?;
            let result = driver.print_image(&encoded).await;
            driver.disconnect().await;
            result?;
            println!("Printed successfully!");
        }

        Commands::Preview { file, hex } => {
            let doc: ReceiptDocument = serde_json::from_slice(&std::fs::read(&file)?)?;
            doc.validate()?;
            let program = ReceiptFormatter::default().layout(&doc);
            for line in program.text_lines() {
                println!("{}", line);
            }
            let buffer = CommandBuffer::from(&program);
            let chunks = buffer.chunk_count(PrinterConfig::MM58.chunk_size);
            println!("\n{} bytes, {} chunks", buffer.len(), chunks);
            if hex {
                for chunk in buffer.chunks(PrinterConfig::MM58.chunk_size) {
                    let line: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
                    println!("{}", line.join(" "));
                }
            }
        }
    }

    Ok(())
}

fn config(args: &PrinterArgs) -> PrinterConfig {
    PrinterConfig {
        cut: args.cut,
        ..PrinterConfig::MM58
    }
}

fn profile(args: &PrinterArgs) -> PrinterProfile {
    let profile = PrinterProfile::default().with_scan_window(Duration::from_secs(args.scan_secs));
    match &args.name {
        Some(name) => profile.with_name_filter(name.clone()),
        None => profile,
    }
}

fn load_store(args: &PrinterArgs) -> Result<Option<StoreProfile>, PrinterError> {
    match &args.store {
        Some(path) => Ok(Some(serde_json::from_slice(&std::fs::read(path)?)?)),
        None => Ok(None),
    }
}

/// Read a receipt document; a `--store` profile overrides the one in the file.
fn load_document(path: &Path, args: &PrinterArgs) -> Result<ReceiptDocument, PrinterError> {
    let doc: ReceiptDocument = serde_json::from_slice(&std::fs::read(path)?)?;
    doc.validate()?;
    debug!(items = doc.items.len(), "Receipt document loaded");
    Ok(match load_store(args)? {
        Some(store) => doc.store(store),
        None => doc,
    })
}

async fn connect(
    args: &PrinterArgs,
    logo: Option<Vec<u8>>,
) -> Result<PrinterDriver<BleCentral>, PrinterError> {
    let central = BleCentral::new().await?;
    let mut driver = PrinterDriver::new(central, config(args), profile(args));
    if let Some(store) = load_store(args)? {
        driver = driver.with_store(store);
    }
    if let Some(logo) = logo {
        driver = driver.with_logo(logo);
    }

    let mut status = driver.subscribe();
    tokio::spawn(async move {
        while let Some(s) = status.recv().await {
            info!("{}", s);
        }
    });

    driver.connect().await?;
    Ok(driver)
}
