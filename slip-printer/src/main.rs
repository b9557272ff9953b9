use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use slip_printer::config::Config;
use slip_printer::logger::init_logger;
use slip_printer::{AnyPrintJob, PrinterClass};

/// Print tagged text lines on a receipt printer
#[derive(Debug, Parser)]
#[command(name = "slip-print", version)]
struct Cli {
    /// JSON printer profile (overrides PRINTER_* variables)
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Printer address, device path, queue name or file
    #[arg(short, long)]
    share: Option<String>,

    /// Printer class: 1=Text 2=Html 3=Port 4=Demo other=Slip
    #[arg(short, long)]
    class: Option<i32>,

    /// Characters per line
    #[arg(short, long)]
    width: Option<usize>,

    /// Cut the paper at the end of the document
    #[arg(long)]
    cut: bool,

    /// Input file, stdin when omitted
    input: Option<PathBuf>,
}

fn read_lines(input: Option<&PathBuf>) -> anyhow::Result<Vec<String>> {
    let content = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    Ok(content.lines().map(str::to_string).collect())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env().with_profile_file(cli.profile.as_ref())?;
    init_logger(&config.log_level);

    if let Some(share) = cli.share {
        config.profile.share_name = share;
    }
    if let Some(class) = cli.class {
        config.profile.printer_class = PrinterClass::from(class);
    }
    if let Some(width) = cli.width {
        config.profile.chars_per_line = width;
    }
    if cli.cut {
        config.profile.cut_on_end = true;
    }

    let lines = read_lines(cli.input.as_ref())?;
    let mut job = AnyPrintJob::for_profile(&config.profile)?;

    tracing::info!(
        printer = %config.profile.share_name,
        job = job.kind(),
        lines = lines.len(),
        "Printing"
    );

    let report = job.print(&lines).await?;
    tracing::info!(?report, "Done");

    Ok(())
}
