use std::sync::Arc;

use clap::Parser;
use pdfqa_cli::cli::Cli;
use pdfqa_telemetry::{LogFormat, SharedTraceStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.settings.log_json { LogFormat::Json } else { LogFormat::Text };
    let traces = cli.settings.trace.then(|| Arc::new(SharedTraceStorage::new()));
    let telemetry = match &traces {
        Some(storage) => pdfqa_telemetry::init_with_storage(format, Arc::clone(storage)),
        None if format == LogFormat::Json => pdfqa_telemetry::init_json_telemetry(),
        None => pdfqa_telemetry::init_telemetry(),
    };
    if let Err(e) = telemetry {
        eprintln!("warning: {e}");
    }

    pdfqa_cli::run(cli, traces).await
}
