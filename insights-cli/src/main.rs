use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use insights_core::logging::init_tracing;
use insights_core::ClientConfig;
use insights_engine::{
    parse_named_fields, ErrorHandler, HttpInsightsClient, InsightsError, QueryRequest,
    QuerySession, Record, SessionConfig,
};
use tracing::{info, warn};

mod error;
mod options;
mod output;
mod progress;

use error::CliError;
use options::CliOverrides;
use output::JsonLinesSink;
use progress::ProgressLine;

#[derive(Parser)]
#[command(name = "acwi")]
#[command(
    about = "Run a CloudWatch Logs Insights query and write the results as JSON lines",
    version,
    long_about = None
)]
struct Cli {
    /// Query text or YAML option document (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Log group to query; repeat or comma separate for several
    #[arg(short, long = "group", value_delimiter = ',')]
    groups: Vec<String>,

    /// Start time: epoch seconds, days offset (-1), signed duration (-2h) or timestamp
    #[arg(short, long, allow_hyphen_values = true)]
    start: Option<String>,

    /// End time, same forms as --start
    #[arg(short, long, allow_hyphen_values = true)]
    end: Option<String>,

    /// Maximum number of records to return
    #[arg(short, long)]
    limit: Option<u32>,

    /// Write results to this file instead of stdout
    #[arg(short, long = "out")]
    out_file: Option<PathBuf>,

    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Override the logs service endpoint URL
    #[arg(long, env = "ACWI_ENDPOINT")]
    endpoint: Option<String>,

    /// Field whose value must be decoded as JSON; repeat for several
    #[arg(long = "json-field", value_delimiter = ',')]
    json_fields: Vec<String>,

    /// Keep string values that look like JSON objects as strings
    #[arg(long, default_value_t = false)]
    no_jsonify: bool,

    /// Suppress the progress display and the summary
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Write whatever was received when the query fails instead of exiting with an error
    #[arg(long, default_value_t = false)]
    partial_on_error: bool,

    #[arg(long, default_value = "1s")]
    poll_interval: humantime::Duration,

    /// Give up (and stop the remote query) after this long
    #[arg(long)]
    timeout: Option<humantime::Duration>,

    #[arg(long, env = "ACWI_LOG")]
    log_level: Option<String>,

    /// Terminal width used to cut progress previews
    #[arg(long, env = "COLUMNS", default_value_t = 80, hide_env_values = true)]
    width: usize,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            groups: self.groups.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
            limit: self.limit,
            out_file: self.out_file.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            json_fields: self.json_fields.clone(),
            no_jsonify: self.no_jsonify,
            quiet: self.quiet,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let raw = options::read_input(cli.file.as_deref()).await?;
    let document = options::parse_document(&raw)?;
    let opts = options::resolve(document, cli.overrides())?;

    let request = QueryRequest::builder(opts.query.clone())
        .scopes(opts.groups.iter().cloned())
        .limit(opts.limit)
        .start(opts.start)
        .end(opts.end)
        .infer_structure(opts.jsonify)
        .build(Utc::now())?;

    let config =
        ClientConfig::from_env()?.with_overrides(opts.region.clone(), opts.endpoint.clone());
    let client = HttpInsightsClient::new(&config)?;
    info!(endpoint = %client.endpoint(), "using logs endpoint");

    let session = QuerySession::new(Arc::new(client)).with_config(SessionConfig {
        poll_interval: cli.poll_interval.into(),
        deadline: cli.timeout.map(Into::into),
    });

    let quiet = opts
        .quiet
        .unwrap_or_else(|| !atty::is(atty::Stream::Stderr));
    let progress = ProgressLine::new(opts.limit, !quiet, cli.width);
    let keep_partial = |fault: InsightsError, partial: &[Record]| {
        warn!(error = %fault, rows = partial.len(), "query failed, keeping partial results");
        Some(partial.to_vec())
    };
    let handler: Option<&dyn ErrorHandler> = if cli.partial_on_error {
        Some(&keep_partial)
    } else {
        None
    };

    let outcome = session
        .run_until(&request, Some(&progress), handler, interrupted())
        .await;
    progress.clear();
    let records = parse_named_fields(outcome?, &opts.json_fields)?;

    let mut sink = JsonLinesSink::open(opts.out_file.as_deref())?;
    sink.write_all(&records)?;
    let written = sink.finish()?;

    if opts.out_file.is_some() && !quiet {
        eprintln!("Wrote {} rows", written);
    }

    Ok(())
}

/// Resolves on Ctrl-C. Stays pending if the signal cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
