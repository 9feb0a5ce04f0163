use std::time::Instant;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "saif-cli")]
#[command(about = "Run SAIF diagnostics through the gateway", long_about = None)]
struct Cli {
    /// Gateway base URL
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Query-style mount path on the gateway
    #[arg(short, long, default_value = "/api-proxy.php")]
    mount: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Healthcheck,
    /// SQL Server version
    SqlVersion,
    /// Identity the API uses against SQL
    SqlWhoami,
    /// Source IP SQL sees for the API
    SqlSrcIp,
    /// Resolve a hostname
    Dns { hostname: String },
    /// Reverse-resolve an IP address
    ReverseDns { ip: String },
    /// Fetch a URL from the API host
    Curl { url: String },
    /// Compute digits of pi
    Pi {
        #[arg(short, long, default_value_t = 1000)]
        digits: u32,
    },
    /// Dump the API environment
    Printenv,
    /// API host network information
    Ip,
    /// Call any endpoint
    Call {
        endpoint: String,
        #[arg(short, long)]
        path_param: Option<String>,
        /// Extra query parameters as key=value
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
}

impl Commands {
    /// `(endpoint, pathParam, extra params)` for this diagnostic.
    fn into_query(self) -> (String, Option<String>, Vec<(String, String)>) {
        let plain = |name: &str| (name.to_string(), None, Vec::new());
        match self {
            Commands::Healthcheck => plain("healthcheck"),
            Commands::SqlVersion => plain("sqlversion"),
            Commands::SqlWhoami => plain("sqlwhoami"),
            Commands::SqlSrcIp => plain("sqlsrcip"),
            Commands::Dns { hostname } => ("dns".into(), Some(hostname), Vec::new()),
            Commands::ReverseDns { ip } => ("reversedns".into(), Some(ip), Vec::new()),
            Commands::Curl { url } => ("curl".into(), None, vec![("url".into(), url)]),
            Commands::Pi { digits } => ("pi".into(), None, vec![("digits".into(), digits.to_string())]),
            Commands::Printenv => plain("printenv"),
            Commands::Ip => plain("ip"),
            Commands::Call {
                endpoint,
                path_param,
                params,
            } => (endpoint, path_param, params),
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let (endpoint, path_param, params) = cli.command.into_query();
    let mut query = vec![("endpoint".to_string(), endpoint.clone())];
    if let Some(param) = path_param {
        query.push(("pathParam".to_string(), param));
    }
    query.extend(params);

    let start = Instant::now();
    let res = client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), cli.mount))
        .query(&query)
        .send()
        .await?;

    print_response(&endpoint, res, start).await
}

async fn print_response(
    endpoint: &str,
    res: reqwest::Response,
    start: Instant,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let elapsed = start.elapsed();

    eprintln!("{} -> {} ({} ms)", endpoint, status, elapsed.as_millis());

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
