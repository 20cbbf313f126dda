use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use http::Method;
use restkit::{
    Headers, HttpTransport, ParamValue, QueryParams, RequestBody, Resource, RestClient,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "restkit")]
#[command(about = "Access a REST resource from the command line")]
#[command(version)]
struct Cli {
    /// HTTP method to use
    #[arg(short, long, default_value = "get")]
    method: MethodArg,

    /// Base URI of the resource
    #[arg(value_name = "URI")]
    uri: String,

    /// Path appended to the URI as one segment
    #[arg(value_name = "PATH")]
    path: Option<String>,

    /// Request headers (format: "Name: Value"), repeatable
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Query parameters (format: "key=value"), repeatable
    #[arg(short = 'q', long = "param")]
    params: Vec<String>,

    /// Request body
    #[arg(short, long)]
    body: Option<String>,

    /// Send the body as JSON
    #[arg(long)]
    json: bool,

    /// Timeout in seconds
    #[arg(short, long, default_value = "30")]
    timeout: u64,

    /// Show response headers
    #[arg(long)]
    show_headers: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(ValueEnum, Clone)]
enum MethodArg {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
}

impl From<MethodArg> for Method {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::GET => Method::GET,
            MethodArg::HEAD => Method::HEAD,
            MethodArg::POST => Method::POST,
            MethodArg::PUT => Method::PUT,
            MethodArg::DELETE => Method::DELETE,
        }
    }
}

#[derive(ValueEnum, Clone)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_headers(raw: &[String]) -> anyhow::Result<Headers> {
    let mut headers = Headers::new();
    for header in raw {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("header {:?} is not \"Name: Value\"", header))?;
        headers.add(name.trim(), value.trim().to_string());
    }
    Ok(headers)
}

fn parse_params(raw: &[String]) -> anyhow::Result<QueryParams> {
    let mut params = QueryParams::new();
    for param in raw {
        let (key, value) = param
            .split_once('=')
            .with_context(|| format!("parameter {:?} is not \"key=value\"", param))?;
        params.add(key, ParamValue::from(value));
    }
    Ok(params)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let transport = HttpTransport::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .user_agent(concat!("restkit/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let resource = Resource::with_client(cli.uri.clone(), RestClient::with_transport(transport));

    let headers = parse_headers(&cli.headers)?;
    let params = parse_params(&cli.params)?;
    let body = match cli.body {
        Some(body) if cli.json => Some(RequestBody::Json(
            serde_json::from_str(&body).context("body is not valid JSON")?,
        )),
        Some(body) => Some(RequestBody::Text(body)),
        None => None,
    };

    let result = match resource
        .request(cli.method.into(), cli.path.as_deref(), body, Some(&headers), &params)
        .await
    {
        Ok(result) => result,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    match cli.format {
        OutputFormat::Text => {
            if cli.show_headers {
                println!("{} {}", "Status:".bold(), result.status().to_string().green());
                for (name, value) in result.response().headers().iter() {
                    println!("  {}: {}", name.cyan(), value);
                }
                println!();
            }
            println!("{}", result);
        }
        OutputFormat::Json => {
            let headers = result.response().headers().dict_of_lists();
            let json_response = serde_json::json!({
                "status": result.status_code(),
                "url": result.response().url(),
                "headers": headers,
                "body": result.as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&json_response)?);
        }
    }

    Ok(())
}
