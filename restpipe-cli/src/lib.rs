//! Command-line front end for restpipe.
//!
//! Each invocation runs one pipe or auth request against `--base-url` and
//! yields the result as JSON.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use restpipe_auth::{AuthSessionRunner, AuthenticationConfig};
use restpipe_http::{HeaderAndBody, HttpConfig, HttpTransportProvider, Url};
use restpipe_pipeline::{
    Callback, LoaderPipe, Outcome, PipeConfig, ReadFilter, RequestHandle, callback_fn,
};
use restpipe_types::RequestIdentity;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "restpipe")]
#[command(about = "Read, save and remove REST resources; log in and out")]
pub struct Cli {
    /// Service base URL
    #[arg(short, long)]
    pub base_url: Url,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value = "60000")]
    pub timeout_ms: u64,

    /// Extra header sent with every request (NAME:VALUE)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List records of a resource
    Read {
        resource: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        /// Field constraint (FIELD=VALUE), repeatable
        #[arg(short, long = "where", value_parser = parse_pair)]
        filters: Vec<(String, String)>,
    },
    /// Create or update a record from a JSON object
    Save { resource: String, record: String },
    /// Delete a record by id
    Remove { resource: String, id: String },
    /// Log in with a username and password
    Login {
        username: String,
        password: String,
        #[arg(long, default_value = "auth/login")]
        endpoint: String,
    },
    /// Log out of the current session
    Logout {
        #[arg(long, default_value = "auth/logout")]
        endpoint: String,
    },
    /// Enroll a new user (FIELD=VALUE pairs)
    Enroll {
        #[arg(value_parser = parse_pair, required = true)]
        fields: Vec<(String, String)>,
        #[arg(long, default_value = "auth/enroll")]
        endpoint: String,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected FIELD=VALUE, got {raw:?}"))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected NAME:VALUE, got {raw:?}"))
}

/// Runs the parsed command and returns its JSON result.
pub async fn run(cli: &Cli) -> Result<Value> {
    let http_config = HttpConfig {
        default_headers: cli.headers.iter().cloned().collect(),
        ..HttpConfig::default()
    };
    let provider = Arc::new(
        HttpTransportProvider::with_config(&http_config).context("Failed to build HTTP client")?,
    );
    let timeout = Duration::from_millis(cli.timeout_ms);

    match &cli.command {
        Command::Read {
            resource,
            limit,
            offset,
            filters,
        } => {
            let pipe = pipe(cli, resource, timeout, provider)?;
            let mut filter = ReadFilter::new();
            filter.limit = *limit;
            filter.offset = *offset;
            for (field, value) in filters {
                filter = filter.where_eq(field.as_str(), value.as_str());
            }
            let records = outcome(|cb| pipe.read(filter, &RequestIdentity::default(), cb)).await?;
            Ok(Value::Array(records))
        }
        Command::Save { resource, record } => {
            let record: Value =
                serde_json::from_str(record).context("Record is not valid JSON")?;
            if !record.is_object() {
                bail!("Record must be a JSON object");
            }
            let pipe = pipe(cli, resource, timeout, provider)?;
            outcome(|cb| pipe.save(record, &RequestIdentity::default(), cb)).await
        }
        Command::Remove { resource, id } => {
            let pipe = pipe(cli, resource, timeout, provider)?;
            outcome(|cb| pipe.remove(id, &RequestIdentity::default(), cb)).await?;
            Ok(json!({ "removed": id }))
        }
        Command::Login {
            username,
            password,
            endpoint,
        } => {
            let config = AuthenticationConfig::default()
                .with_login_endpoint(endpoint.as_str())
                .with_timeout(timeout);
            let runner = AuthSessionRunner::new(cli.base_url.clone(), &config, provider)
                .context("Invalid auth configuration")?;
            let response = runner.login(username, password).await.context("Login failed")?;
            Ok(response_json(&response))
        }
        Command::Logout { endpoint } => {
            let config = AuthenticationConfig::default()
                .with_logout_endpoint(endpoint.as_str())
                .with_timeout(timeout);
            let runner = AuthSessionRunner::new(cli.base_url.clone(), &config, provider)
                .context("Invalid auth configuration")?;
            let response = runner.logout().await.context("Logout failed")?;
            Ok(response_json(&response))
        }
        Command::Enroll { fields, endpoint } => {
            let config = AuthenticationConfig::default()
                .with_enroll_endpoint(endpoint.as_str())
                .with_timeout(timeout);
            let runner = AuthSessionRunner::new(cli.base_url.clone(), &config, provider)
                .context("Invalid auth configuration")?;
            let user_data: BTreeMap<String, String> = fields.iter().cloned().collect();
            let response = runner.enroll(&user_data).await.context("Enroll failed")?;
            Ok(response_json(&response))
        }
    }
}

fn pipe(
    cli: &Cli,
    resource: &str,
    timeout: Duration,
    provider: Arc<HttpTransportProvider>,
) -> Result<LoaderPipe<Value>> {
    let config = PipeConfig::new(cli.base_url.clone(), resource).with_timeout(timeout);
    debug!(resource, url = %cli.base_url, "opening pipe");
    LoaderPipe::rest(config, provider).with_context(|| format!("Invalid pipe for {resource}"))
}

/// Registers a callback through `register` and waits for its outcome.
async fn outcome<T, R>(register: R) -> Result<T>
where
    T: Send + 'static,
    R: FnOnce(Arc<dyn Callback<T>>) -> RequestHandle,
{
    let (tx, rx) = oneshot::channel::<Outcome<T>>();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let tx_err = Arc::clone(&tx);
    let send = |slot: &Mutex<Option<oneshot::Sender<Outcome<T>>>>, outcome: Outcome<T>| {
        if let Some(tx) = slot.lock().ok().and_then(|mut guard| guard.take()) {
            let _ = tx.send(outcome);
        }
    };
    let callback = callback_fn(
        move |value| send(&tx, Ok(value)),
        move |error| send(&tx_err, Err(error)),
    );
    register(callback);

    match rx.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(anyhow!("{error}")),
        Err(_) => bail!("Request was dropped before completing"),
    }
}

/// Renders a response as `{status, headers, body}`, with the body parsed as
/// JSON when possible.
pub fn response_json(response: &HeaderAndBody) -> Value {
    let headers: Map<String, Value> = response
        .headers
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    let body = if response.body.is_empty() {
        Value::Null
    } else {
        response
            .json::<Value>()
            .unwrap_or_else(|_| Value::String(response.body_text()))
    };
    json!({
        "status": response.status,
        "headers": headers,
        "body": body,
    })
}
