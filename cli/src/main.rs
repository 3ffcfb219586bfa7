use std::fs;
use std::io::{self, Read, Write};

use clap::{Parser, Subcommand};
use scene::Layout;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing user id; pass --user or set ROOMCRAFT_USER")]
    MissingUser,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid layout: {0}")]
    Layout(#[from] scene::SceneError),
}

#[derive(Parser, Debug)]
#[command(name = "roomcraft", about = "Roomcraft design generator and project CLI")]
struct Cli {
    #[arg(long, env = "ROOMCRAFT_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "ROOMCRAFT_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    user: Option<String>,
}

impl CliContext {
    fn user(&self) -> Result<&str, CliError> {
        self.user
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(CliError::MissingUser)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    /// Ask the server for room dimensions matching a description.
    Generate {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Convert a layout or saved project JSON into a glTF document. Runs offline.
    Export {
        #[arg(long, default_value = "-", help = "Layout JSON path, or - for stdin")]
        layout: String,
        #[arg(long, default_value = "-", help = "Output .gltf path, or - for stdout")]
        out: String,
    },
    /// Save a layout as a named project.
    Save {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "-", help = "Layout JSON path, or - for stdin")]
        layout: String,
    },
    /// List saved projects, newest first.
    List,
    /// Fetch a saved project.
    Load {
        project_id: Uuid,
        #[arg(long, default_value = "-", help = "Output path, or - for stdout")]
        out: String,
    },
    /// Show the subscription tier.
    Subscription,
    Upgrade,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = CliContext { base_url: cli.base_url, user: cli.user };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Generate { prompt } => {
            let body = serde_json::json!({ "prompt": prompt.join(" ") });
            let json = api_request(&ctx, reqwest::Method::POST, "/api/generate", Some(body)).await?;
            print_json(&json)
        }
        Command::Export { layout, out } => {
            let gltf = export_layout(&read_input(&layout)?)?;
            write_output(&out, &gltf)
        }
        Command::Save { name, layout } => {
            let body = save_body(&name, &read_input(&layout)?)?;
            let path = user_path(ctx.user()?, "projects");
            let json = api_request(&ctx, reqwest::Method::POST, &path, Some(body)).await?;
            print_json(&json)
        }
        Command::List => {
            let path = user_path(ctx.user()?, "projects");
            let json = api_request(&ctx, reqwest::Method::GET, &path, None).await?;
            print_json(&json)
        }
        Command::Load { project_id, out } => {
            let path = user_path(ctx.user()?, &format!("projects/{project_id}"));
            let json = api_request(&ctx, reqwest::Method::GET, &path, None).await?;
            write_output(&out, &serde_json::to_string_pretty(&json)?)
        }
        Command::Subscription => {
            let path = user_path(ctx.user()?, "subscription");
            let json = api_request(&ctx, reqwest::Method::GET, &path, None).await?;
            print_json(&json)
        }
        Command::Upgrade => {
            let path = user_path(ctx.user()?, "subscription/upgrade");
            let json = api_request(&ctx, reqwest::Method::POST, &path, None).await?;
            print_json(&json)
        }
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}/healthz", cli.base_url.trim_end_matches('/'));
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

async fn api_request(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}{}", cli.base_url.trim_end_matches('/'), path);

    let request = client.request(method, &url);
    let request = if let Some(json) = body { request.json(&json) } else { request };

    let response = request.send().await?;
    let status = response.status();
    let value = response
        .json::<Value>()
        .await
        .unwrap_or_else(|_| Value::Null);

    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: error_message(&value) });
    }

    Ok(value)
}

/// The `message` field of an error body, or the whole body when absent.
fn error_message(value: &Value) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| value.to_string(), str::to_owned)
}

/// Path under a user's collection. The id is a single percent-encoded segment.
fn user_path(user: &str, rest: &str) -> String {
    format!("/api/users/{}/{rest}", urlencoding::encode(user))
}

/// Parse a layout (a saved project body works too) and render it as glTF JSON.
fn export_layout(text: &str) -> Result<String, CliError> {
    let layout: Layout = serde_json::from_str(text)?;
    layout.validate()?;
    Ok(scene::export::export_gltf_string(&layout)?)
}

/// Request body for a save: the layout's saved fields plus the name.
fn save_body(name: &str, text: &str) -> Result<Value, CliError> {
    let layout: Layout = serde_json::from_str(text)?;
    layout.validate()?;
    Ok(serde_json::json!({
        "name": name,
        "rooms": layout.rooms,
        "roofs": layout.roofs,
        "environment": layout.environment,
    }))
}

fn read_input(path: &str) -> Result<String, CliError> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn write_output(path: &str, contents: &str) -> Result<(), CliError> {
    if path == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(contents.as_bytes())?;
        stdout.write_all(b"\n")?;
    } else {
        fs::write(path, contents)?;
        eprintln!("wrote {path}");
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
