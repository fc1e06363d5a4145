use std::net::SocketAddr;

use axum::body::to_bytes;
use axum::http::{HeaderName, HeaderValue, Method, Request};
use clap::Parser;

use forward_auth::config::ForwardAuthConfig;
use forward_auth::{ClientConnection, Decision, ForwardAuthGate};

/// Ask an authorization service what it would decide for a request,
/// using exactly the headers the gateway would send.
#[derive(Parser)]
#[command(name = "forward-auth-probe")]
#[command(about = "Run one forward-auth decision and print the outcome", long_about = None)]
struct Cli {
    /// Authorization endpoint.
    #[arg(short, long)]
    url: String,

    /// Request target of the simulated client request.
    #[arg(short, long, default_value = "/")]
    path: String,

    /// Method of the simulated client request.
    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Extra client header, `name: value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Claim header to forward on allow. Repeatable; defaults to the identity-claim set.
    #[arg(short, long = "forward")]
    forward: Vec<String>,

    /// Simulated client address.
    #[arg(long, default_value = "127.0.0.1:50000")]
    peer: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ForwardAuthConfig {
        url: cli.url,
        ..Default::default()
    };
    if !cli.forward.is_empty() {
        config.forward_headers = cli.forward;
    }
    let gate = ForwardAuthGate::from_config("probe", &config)?;

    let mut request = Request::builder()
        .method(Method::from_bytes(cli.method.as_bytes())?)
        .uri(cli.path.as_str());
    if let Some(headers) = request.headers_mut() {
        for raw in &cli.headers {
            let (name, value) = raw
                .split_once(':')
                .ok_or_else(|| format!("header '{}' is not 'name: value'", raw))?;
            headers.append(
                HeaderName::from_bytes(name.trim().as_bytes())?,
                HeaderValue::from_str(value.trim())?,
            );
        }
    }
    let (parts, _) = request.body(())?.into_parts();
    let conn = ClientConnection::new(cli.peer, "127.0.0.1:8080".parse()?);

    match gate.engine().decide(&parts, &conn).await? {
        Decision::Allow { headers } => {
            println!("ALLOW");
            for (name, value) in headers.iter() {
                println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
        }
        Decision::Deny(response) => {
            println!("DENY {}", response.status());
            for (name, value) in response.headers() {
                println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
            let body = to_bytes(response.into_body(), usize::MAX).await?;
            println!();
            println!("{}", String::from_utf8_lossy(&body));
        }
    }

    Ok(())
}
