//! Web server command.

use std::net::SocketAddr;

use console::style;

use crate::config::Settings;

const DEFAULT_PORT: u16 = 8000;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let bind = parse_bind_address(bind.unwrap_or(&settings.bind));
    let addr: SocketAddr = tokio::net::lookup_host(&bind)
        .await?
        .next()
        .ok_or_else(|| anyhow::anyhow!("Could not resolve bind address '{}'", bind))?;

    println!("{} Starting Scrivener server at http://{}", style("→").cyan(), addr);
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, addr).await
}

/// Parse a bind address that can be:
/// - Just a port: "8000" -> 127.0.0.1:8000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:8000
/// - Host and port: "0.0.0.0:8000" -> 0.0.0.0:8000
fn parse_bind_address(bind: &str) -> String {
    if let Ok(port) = bind.parse::<u16>() {
        return format!("127.0.0.1:{}", port);
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if port_str.parse::<u16>().is_ok() {
            return format!("{}:{}", host, port_str);
        }
    }

    format!("{}:{}", bind, DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(parse_bind_address("9000"), "127.0.0.1:9000");
        assert_eq!(parse_bind_address("0.0.0.0"), "0.0.0.0:8000");
        assert_eq!(parse_bind_address("localhost:3030"), "localhost:3030");
    }
}
