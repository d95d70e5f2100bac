use anyhow::{anyhow, Result};
use std::env;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use url_components::UrlComponents;

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <url> [key=value ...]", args[0]);
        return Err(anyhow!("Missing URL argument"));
    }

    let mut url = UrlComponents::from_url(&args[1]);
    if url == UrlComponents::new() {
        eprintln!("Nothing meaningful parsed from '{}'", args[1]);
    }

    // Any further key=value arguments are appended to the query.
    for arg in &args[2..] {
        match arg.split_once('=') {
            Some((key, value)) => {
                url.append_to_query(key, value);
            }
            None => {
                eprintln!("Skipping argument without '=': {}", arg);
            }
        }
    }

    println!("Components:");
    println!("  scheme:   {}", url.scheme().unwrap_or("-"));
    println!("  user:     {}", url.user().unwrap_or("-"));
    println!("  pass:     {}", url.pass().unwrap_or("-"));
    println!("  host:     {}", url.host().unwrap_or("-"));
    println!("  port:     {}", url.port().unwrap_or("-"));
    println!("  path:     {}", url.path().unwrap_or("-"));
    println!("  fragment: {}", url.fragment().unwrap_or("-"));

    if !url.query().is_empty() {
        println!("  query:");
        for (key, value) in url.query().iter() {
            println!("    {} = {:?}", key, value);
        }
    }

    println!("\nRebuilt URL: {}", url.to_url_string());

    Ok(())
}
