use std::path::PathBuf;

use mail2tracks::config::AppConfig;
use mail2tracks::sync::client::{RemoteClient, TracksClient};
use mail2tracks::sync::keyring;
use mail2tracks::sync::resolve::{ResourceKind, parse_resource_list};

#[tokio::main]
async fn main() {
    mail2tracks::logging::init("tracks_check");
    log::set_max_level(log::LevelFilter::Info);

    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from);

    let config = match AppConfig::load_or_default_path(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            println!("Config error: {}", e);
            return;
        }
    };

    println!("=== Tracks connectivity check ===");

    for target in &config.targets {
        println!("\n--- {} (user {}) ---", target.base_url, target.user);
        println!("  Recipients: {}", target.emails.join(", "));
        if let Some(froms) = &target.froms {
            println!("  Senders: {}", froms.join(", "));
        }
        println!(
            "  Default context: {}, strict: {}, bounce: {}",
            target.default_context,
            target.strict,
            target.bounce.as_deref().unwrap_or("(none)")
        );

        let password = match keyring::target_password(target).await {
            Ok(pw) => pw,
            Err(e) => {
                println!("  No credentials: {}", e);
                continue;
            }
        };

        let client = match TracksClient::for_target(target, &password) {
            Ok(c) => c,
            Err(e) => {
                println!("  Client error: {}", e);
                continue;
            }
        };

        for kind in [ResourceKind::Context, ResourceKind::Project] {
            let listing = match client.get(kind.path()).await {
                Ok(xml) => xml,
                Err(e) => {
                    println!("  Error listing {}s: {}", kind, e);
                    continue;
                }
            };
            match parse_resource_list(&listing, kind, &client.url(kind.path())) {
                Ok(resources) => {
                    println!("  {} {}s:", resources.len(), kind);
                    for r in &resources {
                        let marker = if kind == ResourceKind::Context && r.id == target.default_context {
                            " (default)"
                        } else {
                            ""
                        };
                        println!("    [{}] {}{}", r.id, r.name, marker);
                    }
                    if kind == ResourceKind::Context
                        && !resources.iter().any(|r| r.id == target.default_context)
                    {
                        println!("  WARNING: default context {} not found", target.default_context);
                    }
                }
                Err(e) => println!("  {}", e),
            }
        }
    }

    println!("\n=== Done ===");
}
