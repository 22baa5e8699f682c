use std::io::Read;
use std::path::PathBuf;

use mail2tracks::config::AppConfig;
use mail2tracks::core::email::InboundEmail;
use mail2tracks::sync::bounce::MailBouncer;
use mail2tracks::sync::{self, KeyringConnector, SyncOutcome, keyring};

/// Command-line options.
struct Args {
    config: Option<PathBuf>,
    debug: bool,
    set_password: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        debug: false,
        set_password: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--debug" => args.debug = true,
            "--set-password" => {
                let url = iter.next().ok_or("--set-password needs a base URL")?;
                args.set_password = Some(url);
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(args)
}

/// Read a password line from stdin and store it for the matching target.
async fn set_password(config: &AppConfig, base_url: &str) -> Result<(), String> {
    let wanted = base_url.trim_end_matches('/');
    let target = config
        .targets
        .iter()
        .find(|t| t.base_url.trim_end_matches('/') == wanted)
        .ok_or_else(|| format!("No target configured for {}", base_url))?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| format!("Failed to read password: {}", e))?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err("Empty password".to_string());
    }

    keyring::store_password(&target.base_url, &target.user, password).await?;
    println!("Stored password for {} at {}", target.user, target.base_url);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;
    mail2tracks::logging::init("mail2tracks");

    let config = AppConfig::load_or_default_path(args.config.as_deref())?;
    mail2tracks::set_debug_logging(args.debug || config.debug_logging);

    if let Some(base_url) = &args.set_password {
        set_password(&config, base_url).await?;
        return Ok(());
    }

    let mut raw = Vec::new();
    std::io::stdin().read_to_end(&mut raw)?;
    let Some(email) = InboundEmail::from_raw(&raw) else {
        log::error!("Could not parse inbound message ({} bytes)", raw.len());
        return Err("could not parse inbound message".into());
    };

    let bouncer = MailBouncer::new(config.smtp.clone());
    let outcomes = sync::process_email(&config, &email, &KeyringConnector, &bouncer).await;

    let created = outcomes.iter().filter_map(SyncOutcome::created_id).count();
    let bounced = outcomes
        .iter()
        .filter(|o| matches!(o, SyncOutcome::Bounced(_)))
        .count();
    log::info!(
        "Done: {} created, {} bounced, {} targets",
        created,
        bounced,
        outcomes.len()
    );

    Ok(())
}
