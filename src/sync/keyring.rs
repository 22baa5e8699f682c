use std::collections::HashMap;

use crate::config::TracksConfig;

pub(crate) const SERVICE_NAME: &str = "mail2tracks";

fn attributes<'a>(base_url: &'a str, user: &'a str) -> HashMap<&'static str, &'a str> {
    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("server", base_url);
    attrs.insert("user", user);
    attrs
}

/// Store a Tracks password in the system keyring via Secret Service.
pub async fn store_password(base_url: &str, user: &str, password: &str) -> Result<(), String> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| format!("Failed to connect to keyring: {}", e))?;

    keyring
        .create_item(
            &format!("Tracks ({})", base_url),
            &attributes(base_url, user),
            password.as_bytes(),
            true, // replace existing
        )
        .await
        .map_err(|e| format!("Failed to store credentials: {}", e))?;

    Ok(())
}

/// Load a Tracks password from the system keyring.
pub async fn load_password(base_url: &str, user: &str) -> Result<Option<String>, String> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| format!("Failed to connect to keyring: {}", e))?;

    let items = keyring
        .search_items(&attributes(base_url, user))
        .await
        .map_err(|e| format!("Failed to search keyring: {}", e))?;

    if let Some(item) = items.first() {
        let secret_bytes = item
            .secret()
            .await
            .map_err(|e| format!("Failed to read secret: {}", e))?;
        let password = String::from_utf8(secret_bytes.to_vec())
            .map_err(|e| format!("Invalid UTF-8 in secret: {}", e))?;
        return Ok(Some(password));
    }

    Ok(None)
}

/// The target's password: from the config file if set, else the keyring.
pub async fn target_password(target: &TracksConfig) -> Result<String, String> {
    if let Some(password) = &target.password {
        return Ok(password.clone());
    }
    load_password(&target.base_url, &target.user)
        .await?
        .ok_or_else(|| "no password in config or keyring".to_string())
}
