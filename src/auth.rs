use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::AuthConfig;

/// Produces the opaque master token attached to privileged admin RPCs.
///
/// An explicit token from the config file wins; otherwise basic credentials
/// are folded into one, matching what the admin gateway accepts.
pub fn retrieve_master_token(auth: &AuthConfig) -> Result<String> {
    if let Some(token) = &auth.token {
        if !token.is_empty() {
            return Ok(token.clone());
        }
    }
    match (&auth.username, &auth.password) {
        (Some(username), Some(password)) => {
            Ok(STANDARD.encode(format!("{username}:{password}")))
        }
        _ => Err(anyhow!(
            "no admin credentials configured; set auth.token or auth.username and auth.password"
        )),
    }
}
