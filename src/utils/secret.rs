use std::{env, fs, io};

use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("neither `{name}_FILE` nor `{name}` is set")]
    Missing { name: String },
    #[error("failed to read secret file `{path}`")]
    Unreadable {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("secret `{0}` is empty")]
    Empty(String),
}

/// Resolves secret `name`.
///
/// `{name}_FILE` takes precedence and names a file holding the value (docker/k8s
/// secrets); otherwise `{name}` itself is read. Surrounding whitespace is trimmed.
pub fn read_secret(name: &str) -> Result<String, SecretError> {
    let file_var = format!("{name}_FILE");

    let value = match env::var(&file_var) {
        Ok(path) => {
            debug!(%path, "Reading secret from file");
            fs::read_to_string(&path).map_err(|source| {
                error!(%path, ?source, "Error reading secret file");
                SecretError::Unreadable { path, source }
            })?
        }
        Err(_) => env::var(name).map_err(|_| SecretError::Missing {
            name: name.to_string(),
        })?,
    };

    let value = value.trim();
    if value.is_empty() {
        return Err(SecretError::Empty(name.to_string()));
    }
    Ok(value.to_string())
}
