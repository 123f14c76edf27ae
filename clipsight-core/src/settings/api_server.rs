use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
#[allow(unused)]
#[readonly::make]
pub struct ApiServer {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Verified identity claims, keyed by subject id. The value is the bearer
    /// token the upstream auth layer issued for that subject. Token
    /// verification cryptography is out of scope here; this table consumes
    /// already-issued tokens.
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8412".to_string()
}

impl Default for ApiServer {
    fn default() -> Self {
        ApiServer {
            bind_address: default_bind_address(),
            api_keys: HashMap::new(),
        }
    }
}
