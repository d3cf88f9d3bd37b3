use std::{collections::HashMap, path::Path};

use crate::error::CarrierError;

/// Carrier name to email-gateway domain, e.g. `att` to `txt.att.net`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarrierDirectory {
    gateways: HashMap<String, String>,
}

impl CarrierDirectory {
    /// Loads a JSON object of `"carrier": "gateway-domain"` pairs.
    pub fn load(path: &Path) -> Result<Self, CarrierError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CarrierError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let gateways = serde_json::from_str(&raw).map_err(|source| CarrierError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self { gateways })
    }

    pub fn domain(&self, carrier: &str) -> Option<&str> {
        self.gateways.get(carrier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CarrierDirectory {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            gateways: iter
                .into_iter()
                .map(|(carrier, domain)| (carrier.into(), domain.into()))
                .collect(),
        }
    }
}
