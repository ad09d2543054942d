use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use super::TaxLookupError;
use crate::config::TaxLookupConfig;

/// Remote source of sales-tax rates keyed by ZIP.
pub trait TaxRateLookup: Send + Sync {
    /// Rate in percent for an already-normalized ZIP.
    fn fetch(&self, zip: &str) -> impl Future<Output = Result<f64, TaxLookupError>> + Send;
}

#[derive(Debug, Deserialize)]
struct TaxRateBody {
    tax_rate: f64,
}

/// `GET {endpoint}?zip=NNNNN` returning `{"tax_rate": number}`.
#[derive(Debug, Clone)]
pub struct HttpTaxRateLookup {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTaxRateLookup {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TaxRateLookup for HttpTaxRateLookup {
    fn fetch(&self, zip: &str) -> impl Future<Output = Result<f64, TaxLookupError>> + Send {
        let request = self.client.get(&self.endpoint).query(&[("zip", zip)]);
        async move {
            let response = request.send().await.map_err(TaxLookupError::Transport)?;
            let status = response.status();
            if !status.is_success() {
                return Err(TaxLookupError::Status(status.as_u16()));
            }

            let body: TaxRateBody = response.json().await.map_err(TaxLookupError::Decode)?;
            if body.tax_rate.is_finite() && body.tax_rate >= 0.0 {
                Ok(body.tax_rate)
            } else {
                Err(TaxLookupError::InvalidRate(body.tax_rate))
            }
        }
    }
}

/// Lookup chosen from configuration: HTTP when an endpoint is set.
#[derive(Debug, Clone)]
pub enum ConfiguredTaxLookup {
    Http(HttpTaxRateLookup),
    Disabled,
}

impl ConfiguredTaxLookup {
    pub fn from_config(config: &TaxLookupConfig) -> Result<Self, reqwest::Error> {
        match &config.lookup_url {
            Some(url) => Ok(Self::Http(HttpTaxRateLookup::new(
                url.clone(),
                config.timeout(),
            )?)),
            None => Ok(Self::Disabled),
        }
    }
}

impl TaxRateLookup for ConfiguredTaxLookup {
    fn fetch(&self, zip: &str) -> impl Future<Output = Result<f64, TaxLookupError>> + Send {
        let http = match self {
            Self::Http(lookup) => Some(lookup.fetch(zip)),
            Self::Disabled => None,
        };
        async move {
            match http {
                Some(fetch) => fetch.await,
                None => Err(TaxLookupError::Disabled),
            }
        }
    }
}
