use crate::config::Settings;
use crate::domain::vendor::{Vendor, VendorCategory};
use crate::ingest::types::DirectoryResponse;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/vendors";
const DEFAULT_RETRIES: u32 = 3;

#[async_trait::async_trait]
pub trait VendorDirectoryClient: Send + Sync {
    fn directory_name(&self) -> &'static str;

    /// Fetches vendor records, already validated into `Vendor`, plus the raw
    /// response body for audit rows.
    async fn fetch_vendors(
        &self,
        category: Option<VendorCategory>,
    ) -> Result<(Vec<Vendor>, Value)>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonVendorDirectory {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonVendorDirectory {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_vendor_directory_base_url()?.to_string();
        let api_key = settings.vendor_directory_api_key.clone();

        let timeout_secs = std::env::var("VENDOR_DIRECTORY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("VENDOR_DIRECTORY_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("VENDOR_DIRECTORY_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build vendor directory http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(
        &self,
        category: Option<VendorCategory>,
    ) -> Result<(Vec<Vendor>, Value)> {
        let url = self.url();
        let headers = self.headers()?;

        let mut req = self.http.get(url).headers(headers);
        if let Some(category) = category {
            req = req.query(&[("category", category.as_str())]);
        }

        let res = req.send().await.context("vendor directory request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read vendor directory response")?;
        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("vendor directory response is not valid JSON: {text}"))?;

        if !status.is_success() {
            anyhow::bail!("vendor directory HTTP {status}: {raw_json}");
        }

        let parsed = serde_json::from_value::<DirectoryResponse>(raw_json.clone())
            .context("failed to parse vendor directory response into DirectoryResponse")?;

        let mut vendors = Vec::with_capacity(parsed.vendors.len());
        for record in parsed.vendors {
            vendors.push(record.validate_and_into_vendor()?);
        }

        if let Some(category) = category {
            for vendor in &vendors {
                anyhow::ensure!(
                    vendor.category == category,
                    "directory returned category {} for a {category} query",
                    vendor.category
                );
            }
        }

        Ok((vendors, raw_json))
    }
}

#[async_trait::async_trait]
impl VendorDirectoryClient for HttpJsonVendorDirectory {
    fn directory_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_vendors(
        &self,
        category: Option<VendorCategory>,
    ) -> Result<(Vec<Vendor>, Value)> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let res = self.fetch_once(category).await;
            match res {
                Ok(out) => return Ok(out),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, error = %err, "vendor directory fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_parses_and_validates_each_record() {
        let v = json!({
            "vendors": [
                {"name": "Lotus Banquets", "category": "venue", "rating": 4.4},
                {"name": "Spice Route Caterers", "category": "catering", "rating": 4.8}
            ]
        });

        let parsed: DirectoryResponse = serde_json::from_value(v).unwrap();
        let vendors: Vec<Vendor> = parsed
            .vendors
            .into_iter()
            .map(|r| r.validate_and_into_vendor().unwrap())
            .collect();
        assert_eq!(vendors.len(), 2);
        assert_eq!(vendors[1].category, VendorCategory::Catering);
    }

    #[test]
    fn one_bad_record_poisons_the_batch() {
        let v = json!({
            "vendors": [
                {"name": "Lotus Banquets", "category": "venue", "rating": 4.4},
                {"name": "", "category": "venue", "rating": 4.0}
            ]
        });

        let parsed: DirectoryResponse = serde_json::from_value(v).unwrap();
        let res: Result<Vec<Vendor>> = parsed
            .vendors
            .into_iter()
            .map(|r| r.validate_and_into_vendor())
            .collect();
        assert!(res.is_err());
    }
}
