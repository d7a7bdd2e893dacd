// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Directory Object Client
 * Paginated directory API access with continuation tokens
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::auth::TokenProvider;
use crate::config::ReconConfig;
use crate::errors::{ReconError, ReconResult};
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::types::{DirectoryObject, ObjectKind};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One page of a paginated directory response
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    #[serde(default)]
    pub value: Vec<T>,

    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Wire shape of a directory object as the API returns it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphObject {
    #[serde(rename = "@odata.type", default)]
    pub odata_type: Option<String>,

    pub id: String,

    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,

    #[serde(rename = "userPrincipalName", default)]
    pub user_principal_name: Option<String>,
}

impl GraphObject {
    /// Kind as declared by the OData type annotation, when present
    pub fn kind(&self) -> Option<ObjectKind> {
        match self.odata_type.as_deref() {
            Some(t) if t.ends_with(".user") => Some(ObjectKind::User),
            Some(t) if t.ends_with(".group") => Some(ObjectKind::Group),
            Some(t) if t.ends_with(".directoryRole") => Some(ObjectKind::Role),
            _ => None,
        }
    }

    /// Convert into the crawl data model under the given kind
    pub fn into_directory_object(self, kind: ObjectKind) -> DirectoryObject {
        let display = self
            .display_name
            .filter(|d| !d.is_empty())
            .or_else(|| self.user_principal_name.clone())
            .unwrap_or_else(|| self.id.clone());

        let mut object = DirectoryObject::new(self.id, kind, display);
        if let Some(upn) = self.user_principal_name {
            object = object.with_principal_name(upn);
        }
        object
    }
}

/// Directory API client: bearer-token injection, bounded retry with
/// Retry-After support, continuation-link pagination
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    token_provider: Arc<dyn TokenProvider>,
    retry: RetryConfig,
    page_size: usize,
}

impl DirectoryClient {
    pub fn new(config: &ReconConfig, token_provider: Arc<dyn TokenProvider>) -> ReconResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.network.timeout_secs))
            .connect_timeout(Duration::from_secs(config.network.connect_timeout_secs))
            .user_agent(config.network.user_agent.clone())
            .build()
            .map_err(|e| ReconError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.endpoints.graph_base.trim_end_matches('/').to_string(),
            token_provider,
            retry: RetryConfig::default().with_max_attempts(config.crawler.max_retries),
            page_size: config.crawler.page_size,
        })
    }

    /// Fetch a single object by path. All errors surface to the caller.
    pub async fn get_object(&self, path: &str) -> ReconResult<GraphObject> {
        let url = format!("{}{}", self.base_url, path);
        self.get_json(&url, path).await
    }

    /// Fetch a single object, mapping a missing object to `None`
    pub async fn get_object_optional(&self, path: &str) -> ReconResult<Option<GraphObject>> {
        match self.get_object(path).await {
            Ok(object) => Ok(Some(object)),
            Err(ReconError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Fetch one page of a collection by absolute URL (either the
    /// initial collection URL or a continuation link)
    pub async fn fetch_page(&self, url: &str, resource: &str) -> ReconResult<ODataPage<GraphObject>> {
        self.get_json(url, resource).await
    }

    /// Fetch every page of a collection, following continuation links
    /// until none remain or the per-collection cap is reached
    pub async fn fetch_all(&self, path: &str, cap: usize) -> ReconResult<Vec<GraphObject>> {
        let mut url = if path.contains('?') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?$top={}", self.base_url, path, self.page_size)
        };

        let mut objects: Vec<GraphObject> = Vec::new();

        loop {
            let page = self.fetch_page(&url, path).await?;

            debug!(
                resource = path,
                page_len = page.value.len(),
                total = objects.len(),
                "Fetched directory page"
            );

            objects.extend(page.value);

            if objects.len() >= cap {
                objects.truncate(cap);
                debug!(resource = path, cap = cap, "Result cap reached");
                break;
            }

            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(objects)
    }

    /// Single GET with status mapping, wrapped in bounded retry
    async fn get_json<T: DeserializeOwned>(&self, url: &str, resource: &str) -> ReconResult<T> {
        retry_with_backoff(&self.retry, resource, || {
            self.request_once::<T>(url, resource)
        })
        .await
    }

    async fn request_once<T: DeserializeOwned>(&self, url: &str, resource: &str) -> ReconResult<T> {
        let token = self.token_provider.get_token(&self.base_url, None)?;

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ReconError::Unauthorized {
                resource: resource.to_string(),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ReconError::NotFound {
                resource: resource.to_string(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);

            return Err(ReconError::RateLimited {
                resource: resource.to_string(),
                retry_after,
            });
        }

        if status.is_server_error() {
            return Err(ReconError::Network {
                reason: format!("directory API returned {} for {}", status, resource),
            });
        }

        if !status.is_success() {
            return Err(ReconError::General(format!(
                "directory API returned {} for {}",
                status, resource
            )));
        }

        response.json::<T>().await.map_err(|e| ReconError::Parse {
            context: resource.to_string(),
            reason: e.to_string(),
        })
    }
}
