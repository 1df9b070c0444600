//! REST implementation of the menu repository.
//!
//! Talks to the admin backend (`/menu`, `/menu/tree`, `/menu/reorder`,
//! `/menu/templates`, `/faq`) with a shared `reqwest` client. Non-2xx answers
//! become [`AppError::HttpStatus`] carrying the response body so backend
//! validation messages reach the operator.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::menu::form::MenuItemPayload;
use crate::menu::model::{MenuItem, MenuItemId};
use crate::menu::reorder::ReorderEntry;

use super::records::{
    FaqEntry, FaqPage, ListEnvelope, MenuItemBody, MenuItemRecord, MenuTemplate, ReorderBody, TemplateApplied,
    TreeRecord,
};
use super::{FaqDirectory, MenuRepository};

/// Largest page the FAQ endpoint serves.
const FAQ_PAGE_SIZE: u32 = 100;

pub struct HttpMenuRepository {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
}

impl HttpMenuRepository {
    /// Creates a repository for `base_url` (e.g. `http://localhost:8000/api`).
    pub fn new(base_url: &str, token: Option<SecretString>) -> AppResult<Self> {
        let parsed = Url::parse(base_url)?;
        let client = Client::builder()
            .user_agent(concat!("subadmin/", env!("CARGO_PKG_VERSION")))
            .timeout(config::network::timeout())
            .connect_timeout(config::network::connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Repository configured from `ADMIN_API_URL` / `ADMIN_API_TOKEN`.
    pub fn from_env() -> AppResult<Self> {
        let token = config::ADMIN_API_TOKEN
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_string()));
        Self::new(&config::ADMIN_API_URL, token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> AppResult<String> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            log::warn!("Backend answered {}: {}", status, body);
            return Err(AppError::HttpStatus { status, body });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        let body = self.send(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_item(&self, builder: RequestBuilder) -> AppResult<MenuItem> {
        let record: MenuItemRecord = self.send_json(builder).await?;
        Ok(MenuItem::try_from(record)?)
    }
}

fn into_items(records: Vec<MenuItemRecord>) -> AppResult<Vec<MenuItem>> {
    records
        .into_iter()
        .map(|record| MenuItem::try_from(record).map_err(AppError::from))
        .collect()
}

#[async_trait]
impl MenuRepository for HttpMenuRepository {
    async fn load(&self) -> AppResult<Vec<MenuItem>> {
        let envelope: ListEnvelope<MenuItemRecord> = self.send_json(self.request(Method::GET, "/menu")).await?;
        let items = into_items(envelope.into_items())?;
        log::info!("Loaded {} menu items", items.len());
        Ok(items)
    }

    async fn load_tree(&self) -> AppResult<Vec<MenuItem>> {
        let envelope: ListEnvelope<TreeRecord> = self.send_json(self.request(Method::GET, "/menu/tree")).await?;
        let mut records = Vec::new();
        for node in envelope.into_items() {
            node.flatten_into(&mut records);
        }
        into_items(records)
    }

    async fn create(&self, payload: &MenuItemPayload) -> AppResult<MenuItem> {
        let body = MenuItemBody::from(payload);
        self.send_item(self.request(Method::POST, "/menu").json(&body)).await
    }

    async fn update(&self, id: MenuItemId, payload: &MenuItemPayload) -> AppResult<MenuItem> {
        let body = MenuItemBody::from(payload);
        self.send_item(self.request(Method::PUT, &format!("/menu/{}", id)).json(&body))
            .await
    }

    async fn delete(&self, id: MenuItemId) -> AppResult<()> {
        self.send(self.request(Method::DELETE, &format!("/menu/{}", id))).await?;
        Ok(())
    }

    async fn reorder(&self, entries: &[ReorderEntry]) -> AppResult<()> {
        let body = ReorderBody {
            items: entries.to_vec(),
        };
        self.send(self.request(Method::POST, "/menu/reorder").json(&body)).await?;
        Ok(())
    }

    async fn duplicate(&self, id: MenuItemId) -> AppResult<MenuItem> {
        self.send_item(self.request(Method::POST, &format!("/menu/duplicate/{}", id)))
            .await
    }

    async fn templates(&self) -> AppResult<Vec<MenuTemplate>> {
        let envelope: ListEnvelope<MenuTemplate> =
            self.send_json(self.request(Method::GET, "/menu/templates")).await?;
        Ok(envelope.into_items())
    }

    async fn apply_template(&self, template_id: &str, clear_existing: bool) -> AppResult<TemplateApplied> {
        let path = format!("/menu/templates/{}/apply", template_id);
        let builder = self
            .request(Method::POST, &path)
            .query(&[("clear_existing", clear_existing)]);
        self.send_json(builder).await
    }
}

#[async_trait]
impl FaqDirectory for HttpMenuRepository {
    async fn faq_entries(&self) -> AppResult<Vec<FaqEntry>> {
        let mut entries = Vec::new();
        let mut page = 1u32;
        loop {
            let builder = self
                .request(Method::GET, "/faq")
                .query(&[("page", page), ("per_page", FAQ_PAGE_SIZE)]);
            let batch: FaqPage = self.send_json(builder).await?;
            let done = batch.items.is_empty() || page >= batch.pages;
            entries.extend(batch.items);
            if done {
                break;
            }
            page += 1;
        }
        log::debug!("Loaded {} FAQ entries", entries.len());
        Ok(entries)
    }
}
