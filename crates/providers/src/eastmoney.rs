use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use common::{ConceptSource, Config, Error, Result, Symbol};

const PROVIDER: &str = "eastmoney";
const CLIST_PATH: &str = "/api/qt/clist/get";
const PAGE_SIZE: u32 = 100;
/// Filter selecting every concept board.
const CONCEPT_BOARDS: &str = "m:90 t:3 f:!50";

/// Client for the Eastmoney quote-list API, used as an independent source of
/// concept-board constituents.
pub struct EastmoneyClient {
    base_url: String,
    http: Client,
    /// Concept board name -> board code (`BKxxxx`), fetched once per client.
    boards: OnceCell<HashMap<String, String>>,
}

impl EastmoneyClient {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
            boards: OnceCell::new(),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(
            &cfg.eastmoney_url,
            crate::http_client(cfg.provider_timeout)?,
        ))
    }

    /// Every `(code, name)` pair matching the list filter `fs`, across all pages.
    async fn list(&self, fs: &str) -> Result<Vec<ClistItem>> {
        let url = format!("{}{CLIST_PATH}", self.base_url);
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let page_str = page.to_string();
            let page_size = PAGE_SIZE.to_string();
            let resp = self
                .http
                .get(&url)
                .query(&[
                    ("pn", page_str.as_str()),
                    ("pz", page_size.as_str()),
                    ("po", "1"),
                    ("np", "1"),
                    ("fltt", "2"),
                    ("fid", "f12"),
                    ("fs", fs),
                    ("fields", "f12,f14"),
                ])
                .send()
                .await
                .map_err(|e| Error::Http(e.to_string()))?;

            let status = resp.status();
            let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
            if !status.is_success() {
                return Err(Error::lookup(PROVIDER, fs, format!("HTTP {status}: {text}")));
            }

            let (total, batch) = parse_page(fs, &text)?;
            let fetched = batch.len();
            items.extend(batch);
            debug!(fs, page, fetched, total, "Fetched Eastmoney list page");

            if fetched == 0 || items.len() as u64 >= total {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    async fn boards(&self) -> Result<&HashMap<String, String>> {
        self.boards
            .get_or_try_init(|| async {
                let boards = self.list(CONCEPT_BOARDS).await?;
                Ok::<_, Error>(
                    boards
                        .into_iter()
                        .filter_map(|item| item.f14.map(|name| (name, item.f12)))
                        .collect(),
                )
            })
            .await
    }
}

#[async_trait]
impl ConceptSource for EastmoneyClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn concept_members(&self, concept: &str) -> Result<Vec<Symbol>> {
        let board = self
            .boards()
            .await?
            .get(concept)
            .cloned()
            .ok_or_else(|| Error::lookup(PROVIDER, concept, "unknown concept board"))?;

        let members = self.list(&format!("b:{board} f:!50")).await?;
        Ok(members.into_iter().map(|item| Symbol::new(item.f12)).collect())
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ClistResponse {
    #[serde(default)]
    data: Option<ClistData>,
}

#[derive(Deserialize)]
struct ClistData {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    diff: Vec<ClistItem>,
}

#[derive(Debug, Deserialize)]
struct ClistItem {
    /// Instrument or board code.
    f12: String,
    /// Display name.
    #[serde(default)]
    f14: Option<String>,
}

/// A null `data` field means the filter matched nothing.
fn parse_page(fs: &str, body: &str) -> Result<(u64, Vec<ClistItem>)> {
    let resp: ClistResponse = serde_json::from_str(body)
        .map_err(|e| Error::lookup(PROVIDER, fs, format!("bad response: {e}")))?;
    Ok(resp
        .data
        .map(|d| (d.total, d.diff))
        .unwrap_or((0, Vec::new())))
}
