use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::debug;

use common::{
    ConceptSource, ConceptTagLookup, Config, Error, IndustryRow, IndustryTable,
    IndustryTableSource, Result, Symbol,
};

const PROVIDER: &str = "tushare";

/// Client for the Tushare Pro HTTP API.
///
/// Serves the bulk concept pool (`concept` + `concept_detail` by board id),
/// the per-symbol concept-tag lookup (`concept_detail` by `ts_code`) and the
/// listed-instrument industry table (`stock_basic`).
pub struct TushareClient {
    token: String,
    base_url: String,
    http: Client,
    /// Concept board name -> board id, fetched once per client.
    concept_ids: OnceCell<HashMap<String, String>>,
}

impl TushareClient {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>, http: Client) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into(),
            http,
            concept_ids: OnceCell::new(),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(
            &cfg.tushare_token,
            &cfg.tushare_url,
            crate::http_client(cfg.provider_timeout)?,
        ))
    }

    /// Call one API endpoint and return its tabular payload.
    async fn query(&self, api_name: &str, params: Value, fields: &str) -> Result<Table> {
        let body = json!({
            "api_name": api_name,
            "token": self.token,
            "params": params,
            "fields": fields,
        });

        debug!(api = api_name, "Querying Tushare");
        let resp = self
            .http
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::lookup(PROVIDER, api_name, format!("HTTP {status}: {text}")));
        }

        Table::from_response(api_name, &text)
    }

    async fn concept_ids(&self) -> Result<&HashMap<String, String>> {
        self.concept_ids
            .get_or_try_init(|| async {
                let table = self.query("concept", json!({ "src": "ts" }), "code,name").await?;
                let codes = table.strings("code")?;
                let names = table.strings("name")?;
                Ok::<_, Error>(names.into_iter().zip(codes).collect())
            })
            .await
    }
}

#[async_trait]
impl ConceptSource for TushareClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn concept_members(&self, concept: &str) -> Result<Vec<Symbol>> {
        let id = self
            .concept_ids()
            .await?
            .get(concept)
            .cloned()
            .ok_or_else(|| Error::lookup(PROVIDER, concept, "unknown concept board"))?;

        let table = self
            .query("concept_detail", json!({ "id": id }), "id,concept_name,ts_code,name")
            .await?;
        Ok(table
            .strings("ts_code")?
            .iter()
            .map(|code| Symbol::from_qualified(code))
            .collect())
    }
}

#[async_trait]
impl ConceptTagLookup for TushareClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn concept_tags(&self, symbol: &Symbol) -> Result<Vec<String>> {
        let table = self
            .query(
                "concept_detail",
                json!({ "ts_code": symbol.ts_code() }),
                "id,concept_name,ts_code",
            )
            .await?;
        table.strings("concept_name")
    }
}

#[async_trait]
impl IndustryTableSource for TushareClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn industry_table(&self) -> Result<IndustryTable> {
        let table = self
            .query(
                "stock_basic",
                json!({ "exchange": "", "list_status": "L" }),
                "ts_code,name,industry,exchange",
            )
            .await?;
        table.industry_rows().map(IndustryTable::new)
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<Table>,
}

/// Column-oriented payload: `fields` names the columns of each `items` row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub items: Vec<Vec<Value>>,
}

impl Table {
    fn from_response(api_name: &str, body: &str) -> Result<Self> {
        let resp: ApiResponse = serde_json::from_str(body)
            .map_err(|e| Error::lookup(PROVIDER, api_name, format!("bad response: {e}")))?;
        if resp.code != 0 {
            let msg = resp.msg.unwrap_or_default();
            return Err(Error::lookup(PROVIDER, api_name, format!("code {}: {msg}", resp.code)));
        }
        Ok(resp.data.unwrap_or_default())
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| Error::lookup(PROVIDER, name, "column missing from response"))
    }

    /// Non-null string cells of one column.
    pub fn strings(&self, name: &str) -> Result<Vec<String>> {
        let idx = self.column(name)?;
        Ok(self
            .items
            .iter()
            .filter_map(|row| row.get(idx).and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    fn industry_rows(&self) -> Result<Vec<IndustryRow>> {
        let ts_code = self.column("ts_code")?;
        let name = self.column("name").ok();
        let industry = self.column("industry").ok();
        let exchange = self.column("exchange").ok();

        Ok(self
            .items
            .iter()
            .filter_map(|row| {
                Some(IndustryRow {
                    ts_code: cell(row, Some(ts_code))?,
                    name: cell(row, name),
                    industry: cell(row, industry),
                    exchange: cell(row, exchange),
                })
            })
            .collect())
    }
}

fn cell(row: &[Value], idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| row.get(i))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tabular_payload() {
        let body = r#"{
            "request_id": "abc",
            "code": 0,
            "msg": "",
            "data": {
                "fields": ["id", "concept_name", "ts_code"],
                "items": [["TS2", "robotics", "300003.SZ"], ["TS9", "wind power", "300003.SZ"]],
                "has_more": false
            }
        }"#;
        let table = Table::from_response("concept_detail", body).unwrap();
        assert_eq!(table.strings("concept_name").unwrap(), vec!["robotics", "wind power"]);
    }

    #[test]
    fn api_error_code_is_lookup_error() {
        let body = r#"{"code": 40203, "msg": "rate limited", "data": null}"#;
        let err = Table::from_response("concept_detail", body).unwrap_err();
        match err {
            Error::ProviderLookup { provider, reason, .. } => {
                assert_eq!(provider, "tushare");
                assert!(reason.contains("rate limited"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_column_is_an_error() {
        let table = Table {
            fields: vec!["ts_code".into()],
            items: vec![],
        };
        assert!(table.strings("concept_name").is_err());
    }

    #[test]
    fn builds_industry_rows_with_null_industry() {
        let table = Table {
            fields: vec!["ts_code".into(), "name".into(), "industry".into(), "exchange".into()],
            items: vec![
                vec![json!("600001.SH"), json!("Alpha"), json!("Hardware"), json!("SSE")],
                vec![json!("300003.SZ"), json!("Gamma"), Value::Null, json!("SZSE")],
            ],
        };
        let rows = table.industry_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].industry.as_deref(), Some("Hardware"));
        assert!(rows[1].industry.is_none());
    }
}
