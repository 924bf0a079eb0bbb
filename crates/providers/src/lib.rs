//! HTTP clients for the external reference-data providers.
//!
//! Every client implements one or more of the provider traits in `common`;
//! the pool resolver only ever sees those traits.

pub mod eastmoney;
pub mod tushare;

pub use eastmoney::EastmoneyClient;
pub use tushare::TushareClient;

use std::time::Duration;

use common::{Error, Result};

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .user_agent("Mozilla/5.0 (X11; Linux x86_64) stockpick/0.1")
        .build()
        .map_err(|e| Error::Http(e.to_string()))
}
