use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::blockchain::Chain;
use crate::endpoint::EndpointResolver;
use crate::error::{LedgerError, Operation};
use crate::tx::{Transaction, TransactionResult};

pub const TRANSACTIONS_NEW_PATH: &str = "/transactions/new";
pub const CHAIN_PATH: &str = "/chain";

/// Request layer in front of a ledger node.
///
/// Neither operation retries. `fetch_chain` is a pure read and safe to
/// repeat; `submit_transaction` is not, a repeated submit may record the
/// transaction twice.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn submit_transaction(&self, tx: &Transaction) -> Result<TransactionResult, LedgerError>;

    async fn fetch_chain(&self) -> Result<Chain, LedgerError>;
}

/// [`LedgerClient`] over HTTP/JSON. The endpoint is resolved again for
/// every request.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    http_client: Client,
    resolver: EndpointResolver,
}

impl HttpLedgerClient {
    pub fn new(resolver: EndpointResolver) -> Self {
        Self::with_client(Client::new(), resolver)
    }

    pub fn with_client(http_client: Client, resolver: EndpointResolver) -> Self {
        Self {
            http_client,
            resolver,
        }
    }

    /// Every request is tagged as JSON, GETs included.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T, LedgerError> {
        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::Network {
                detail: e.to_string(),
            })?;

        let response = check_status(operation, response)?;

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                LedgerError::Decode {
                    operation,
                    detail: e.to_string(),
                }
            } else {
                LedgerError::Network {
                    detail: e.to_string(),
                }
            }
        })
    }
}

fn check_status(operation: Operation, response: Response) -> Result<Response, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(LedgerError::Remote {
        operation,
        status: status.as_u16(),
        status_text: status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_str().to_string()),
    })
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn submit_transaction(&self, tx: &Transaction) -> Result<TransactionResult, LedgerError> {
        let url = self.resolver.resolve().url(TRANSACTIONS_NEW_PATH)?;
        debug!(%url, sender = %tx.sender, recipient = %tx.recipient, amount = tx.amount, "submitting transaction");

        let result = self
            .send(Operation::SubmitTransaction, self.request(Method::POST, url).json(tx))
            .await;
        if let Err(e) = &result {
            error!(error = ?e, "failed to create transaction");
        }
        result
    }

    async fn fetch_chain(&self) -> Result<Chain, LedgerError> {
        let url = self.resolver.resolve().url(CHAIN_PATH)?;
        debug!(%url, "fetching chain");

        let result = self
            .send(Operation::FetchChain, self.request(Method::GET, url))
            .await;
        if let Err(e) = &result {
            error!(error = ?e, "failed to fetch chain");
        }
        result
    }
}
