//! Remote account lookup: the trait the resolver works against, the
//! reqwest-backed ledger client, and an in-memory stub for tests and
//! offline dry runs.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgerlink_core::model::{AccountType, TransactionGroupRecord};

/// Which account field a search query matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Id,
    Iban,
    Number,
    Name,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Id => "id",
            SearchField::Iban => "iban",
            SearchField::Number => "number",
            SearchField::Name => "name",
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ledger returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed ledger response: {0}")]
    Decode(String),
}

/// An account as confirmed by the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerAccount {
    pub id: u64,
    pub name: String,
    pub account_type: AccountType,
    pub iban: Option<String>,
    pub number: Option<String>,
    pub bic: Option<String>,
}

/// A remote account search returning 0, 1, or more matches per call.
#[allow(async_fn_in_trait)]
pub trait AccountLookup {
    async fn search(&self, field: SearchField, query: &str)
    -> Result<Vec<LedgerAccount>, LookupError>;
}

/// HTTP client for the ledger API.
pub struct LedgerClient {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    data: Vec<SearchEntry>,
}

#[derive(Deserialize)]
struct SearchEntry {
    id: String,
    attributes: AccountAttributes,
}

#[derive(Deserialize)]
struct AccountAttributes {
    name: String,
    #[serde(rename = "type")]
    account_type: String,
    iban: Option<String>,
    account_number: Option<String>,
    bic: Option<String>,
}

#[derive(Serialize)]
struct StoreTransactionBody<'a> {
    transactions: [&'a TransactionGroupRecord; 1],
}

impl LedgerClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        LedgerClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Submit one normalized transaction. Validation failures come back as
    /// [`LookupError::Status`] with the ledger's response body.
    pub async fn create_transaction(
        &self,
        record: &TransactionGroupRecord,
    ) -> Result<(), LookupError> {
        let url = format!("{}/api/v1/transactions", self.base_url);
        let body = StoreTransactionBody {
            transactions: [record],
        };
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl AccountLookup for LedgerClient {
    async fn search(
        &self,
        field: SearchField,
        query: &str,
    ) -> Result<Vec<LedgerAccount>, LookupError> {
        let url = format!("{}/api/v1/search/accounts", self.base_url);
        debug!("searching accounts: field={} query={query:?}", field.as_str());
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("field", field.as_str()), ("query", query)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: SearchResponse = resp.json().await?;
        parsed.data.into_iter().map(into_account).collect()
    }
}

fn into_account(entry: SearchEntry) -> Result<LedgerAccount, LookupError> {
    let id = entry
        .id
        .parse::<u64>()
        .map_err(|_| LookupError::Decode(format!("non-numeric account id {:?}", entry.id)))?;
    let account_type = entry
        .attributes
        .account_type
        .parse::<AccountType>()
        .unwrap_or(AccountType::Unknown);
    Ok(LedgerAccount {
        id,
        name: entry.attributes.name,
        account_type,
        iban: entry.attributes.iban,
        number: entry.attributes.account_number,
        bic: entry.attributes.bic,
    })
}

/// In-memory lookup over a fixed account list. Backs unit and integration
/// tests; also usable for offline dry runs.
#[derive(Debug, Clone, Default)]
pub struct StubLookup {
    accounts: Vec<LedgerAccount>,
}

impl StubLookup {
    pub fn new(accounts: Vec<LedgerAccount>) -> Self {
        StubLookup { accounts }
    }
}

impl AccountLookup for StubLookup {
    async fn search(
        &self,
        field: SearchField,
        query: &str,
    ) -> Result<Vec<LedgerAccount>, LookupError> {
        let matches = self
            .accounts
            .iter()
            .filter(|acct| match field {
                SearchField::Id => query.parse::<u64>() == Ok(acct.id),
                SearchField::Iban => acct
                    .iban
                    .as_deref()
                    .is_some_and(|i| i.eq_ignore_ascii_case(query)),
                SearchField::Number => acct
                    .number
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(query)),
                SearchField::Name => acct.name.eq_ignore_ascii_case(query),
            })
            .cloned()
            .collect();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: u64, name: &str, iban: Option<&str>) -> LedgerAccount {
        LedgerAccount {
            id,
            name: name.to_string(),
            account_type: AccountType::Asset,
            iban: iban.map(|s| s.to_string()),
            number: None,
            bic: None,
        }
    }

    #[tokio::test]
    async fn test_stub_lookup_by_id_and_iban() {
        let stub = StubLookup::new(vec![
            asset(1, "Checking", Some("NL01BANK0123456789")),
            asset(2, "Savings", None),
        ]);
        let by_id = stub.search(SearchField::Id, "2").await.unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].name, "Savings");

        let by_iban = stub
            .search(SearchField::Iban, "nl01bank0123456789")
            .await
            .unwrap();
        assert_eq!(by_iban.len(), 1);
        assert_eq!(by_iban[0].id, 1);
    }

    #[tokio::test]
    async fn test_stub_lookup_name_is_case_insensitive() {
        let stub = StubLookup::new(vec![asset(1, "Checking", None)]);
        let matches = stub.search(SearchField::Name, "CHECKING").await.unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_search_response_decoding() {
        let raw = r#"{"data": [{"id": "7", "attributes": {
            "name": "Checking", "type": "asset",
            "iban": "NL01BANK0123456789", "account_number": "123", "bic": null
        }}]}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        let account = into_account(parsed.data.into_iter().next().unwrap()).unwrap();
        assert_eq!(account.id, 7);
        assert_eq!(account.account_type, AccountType::Asset);
        assert_eq!(account.number.as_deref(), Some("123"));
    }

    #[test]
    fn test_unknown_account_type_decodes_to_unknown() {
        let raw = r#"{"data": [{"id": "9", "attributes": {
            "name": "X", "type": "initial-balance",
            "iban": null, "account_number": null, "bic": null
        }}]}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        let account = into_account(parsed.data.into_iter().next().unwrap()).unwrap();
        assert_eq!(account.account_type, AccountType::Unknown);
    }
}
