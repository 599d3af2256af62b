//! Account role resolution. Takes a partial account descriptor from the raw
//! row and turns it into the best account record the ledger can confirm,
//! falling back to passing the raw identifying data through when nothing
//! matches. Lookup precedence: id, IBAN, number, name.
//!
//! IBAN and number matches are deliberately conservative: an ambiguous match
//! (2+ results) or a match on a virtual counterparty account (expense or
//! revenue) is treated as "not found" so the ledger itself can arbitrate by
//! name later.

use log::debug;

use ledgerlink_core::error::PipelineError;
use ledgerlink_core::model::{AccountDescriptor, AccountType, Direction, TransactionType};

use crate::lookup::{AccountLookup, LedgerAccount, SearchField};

pub struct AccountResolver<'a, C: AccountLookup> {
    lookup: &'a C,
}

impl<'a, C: AccountLookup> AccountResolver<'a, C> {
    pub fn new(lookup: &'a C) -> Self {
        AccountResolver { lookup }
    }

    /// Resolve one side of a transaction.
    ///
    /// `transaction_type` is the provisional type at resolution time; it
    /// only influences the IBAN/number virtual-account demotion. The
    /// `default_account` (if any) is returned when the descriptor carries no
    /// identifying data at all.
    pub async fn resolve(
        &self,
        descriptor: &AccountDescriptor,
        transaction_type: Option<TransactionType>,
        default_account: Option<&AccountDescriptor>,
    ) -> Result<AccountDescriptor, PipelineError> {
        let direction = descriptor.direction;

        if let Some(id) = descriptor.id.filter(|id| *id > 0) {
            if let Some(account) = self.find_by_id(id).await? {
                return Ok(from_ledger(account, direction));
            }
        }

        if let Some(iban) = text(&descriptor.iban) {
            if let Some(account) = self
                .find_by_key(SearchField::Iban, iban, transaction_type)
                .await?
            {
                return Ok(from_ledger(account, direction));
            }
        }

        if let Some(number) = text(&descriptor.number) {
            if let Some(account) = self
                .find_by_key(SearchField::Number, number, transaction_type)
                .await?
            {
                return Ok(from_ledger(account, direction));
            }
        }

        if let Some(name) = text(&descriptor.name) {
            if let Some(account) = self.find_by_name(name).await? {
                return Ok(from_ledger(account, direction));
            }
        }

        // Nothing matched. Pass raw identifying data through untyped, fall
        // back to the default account, or give the empty descriptor back.
        if descriptor.id.is_some() || text(&descriptor.name).is_some() {
            debug!("unresolved {direction:?} account, passing raw id/name through");
            let mut passthrough = descriptor.clone();
            passthrough.account_type = None;
            passthrough.bic = None;
            return Ok(passthrough);
        }
        if text(&descriptor.iban).is_some() {
            debug!("unresolved {direction:?} account, passing raw IBAN through");
            let mut passthrough = descriptor.clone();
            passthrough.account_type = None;
            passthrough.bic = None;
            return Ok(passthrough);
        }
        if let Some(default_account) = default_account {
            debug!("blank {direction:?} account, using the default account");
            return Ok(default_account.clone().with_direction(direction));
        }
        Ok(descriptor.clone())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LedgerAccount>, PipelineError> {
        let results = self.search(SearchField::Id, &id.to_string()).await?;
        Ok(results.into_iter().next())
    }

    /// IBAN/number lookup with the virtual-account and ambiguity demotions.
    async fn find_by_key(
        &self,
        field: SearchField,
        query: &str,
        transaction_type: Option<TransactionType>,
    ) -> Result<Option<LedgerAccount>, PipelineError> {
        let results = self.search(field, query).await?;
        if results.len() >= 2 {
            debug!(
                "{} search for {query:?} matched {} accounts, treating as not found",
                field.as_str(),
                results.len()
            );
            return Ok(None);
        }
        let Some(account) = results.into_iter().next() else {
            return Ok(None);
        };
        if account.account_type == AccountType::Expense
            && transaction_type == Some(TransactionType::Deposit)
        {
            debug!(
                "{} match {:?} is an expense account on a deposit, treating as not found",
                field.as_str(),
                account.name
            );
            return Ok(None);
        }
        if matches!(
            account.account_type,
            AccountType::Expense | AccountType::Revenue
        ) {
            debug!(
                "{} match {:?} is a virtual {} account, treating as not found",
                field.as_str(),
                account.name,
                account.account_type
            );
            return Ok(None);
        }
        Ok(Some(account))
    }

    /// Name lookup only ever matches concrete account kinds (asset, loan,
    /// debt, mortgage) whose name equals the query case-insensitively.
    async fn find_by_name(&self, name: &str) -> Result<Option<LedgerAccount>, PipelineError> {
        let results = self.search(SearchField::Name, name).await?;
        Ok(results.into_iter().find(|account| {
            account.account_type.matchable_by_name()
                && account.name.eq_ignore_ascii_case(name)
        }))
    }

    async fn search(
        &self,
        field: SearchField,
        query: &str,
    ) -> Result<Vec<LedgerAccount>, PipelineError> {
        self.lookup
            .search(field, query)
            .await
            .map_err(|e| PipelineError::Resolution(e.to_string()))
    }
}

fn from_ledger(account: LedgerAccount, direction: Direction) -> AccountDescriptor {
    AccountDescriptor {
        id: Some(account.id),
        name: Some(account.name),
        iban: account.iban,
        number: account.number,
        bic: account.bic,
        account_type: Some(account.account_type),
        direction,
    }
}

fn text(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlink_core::model::{AccountType, Direction};

    use crate::lookup::StubLookup;

    fn account(id: u64, name: &str, account_type: AccountType) -> LedgerAccount {
        LedgerAccount {
            id,
            name: name.to_string(),
            account_type,
            iban: Some(format!("NL0{id}BANK0000000000")),
            number: Some(format!("n-{id}")),
            bic: None,
        }
    }

    fn descriptor(direction: Direction) -> AccountDescriptor {
        AccountDescriptor::empty(direction)
    }

    #[tokio::test]
    async fn test_id_lookup_wins_over_everything() {
        let stub = StubLookup::new(vec![
            account(7, "Checking", AccountType::Asset),
            account(8, "Other", AccountType::Asset),
        ]);
        let resolver = AccountResolver::new(&stub);
        let mut d = descriptor(Direction::Source);
        d.id = Some(7);
        d.name = Some("Other".to_string());
        let resolved = resolver.resolve(&d, None, None).await.unwrap();
        assert_eq!(resolved.id, Some(7));
        assert_eq!(resolved.name.as_deref(), Some("Checking"));
        assert_eq!(resolved.account_type, Some(AccountType::Asset));
    }

    #[tokio::test]
    async fn test_iban_lookup_resolves_asset() {
        let stub = StubLookup::new(vec![account(3, "Savings", AccountType::Asset)]);
        let resolver = AccountResolver::new(&stub);
        let mut d = descriptor(Direction::Source);
        d.iban = Some("NL03BANK0000000000".to_string());
        let resolved = resolver.resolve(&d, None, None).await.unwrap();
        assert_eq!(resolved.id, Some(3));
        assert_eq!(resolved.account_type, Some(AccountType::Asset));
    }

    #[tokio::test]
    async fn test_ambiguous_iban_is_not_found() {
        let twin_iban = "NL09TWIN0000000000";
        let mut a = account(1, "A", AccountType::Asset);
        let mut b = account(2, "B", AccountType::Asset);
        a.iban = Some(twin_iban.to_string());
        b.iban = Some(twin_iban.to_string());
        let stub = StubLookup::new(vec![a, b]);
        let resolver = AccountResolver::new(&stub);
        let mut d = descriptor(Direction::Destination);
        d.iban = Some(twin_iban.to_string());
        let resolved = resolver.resolve(&d, None, None).await.unwrap();
        // Falls through to the raw-IBAN passthrough.
        assert_eq!(resolved.id, None);
        assert_eq!(resolved.account_type, None);
        assert_eq!(resolved.iban.as_deref(), Some(twin_iban));
    }

    #[tokio::test]
    async fn test_expense_match_on_deposit_is_demoted() {
        let stub = StubLookup::new(vec![account(4, "Shop", AccountType::Expense)]);
        let resolver = AccountResolver::new(&stub);
        let mut d = descriptor(Direction::Source);
        d.iban = Some("NL04BANK0000000000".to_string());
        let resolved = resolver
            .resolve(&d, Some(TransactionType::Deposit), None)
            .await
            .unwrap();
        assert_eq!(resolved.id, None);
        assert_eq!(resolved.account_type, None);
    }

    #[tokio::test]
    async fn test_revenue_match_by_number_is_demoted() {
        let stub = StubLookup::new(vec![account(5, "Employer", AccountType::Revenue)]);
        let resolver = AccountResolver::new(&stub);
        let mut d = descriptor(Direction::Source);
        d.number = Some("n-5".to_string());
        let resolved = resolver.resolve(&d, None, None).await.unwrap();
        assert_eq!(resolved.id, None, "revenue by number must not resolve");
    }

    #[tokio::test]
    async fn test_name_match_only_for_concrete_types() {
        let stub = StubLookup::new(vec![
            account(6, "Supermarket", AccountType::Expense),
            account(7, "House Loan", AccountType::Loan),
        ]);
        let resolver = AccountResolver::new(&stub);

        let mut expense = descriptor(Direction::Destination);
        expense.name = Some("Supermarket".to_string());
        let resolved = resolver.resolve(&expense, None, None).await.unwrap();
        assert_eq!(resolved.id, None, "expense is never matched by name");
        assert_eq!(resolved.name.as_deref(), Some("Supermarket"));

        let mut loan = descriptor(Direction::Destination);
        loan.name = Some("house loan".to_string());
        let resolved = resolver.resolve(&loan, None, None).await.unwrap();
        assert_eq!(resolved.id, Some(7), "loan matches case-insensitively");
    }

    #[tokio::test]
    async fn test_blank_descriptor_uses_default_account() {
        let stub = StubLookup::default();
        let resolver = AccountResolver::new(&stub);
        let default = AccountDescriptor {
            id: Some(1),
            name: Some("Main".to_string()),
            iban: None,
            number: None,
            bic: None,
            account_type: Some(AccountType::Asset),
            direction: Direction::Source,
        };
        let d = descriptor(Direction::Destination);
        let resolved = resolver.resolve(&d, None, Some(&default)).await.unwrap();
        assert_eq!(resolved.id, Some(1));
        assert_eq!(resolved.direction, Direction::Destination);
    }

    #[tokio::test]
    async fn test_blank_descriptor_without_default_stays_blank() {
        let stub = StubLookup::default();
        let resolver = AccountResolver::new(&stub);
        let d = descriptor(Direction::Destination);
        let resolved = resolver.resolve(&d, None, None).await.unwrap();
        assert!(resolved.is_blank());
    }
}
