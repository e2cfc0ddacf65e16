//! Tests for the account directory.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{AccountId, AccountSetId};

use super::{
    AccountDirectory, AccountPatch, AccountState, AccountType, Direction, NewAccount,
    standard_chart,
};
use crate::context::RequestContext;
use crate::error::LedgerError;
use crate::test_support::{Books, date};

async fn books() -> Books {
    Books::open(date(2024, 1, 1), date(2024, 1, 31)).await
}

#[tokio::test]
async fn test_first_child_takes_over_leaf_contents() {
    let books = books().await;
    books.post("1002", "3001", dec!(100.00), date(2024, 1, 5)).await;
    let bank = books.id("1002").await;

    let mut uow = books.uow();
    let child = AccountDirectory::create_account(
        &mut uow,
        books.ctx,
        NewAccount::new("10020001", "Main Street Bank", AccountType::CurrentAsset),
    )
    .await
    .unwrap();
    books.commit(uow).await;

    assert_eq!(child.level, 2);
    assert_eq!(child.parent_id, Some(bank));
    assert_eq!(child.direction, Direction::Debit);
    assert!(child.is_leaf);
    assert!(!books.account("1002").await.is_leaf);

    let moved = books.store.transactions_for_account(child.id).await.unwrap();
    assert_eq!(moved.len(), 1);
    assert!(books.store.transactions_for_account(bank).await.unwrap().is_empty());

    let period = &books.periods().await[0];
    assert_eq!(period.holder(child.id).balance, dec!(100.00));
    assert_eq!(period.holder(bank).balance, dec!(100.00));
}

#[tokio::test]
async fn test_opening_balance_seeds_account_and_ancestors() {
    let books = books().await;
    let cash = books.id("1001").await;

    let mut uow = books.uow();
    let petty = AccountDirectory::create_account(
        &mut uow,
        books.ctx,
        NewAccount::new("10010001", "Petty Cash", AccountType::CurrentAsset)
            .with_initial_balance(dec!(250.005)),
    )
    .await
    .unwrap();
    books.commit(uow).await;

    assert_eq!(petty.initial_balance, dec!(250.01));
    let period = &books.periods().await[0];
    assert_eq!(period.holder(petty.id).balance, dec!(250.01));
    assert_eq!(period.holder(cash).balance, dec!(250.01));
    assert_eq!(period.holder(cash).total_debit, Decimal::ZERO);
}

#[tokio::test]
async fn test_parent_must_match_code_prefix() {
    let books = books().await;
    let receivable = books.id("1122").await;

    let mut uow = books.uow();
    let mut new = NewAccount::new("10010001", "Petty Cash", AccountType::CurrentAsset);
    new.parent_id = Some(receivable);
    let err = AccountDirectory::create_account(&mut uow, books.ctx, new)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ParentCodeMismatch { ref parent_code, .. } if parent_code == "1122"));

    let err = AccountDirectory::create_account(
        &mut uow,
        books.ctx,
        NewAccount::new("99990001", "Orphan", AccountType::CurrentAsset),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LedgerError::ParentNotFound(ref code) if code == "9999"));
}

#[tokio::test]
async fn test_duplicates_rejected() {
    let books = books().await;
    let mut uow = books.uow();

    let err = AccountDirectory::create_account(
        &mut uow,
        books.ctx,
        NewAccount::new("1001", "Another Cash", AccountType::CurrentAsset),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateAccountCode(_)));

    let err = AccountDirectory::create_account(
        &mut uow,
        books.ctx,
        NewAccount::new("1009", "Cash on Hand", AccountType::CurrentAsset),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateAccountName { .. }));

    // Same name under a different type is fine.
    AccountDirectory::create_account(
        &mut uow,
        books.ctx,
        NewAccount::new("2009", "Cash on Hand", AccountType::CurrentLiability),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_delete_guards_and_parent_becomes_leaf_again() {
    let books = books().await;
    let cash = books.id("1001").await;

    let mut uow = books.uow();
    let petty = AccountDirectory::create_account(
        &mut uow,
        books.ctx,
        NewAccount::new("10010001", "Petty Cash", AccountType::CurrentAsset)
            .with_initial_balance(dec!(40.00)),
    )
    .await
    .unwrap();
    books.commit(uow).await;

    let mut uow = books.uow();
    let err = AccountDirectory::delete_account(&mut uow, books.ctx, cash)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountHasChildren(id) if id == cash));

    AccountDirectory::delete_account(&mut uow, books.ctx, petty.id)
        .await
        .unwrap();
    books.commit(uow).await;

    let cash_account = books.account("1001").await;
    assert!(cash_account.is_leaf);
    let period = &books.periods().await[0];
    assert_eq!(period.holder(cash).balance, Decimal::ZERO);
    assert!(!period.holders.contains_key(&petty.id));
}

#[tokio::test]
async fn test_account_with_transactions_cannot_be_deleted() {
    let books = books().await;
    books.post("1002", "3001", dec!(10.00), date(2024, 1, 2)).await;
    let bank = books.id("1002").await;

    let mut uow = books.uow();
    let err = AccountDirectory::delete_account(&mut uow, books.ctx, bank)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountHasTransactions(_)));
}

#[tokio::test]
async fn test_update_rules() {
    let books = books().await;
    books.post("1002", "3001", dec!(10.00), date(2024, 1, 2)).await;
    let bank = books.id("1002").await;
    let cash = books.id("1001").await;

    let mut uow = books.uow();
    let err = AccountDirectory::update_account(
        &mut uow,
        books.ctx,
        bank,
        AccountPatch {
            direction: Some(Direction::Credit),
            ..AccountPatch::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LedgerError::AccountHasTransactions(_)));

    let updated = AccountDirectory::update_account(
        &mut uow,
        books.ctx,
        cash,
        AccountPatch {
            name: Some("  Till  ".to_string()),
            state: Some(AccountState::Inactive),
            ..AccountPatch::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Till");
    assert!(!updated.is_active());

    AccountDirectory::create_account(
        &mut uow,
        books.ctx,
        NewAccount::new("10010001", "Drawer", AccountType::CurrentAsset),
    )
    .await
    .unwrap();
    let err = AccountDirectory::update_account(
        &mut uow,
        books.ctx,
        cash,
        AccountPatch {
            code: Some("1003".to_string()),
            ..AccountPatch::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LedgerError::CodeChangeWithChildren(_)));
}

#[tokio::test]
async fn test_reimporting_chart_reconciles_everything() {
    let books = books().await;
    let chart = standard_chart();

    let mut uow = books.uow();
    let report = AccountDirectory::import_accounts(&mut uow, books.ctx, chart.clone())
        .await
        .unwrap();

    assert!(report.created.is_empty());
    assert_eq!(report.reconciled.len(), chart.len());
    assert!(uow.changes().is_empty());
}

#[tokio::test]
async fn test_import_orders_by_level() {
    let books = books().await;
    let mut drafts = vec![
        super::AccountDraft {
            code: "11220001001".to_string(),
            name: "Acme Ltd invoices".to_string(),
            account_type: AccountType::CurrentAsset,
            direction: Direction::Debit,
            initial_balance: Decimal::ZERO,
        },
        super::AccountDraft {
            code: "11220001".to_string(),
            name: "Acme Ltd".to_string(),
            account_type: AccountType::CurrentAsset,
            direction: Direction::Debit,
            initial_balance: Decimal::ZERO,
        },
    ];
    drafts.extend(standard_chart().into_iter().take(2));

    let mut uow = books.uow();
    let report = AccountDirectory::import_accounts(&mut uow, books.ctx, drafts)
        .await
        .unwrap();

    let codes: Vec<_> = report.created.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, vec!["11220001", "11220001001"]);
    assert_eq!(report.reconciled.len(), 2);
    assert_eq!(report.created[1].level, 3);
}

#[tokio::test]
async fn test_ancestors_follow_parents_and_detect_cycles() {
    let books = books().await;
    let mut uow = books.uow();
    let child = AccountDirectory::create_account(
        &mut uow,
        books.ctx,
        NewAccount::new("10010001", "Drawer", AccountType::CurrentAsset),
    )
    .await
    .unwrap();

    let chain = AccountDirectory::ancestors_of(&uow, child.id).await.unwrap();
    let codes: Vec<_> = chain.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, vec!["10010001", "1001"]);

    let mut parent = chain[1].clone();
    parent.parent_id = Some(child.id);
    uow.put_account(parent);
    let err = AccountDirectory::ancestors_of(&uow, child.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::BrokenHierarchy(_)));

    let err = AccountDirectory::ancestors_of(&uow, AccountId::new()).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(_)));
}

#[tokio::test]
async fn test_foreign_tenant_cannot_load_account() {
    let books = books().await;
    let other = RequestContext::new(AccountSetId::new(), date(2024, 1, 31));

    let uow = books.uow();
    let err = AccountDirectory::load(&uow, other, books.id("1001").await)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::TenantMismatch { .. }));
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_sorted() {
    let books = books().await;
    let accounts = books.store.accounts(books.account_set.id).await.unwrap();

    let found = AccountDirectory::search(&accounts, "PAYABLE");
    let codes: Vec<_> = found.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, vec!["2202", "2211", "2221"]);

    let by_code = AccountDirectory::search(&accounts, "510");
    assert!(by_code.is_empty());
    assert_eq!(AccountDirectory::search(&accounts, "5001").len(), 1);
}

#[tokio::test]
async fn test_account_set_names_are_unique() {
    let books = books().await;
    let mut uow = books.uow();
    let err = AccountDirectory::open_account_set(&mut uow, " Demo ", date(2024, 1, 1), None, date(2024, 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateAccountSetName(_)));

    let err = AccountDirectory::open_account_set(&mut uow, "   ", date(2024, 1, 1), None, date(2024, 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::EmptyName));
}
