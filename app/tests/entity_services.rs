//! Behaviour tests for the entity access services over the in-memory store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use my_money::domain::{
    BudgetItemDraft, BudgetItemPatch, BudgetItemType, BudgetService, CategoryDraft,
    CategorySeeding, CategoryService, DateRange, DocumentId, ErrorCode, FieldValue, PaymentMethod,
    TransactionDraft, TransactionPatch, TransactionService, TransactionType, UserId,
};
use my_money::outbound::InMemoryDocumentStore;
use my_money::test_support::{MutableClock, fixture_clock, fixture_timestamp};
use rstest::{fixture, rstest};

struct Services {
    store: Arc<InMemoryDocumentStore>,
    clock: Arc<MutableClock>,
    budgets: BudgetService<InMemoryDocumentStore>,
    categories: CategoryService<InMemoryDocumentStore>,
    transactions: TransactionService<InMemoryDocumentStore>,
}

#[fixture]
fn services() -> Services {
    let store = Arc::new(InMemoryDocumentStore::default());
    let clock = fixture_clock();
    Services {
        budgets: BudgetService::new(Arc::clone(&store), clock.clone()),
        categories: CategoryService::new(Arc::clone(&store), clock.clone()),
        transactions: TransactionService::new(Arc::clone(&store), clock.clone()),
        store,
        clock,
    }
}

fn user(raw: &str) -> UserId {
    UserId::new(raw).expect("valid id")
}

fn budget_draft(name: &str) -> BudgetItemDraft {
    BudgetItemDraft {
        name: name.to_owned(),
        item_type: BudgetItemType::Expense,
        amount: 80.0,
        is_recurrent: true,
        due_day: Some(15),
        due_date: None,
        owner: "Ada".to_owned(),
        payment_method: PaymentMethod::DebitCard,
        category: Some("cat-1".to_owned()),
    }
}

fn transaction_draft(description: &str, at: DateTime<Utc>) -> TransactionDraft {
    TransactionDraft {
        description: description.to_owned(),
        amount: 12.5,
        transaction_date: at,
        transaction_type: TransactionType::Expense,
        category_id: None,
        budget_item_id: None,
        owner: "Ada".to_owned(),
        registration_date: at,
    }
}

#[rstest]
#[tokio::test]
async fn listings_never_leak_other_users_entities(services: Services) {
    let alice = user("alice");
    let bob = user("bob");
    let at = fixture_timestamp();

    services.budgets.add(budget_draft("Gym"), &alice).await.expect("add");
    services.budgets.add(budget_draft("Rent"), &bob).await.expect("add");
    services
        .categories
        .add(CategoryDraft::new("Pets", "#123456", "🐕"), &bob)
        .await
        .expect("add");
    services
        .transactions
        .add(transaction_draft("Lunch", at), &bob)
        .await
        .expect("add");

    let budgets = services.budgets.get_all(&alice).await.expect("list");
    assert_eq!(budgets.len(), 1);
    assert!(budgets.iter().all(|item| item.user_id == alice));
    assert!(services.categories.get_all(&alice).await.expect("list").is_empty());
    assert!(services.transactions.get_all(&alice).await.expect("list").is_empty());
}

#[rstest]
#[tokio::test]
async fn update_changes_only_the_named_field_and_stamp(services: Services) {
    let owner = user("alice");
    let id = services.budgets.add(budget_draft("Gym"), &owner).await.expect("add");
    let before = services
        .store
        .document("budgetItems", &id)
        .expect("stored")
        .fields()
        .clone();

    services.clock.advance(Duration::minutes(5));
    let patch = BudgetItemPatch {
        amount: Some(95.0),
        ..BudgetItemPatch::default()
    };
    services.budgets.update(&id, patch).await.expect("update");

    let mut after = services
        .store
        .document("budgetItems", &id)
        .expect("stored")
        .fields()
        .clone();
    let stamp = after.remove("updatedAt").expect("updatedAt stamped");
    assert_eq!(
        stamp,
        FieldValue::Timestamp(fixture_timestamp() + Duration::minutes(5))
    );
    let amount = after.remove("amount").expect("amount kept");
    assert_eq!(amount, FieldValue::Double(95.0));

    let mut expected = before;
    expected.remove("amount");
    assert_eq!(after, expected);
}

#[rstest]
#[tokio::test]
async fn updating_a_missing_entity_is_not_found(services: Services) {
    let missing = DocumentId::new("missing").expect("valid id");
    let err = services
        .budgets
        .update(&missing, BudgetItemPatch::default())
        .await
        .expect_err("missing entity");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn seeding_twice_yields_ten_categories(services: Services) {
    let owner = user("fresh");

    let first = services
        .categories
        .initialize_default_categories(&owner)
        .await
        .expect("first seeding");
    let second = services
        .categories
        .initialize_default_categories(&owner)
        .await
        .expect("second seeding");

    assert_eq!(first, CategorySeeding::Seeded { created: 10 });
    assert_eq!(second, CategorySeeding::AlreadyPresent { existing: 10 });
    assert_eq!(services.categories.get_all(&owner).await.expect("list").len(), 10);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_seeding_still_yields_ten_categories(services: Services) {
    let owner = user("racer");
    let attempts = (0..4).map(|_| {
        let categories = services.categories.clone();
        let owner = owner.clone();
        tokio::spawn(async move { categories.initialize_default_categories(&owner).await })
    });
    for handle in attempts.collect::<Vec<_>>() {
        handle.await.expect("task joins").expect("seeding succeeds");
    }

    assert_eq!(services.store.len("categories"), 10);
}

#[rstest]
#[tokio::test]
async fn added_category_is_listed_alphabetically(services: Services) {
    let owner = user("alice");
    for name in ["Travel", "Food & Dining", "Bills & Utilities"] {
        services
            .categories
            .add(CategoryDraft::new(name, "#FF6B6B", "🍽️"), &owner)
            .await
            .expect("add");
    }

    let categories = services.categories.get_all(&owner).await.expect("list");
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Bills & Utilities", "Food & Dining", "Travel"]);
    assert_eq!(
        names.iter().filter(|name| **name == "Food & Dining").count(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn blank_category_names_are_rejected(services: Services) {
    let err = services
        .categories
        .add(CategoryDraft::new("  ", "#000000", "?"), &user("alice"))
        .await
        .expect_err("blank name");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(services.store.is_empty("categories"));
}

#[rstest]
#[tokio::test]
async fn transactions_list_newest_first_within_range(services: Services) {
    let owner = user("alice");
    let t1 = fixture_timestamp();
    let t2 = t1 + Duration::days(1);
    let t3 = t1 + Duration::days(2);
    for (description, at) in [("second", t2), ("first", t1), ("third", t3)] {
        services
            .transactions
            .add(transaction_draft(description, at), &owner)
            .await
            .expect("add");
    }

    let all = services.transactions.get_all(&owner).await.expect("list");
    let dates: Vec<DateTime<Utc>> = all.iter().map(|t| t.transaction_date).collect();
    assert_eq!(dates, [t3, t2, t1]);

    let bounded = services
        .transactions
        .get_all_in_range(&owner, DateRange::between(t1, t2))
        .await
        .expect("list");
    let descriptions: Vec<&str> = bounded.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(descriptions, ["second", "first"]);

    let open_start = services
        .transactions
        .get_all_in_range(&owner, DateRange::ending_at(t1))
        .await
        .expect("list");
    assert_eq!(open_start.len(), 1);
}

#[rstest]
#[tokio::test]
async fn deleting_a_category_leaves_referencing_transactions(services: Services) {
    let owner = user("alice");
    let category = services
        .categories
        .add(CategoryDraft::new("Pets", "#123456", "🐕"), &owner)
        .await
        .expect("add");
    let mut draft = transaction_draft("Vet", fixture_timestamp());
    draft.category_id = Some(category.to_string());
    services.transactions.add(draft, &owner).await.expect("add");

    services.categories.delete(&category).await.expect("delete");

    let transactions = services.transactions.get_all(&owner).await.expect("list");
    assert_eq!(
        transactions[0].category_id.as_deref(),
        Some(category.as_ref())
    );
}

#[rstest]
#[tokio::test]
async fn dangling_category_can_be_cleared_from_a_transaction(services: Services) {
    let owner = user("alice");
    let category = services
        .categories
        .add(CategoryDraft::new("Pets", "#123456", "🐕"), &owner)
        .await
        .expect("add");
    let mut draft = transaction_draft("Vet", fixture_timestamp());
    draft.category_id = Some(category.to_string());
    let transaction = services.transactions.add(draft, &owner).await.expect("add");
    services.categories.delete(&category).await.expect("delete");

    let patch = TransactionPatch {
        category_id: Some(None),
        ..TransactionPatch::default()
    };
    services
        .transactions
        .update(&transaction, patch)
        .await
        .expect("update");

    let transactions = services.transactions.get_all(&owner).await.expect("list");
    assert_eq!(transactions[0].category_id, None);
    assert_eq!(transactions[0].description, "Vet");
}
