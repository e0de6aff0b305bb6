//! Settlement protocol integration tests against the in-memory store.
//!
//! These exercise the full coordinator path: validation, idempotent replay,
//! feasibility pre-check, user resolution, order creation, and the atomic
//! inventory reserve.

use std::sync::Arc;

use rust_decimal::Decimal;

use stablefront_api::db::{MemoryStore, SettlementStore};
use stablefront_api::models::NewProduct;
use stablefront_api::services::{
    CartLine, SettlementError, SettlementQuery, SettlementRequest, SettlementService,
};
use stablefront_core::{OrderStatus, ProductId};

const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
const OTHER_WALLET: &str = "0x8ba1f109551bD432803012645Ac136ddd64DBA72";

fn tx_hash(n: u8) -> String {
    format!("0x{}", format!("{n:02x}").repeat(32))
}

fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

fn catalog_product(id: &str, price: &str, inventory: i32) -> NewProduct {
    NewProduct {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        price: dec(price),
        image: format!("/images/{id}.jpg"),
        description: "A product".to_owned(),
        category: "tees".to_owned(),
        tags: vec![],
        sizes: vec!["M".to_owned()],
        colors: vec!["black".to_owned()],
        in_stock: true,
        featured: false,
        inventory,
    }
}

fn request(lines: &[(&str, i32)], total: &str, wallet: &str, tx: &str) -> SettlementRequest {
    SettlementRequest {
        cart_items: lines
            .iter()
            .map(|(id, quantity)| CartLine {
                product_id: (*id).to_owned(),
                quantity: *quantity,
            })
            .collect(),
        total_amount: dec(total),
        user_wallet: wallet.to_owned(),
        tx_hash: tx.to_owned(),
    }
}

fn store_with(products: &[(&str, &str, i32)]) -> MemoryStore {
    MemoryStore::with_products(
        products
            .iter()
            .map(|(id, price, inventory)| catalog_product(id, price, *inventory)),
    )
}

#[tokio::test]
async fn clean_settlement_creates_order_and_reserves_inventory() {
    let store = store_with(&[("tee", "42.00", 10), ("hoodie", "89.00", 5)]);
    let service = SettlementService::new(&store);

    let settled = service
        .settle(request(
            &[("tee", 2), ("hoodie", 1)],
            "173.00",
            WALLET,
            &tx_hash(1),
        ))
        .await
        .expect("settlement succeeds");

    assert!(!settled.replayed);
    let order = settled.order;
    assert_eq!(order.user_wallet.as_str(), WALLET);
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.total_amount, dec("173.00"));
    assert_eq!(order.tx_hash.as_str(), tx_hash(1));
    assert_eq!(order.items.len(), 2);

    assert_eq!(store.inventory(&ProductId::new("tee")), Some(8));
    assert_eq!(store.inventory(&ProductId::new("hoodie")), Some(4));
    assert_eq!(store.user_count(), 1);
    assert_eq!(store.order_count(), 1);
}

#[tokio::test]
async fn replayed_tx_hash_returns_existing_order_without_decrementing() {
    let store = store_with(&[("tee", "42.00", 10)]);
    let service = SettlementService::new(&store);
    let req = request(&[("tee", 2)], "84.00", WALLET, &tx_hash(2));

    let first = service.settle(req.clone()).await.expect("first settlement");
    let second = service.settle(req).await.expect("replay succeeds");

    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(second.order.id, first.order.id);
    assert_eq!(store.inventory(&ProductId::new("tee")), Some(8));
    assert_eq!(store.order_count(), 1);
}

#[tokio::test]
async fn replay_succeeds_even_after_sellout() {
    let store = store_with(&[("tee", "42.00", 2)]);
    let service = SettlementService::new(&store);

    service
        .settle(request(&[("tee", 2)], "84.00", WALLET, &tx_hash(3)))
        .await
        .expect("first settlement");
    assert_eq!(store.inventory(&ProductId::new("tee")), Some(0));

    // The catalog is now sold out; the replay must still return the order.
    let replay = service
        .settle(request(&[("tee", 2)], "84.00", WALLET, &tx_hash(3)))
        .await
        .expect("replay succeeds despite zero inventory");

    assert!(replay.replayed);
    assert_eq!(store.inventory(&ProductId::new("tee")), Some(0));
}

#[tokio::test]
async fn insufficient_inventory_is_rejected_without_side_effects() {
    let store = store_with(&[("tee", "42.00", 1)]);
    let service = SettlementService::new(&store);

    let err = service
        .settle(request(&[("tee", 3)], "126.00", WALLET, &tx_hash(4)))
        .await
        .expect_err("over-requested quantity is rejected");

    assert!(matches!(
        err,
        SettlementError::InsufficientInventory {
            available: 1,
            requested: 3,
            ..
        }
    ));
    assert!(err.is_validation());
    assert_eq!(store.inventory(&ProductId::new("tee")), Some(1));
    assert_eq!(store.user_count(), 0);
    assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn unknown_product_is_rejected_without_side_effects() {
    let store = store_with(&[("tee", "42.00", 10)]);
    let service = SettlementService::new(&store);

    let err = service
        .settle(request(&[("ghost", 1)], "42.00", WALLET, &tx_hash(5)))
        .await
        .expect_err("unknown SKU is rejected");

    assert!(matches!(err, SettlementError::UnknownProduct(id) if id == "ghost"));
    assert_eq!(store.user_count(), 0);
    assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn declared_total_must_match_catalog_prices() {
    let store = store_with(&[("tee", "42.00", 10)]);
    let service = SettlementService::new(&store);

    let err = service
        .settle(request(&[("tee", 2)], "50.00", WALLET, &tx_hash(6)))
        .await
        .expect_err("mismatched total is rejected");

    assert!(matches!(
        err,
        SettlementError::TotalMismatch { declared, computed }
            if declared == dec("50.00") && computed == dec("84.00")
    ));
    assert_eq!(store.inventory(&ProductId::new("tee")), Some(10));
    assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn multi_line_feasibility_failure_leaves_all_inventory_untouched() {
    let store = store_with(&[("tee", "42.00", 10), ("hoodie", "89.00", 0)]);
    let service = SettlementService::new(&store);

    let err = service
        .settle(request(
            &[("tee", 1), ("hoodie", 1)],
            "131.00",
            WALLET,
            &tx_hash(7),
        ))
        .await
        .expect_err("sold-out line fails the whole cart");

    assert!(matches!(err, SettlementError::InsufficientInventory { .. }));
    assert_eq!(store.inventory(&ProductId::new("tee")), Some(10));
    assert_eq!(store.inventory(&ProductId::new("hoodie")), Some(0));
    assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn reserve_failure_after_order_creation_retains_the_order() {
    // Two lines for the same SKU both pass the advisory pre-check against
    // inventory 1, so the second atomic reserve must fail after the order
    // shell and its transaction hash are already durable.
    let store = store_with(&[("tee", "42.00", 1)]);
    let service = SettlementService::new(&store);

    let err = service
        .settle(request(&[("tee", 1), ("tee", 1)], "84.00", WALLET, &tx_hash(8)))
        .await
        .expect_err("second reserve of the last unit fails");

    let SettlementError::InventoryRace {
        order_id,
        tx_hash: recorded_tx,
        product_id,
    } = err
    else {
        panic!("expected InventoryRace, got something else");
    };

    assert_eq!(recorded_tx.as_str(), tx_hash(8));
    assert_eq!(product_id, ProductId::new("tee"));

    // The order was not rolled back and the payment record survives.
    assert_eq!(store.order_count(), 1);
    let retained = store.order_view(order_id).await.expect("order retained");
    assert_eq!(retained.tx_hash.as_str(), tx_hash(8));
    assert_eq!(store.inventory(&ProductId::new("tee")), Some(0));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_settlements_never_oversell_the_last_unit() {
    let store = Arc::new(store_with(&[("tee", "42.00", 1)]));

    let mut handles = Vec::new();
    for n in 0..4u8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let service = SettlementService::new(store.as_ref());
            service
                .settle(request(&[("tee", 1)], "42.00", WALLET, &tx_hash(10 + n)))
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(settled) => {
                assert!(!settled.replayed);
                successes += 1;
            }
            Err(
                SettlementError::InsufficientInventory { .. }
                | SettlementError::InventoryRace { .. },
            ) => {}
            Err(other) => panic!("unexpected settlement error: {other}"),
        }
    }

    assert_eq!(successes, 1, "exactly one settlement wins the last unit");
    assert_eq!(store.inventory(&ProductId::new("tee")), Some(0));
    // Concurrent first-time settlements for one wallet share a user row.
    assert_eq!(store.user_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_duplicate_tx_hashes_settle_exactly_once() {
    let store = Arc::new(store_with(&[("tee", "42.00", 10)]));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let service = SettlementService::new(store.as_ref());
            service
                .settle(request(&[("tee", 2)], "84.00", WALLET, &tx_hash(20)))
                .await
        }));
    }

    let mut first_time = 0;
    for handle in handles {
        let settled = handle
            .await
            .expect("task completes")
            .expect("every duplicate resolves to the same order");
        if !settled.replayed {
            first_time += 1;
        }
    }

    assert_eq!(first_time, 1, "exactly one settlement is the original");
    assert_eq!(store.order_count(), 1);
    assert_eq!(store.inventory(&ProductId::new("tee")), Some(8));
}

#[tokio::test]
async fn captured_prices_survive_catalog_price_changes() {
    let store = store_with(&[("tee", "42.00", 10)]);
    let service = SettlementService::new(&store);

    service
        .settle(request(&[("tee", 2)], "84.00", WALLET, &tx_hash(30)))
        .await
        .expect("settlement succeeds");

    assert!(store.set_price(&ProductId::new("tee"), dec("60.00")));

    let query = SettlementQuery::new(&store);
    let orders = query.history(WALLET).await.expect("history succeeds");
    assert_eq!(orders.len(), 1);

    let order = &orders[0];
    assert_eq!(order.total_amount, dec("84.00"));
    assert_eq!(order.items[0].price_at_time, dec("42.00"));
    // The embedded snapshot tracks the live catalog.
    assert_eq!(order.items[0].product.price, dec("60.00"));
}

#[tokio::test]
async fn history_is_newest_first_and_scoped_to_the_wallet() {
    let store = store_with(&[("tee", "42.00", 10)]);
    let service = SettlementService::new(&store);

    service
        .settle(request(&[("tee", 1)], "42.00", WALLET, &tx_hash(40)))
        .await
        .expect("first order");
    service
        .settle(request(&[("tee", 1)], "42.00", OTHER_WALLET, &tx_hash(41)))
        .await
        .expect("other wallet's order");
    service
        .settle(request(&[("tee", 2)], "84.00", WALLET, &tx_hash(42)))
        .await
        .expect("second order");

    let query = SettlementQuery::new(&store);
    let orders = query.history(WALLET).await.expect("history succeeds");

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].tx_hash.as_str(), tx_hash(42));
    assert_eq!(orders[1].tx_hash.as_str(), tx_hash(40));
    for order in &orders {
        assert_eq!(order.user_wallet.as_str(), WALLET);
    }
}

#[tokio::test]
async fn repeat_customer_reuses_the_user_row() {
    let store = store_with(&[("tee", "42.00", 10)]);
    let service = SettlementService::new(&store);

    service
        .settle(request(&[("tee", 1)], "42.00", WALLET, &tx_hash(50)))
        .await
        .expect("first order");
    service
        .settle(request(&[("tee", 1)], "42.00", WALLET, &tx_hash(51)))
        .await
        .expect("second order");

    assert_eq!(store.user_count(), 1);
    assert_eq!(store.order_count(), 2);
}

#[tokio::test]
async fn history_rejects_malformed_wallet() {
    let store = MemoryStore::new();
    let query = SettlementQuery::new(&store);

    let err = query
        .history("not-a-wallet")
        .await
        .expect_err("malformed wallet is rejected");
    assert!(matches!(err, SettlementError::InvalidWallet(_)));
}

#[tokio::test]
async fn fulfillment_status_updates_are_visible_in_history() {
    let store = store_with(&[("tee", "42.00", 10)]);
    let service = SettlementService::new(&store);

    let settled = service
        .settle(request(&[("tee", 1)], "42.00", WALLET, &tx_hash(60)))
        .await
        .expect("settlement succeeds");

    store
        .update_order_status(settled.order.id, OrderStatus::Shipped)
        .await
        .expect("status update succeeds");

    let query = SettlementQuery::new(&store);
    let orders = query.history(WALLET).await.expect("history succeeds");
    assert_eq!(orders[0].status, OrderStatus::Shipped);
}
