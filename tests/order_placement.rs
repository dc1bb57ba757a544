//! End-to-end tests of the order placement workflow against the memory
//! store: pricing invariants, ledger mirroring, rollback atomicity, and
//! the concurrent last-unit race.

use std::collections::HashSet;
use std::sync::Arc;

use assert_matches::assert_matches;
use babycart_orders::catalog::CategoryRegistry;
use babycart_orders::checkout::{OrderPlacementService, generate_order_number};
use babycart_orders::error::OrderError;
use babycart_orders::model::{
    Category, CheckoutRequest, CustomerInfo, DeliveryAddress, LedgerKey, LineItemRequest,
    OrderStatus, Product, ProductId,
};
use babycart_orders::store::MemoryStore;

fn service(store: &Arc<MemoryStore>) -> OrderPlacementService {
    OrderPlacementService::new(
        Arc::clone(store),
        Arc::new(CategoryRegistry::with_memory_backends()),
    )
}

fn product(
    id: &str,
    code: Option<&str>,
    name: &str,
    price: u64,
    stock: u32,
    weight: Option<u32>,
) -> Product {
    Product {
        id: ProductId::from(id),
        product_code: code.map(str::to_string),
        name: name.into(),
        selling_price: price,
        in_stock: stock,
        weight_grams: weight,
    }
}

fn line(id: &str, category: &str, quantity: i64) -> LineItemRequest {
    LineItemRequest {
        id: Some(id.into()),
        category: Some(category.into()),
        quantity: Some(quantity),
    }
}

fn request(state: &str, items: Vec<LineItemRequest>) -> CheckoutRequest {
    CheckoutRequest {
        user_email: Some("parent@example.com".into()),
        customer_info: Some(CustomerInfo {
            full_name: "A. Parent".into(),
            mobile: "9876543210".into(),
        }),
        delivery_address: Some(DeliveryAddress {
            line1: "12 Ring Road".into(),
            city: "Surat".into(),
            state: state.into(),
            pincode: "395003".into(),
        }),
        selected_items: Some(items),
    }
}

#[tokio::test]
async fn successful_order_decrements_stock_and_mirrors_the_ledger() {
    let store = Arc::new(MemoryStore::new());
    store.insert_product(
        Category::Toy,
        product("toy-100", Some("TOY-0100"), "Wooden Train", 599, 10, Some(400)),
    );
    // Legacy product: no code, no recorded weight.
    store.insert_product(
        Category::Clothes,
        product("64fa3b9cde0012", None, "Onesie", 399, 5, None),
    );

    let placed = service(&store)
        .place_order(request(
            "Maharashtra",
            vec![line("toy-100", "toy", 2), line("64fa3b9cde0012", "clothes", 3)],
        ))
        .await
        .unwrap();

    // subtotal = 599*2 + 399*3; weight = 400*2 + 100*3 = 1100 g -> 2 kg at 90.
    let subtotal = 599 * 2 + 399 * 3;
    let delivery_charge = 2 * 90;
    assert_eq!(placed.total_amount, subtotal + delivery_charge);

    let order = store.order(&placed.order_number).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal, subtotal);
    assert_eq!(order.delivery_charge, delivery_charge);
    assert_eq!(order.total_amount, order.subtotal + order.delivery_charge);
    assert_eq!(
        order.subtotal,
        order
            .items
            .iter()
            .map(|item| item.price_at_order * u64::from(item.quantity))
            .sum::<u64>()
    );

    // Snapshots captured at order time.
    assert_eq!(order.items[0].product_code, "TOY-0100");
    assert_eq!(order.items[1].product_code, "CLOTHES-de0012");
    assert_eq!(order.items[1].weight_grams, 100);

    // Stock decremented, ledger in lockstep.
    let toy = store
        .product(Category::Toy, &ProductId::from("toy-100"))
        .unwrap();
    assert_eq!(toy.in_stock, 8);
    let clothes = store
        .product(Category::Clothes, &ProductId::from("64fa3b9cde0012"))
        .unwrap();
    assert_eq!(clothes.in_stock, 2);

    let toy_entry = store
        .ledger_entry(&LedgerKey {
            product_id: ProductId::from("toy-100"),
            category: Category::Toy,
        })
        .unwrap();
    assert_eq!(toy_entry.current_stock, 8);
    assert_eq!(toy_entry.source, "online");
    assert_eq!(toy_entry.product_code, "TOY-0100");

    let clothes_entry = store
        .ledger_entry(&LedgerKey {
            product_id: ProductId::from("64fa3b9cde0012"),
            category: Category::Clothes,
        })
        .unwrap();
    assert_eq!(clothes_entry.current_stock, 2);
    assert_eq!(clothes_entry.product_code, "CLOTHES-de0012");
}

#[tokio::test]
async fn gujarat_gets_the_local_rate_case_insensitively() {
    for state in ["Gujarat", "GUJARAT", "gujarat"] {
        let store = Arc::new(MemoryStore::new());
        store.insert_product(
            Category::Newborn,
            product("nb-1", Some("NEWBORN-0001"), "Crib Set", 1000, 3, Some(2500)),
        );

        let placed = service(&store)
            .place_order(request(state, vec![line("nb-1", "newborn", 1)]))
            .await
            .unwrap();

        // 2500 g -> 3 kg at the local rate of 30.
        assert_eq!(placed.total_amount, 1000 + 90);
    }
}

#[tokio::test]
async fn out_of_state_delivery_uses_the_standard_rate() {
    let store = Arc::new(MemoryStore::new());
    store.insert_product(
        Category::Newborn,
        product("nb-1", Some("NEWBORN-0001"), "Crib Set", 1000, 3, Some(2500)),
    );

    let placed = service(&store)
        .place_order(request("Maharashtra", vec![line("nb-1", "newborn", 1)]))
        .await
        .unwrap();

    assert_eq!(placed.total_amount, 1000 + 3 * 90);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_the_whole_order() {
    let store = Arc::new(MemoryStore::new());
    store.insert_product(
        Category::Toy,
        product("toy-1", Some("TOY-0001"), "Rattle", 199, 10, Some(150)),
    );
    store.insert_product(
        Category::Bath,
        product("bath-1", Some("BATH-0001"), "Bath Duck", 149, 2, Some(80)),
    );

    let err = service(&store)
        .place_order(request(
            "Gujarat",
            vec![line("toy-1", "toy", 4), line("bath-1", "bath", 5)],
        ))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        OrderError::InsufficientStock {
            name: "Bath Duck".into(),
            available: 2,
            requested: 5,
        }
    );

    // The first line's reservation is rolled back too.
    assert_eq!(
        store
            .product(Category::Toy, &ProductId::from("toy-1"))
            .unwrap()
            .in_stock,
        10
    );
    assert_eq!(
        store
            .product(Category::Bath, &ProductId::from("bath-1"))
            .unwrap()
            .in_stock,
        2
    );
    assert!(
        store
            .ledger_entry(&LedgerKey {
                product_id: ProductId::from("toy-1"),
                category: Category::Toy,
            })
            .is_none()
    );
    assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn repeated_lines_for_one_product_share_its_stock() {
    let store = Arc::new(MemoryStore::new());
    store.insert_product(
        Category::Toy,
        product("toy-1", Some("TOY-0001"), "Rattle", 199, 3, Some(150)),
    );

    let err = service(&store)
        .place_order(request(
            "Gujarat",
            vec![line("toy-1", "toy", 2), line("toy-1", "toy", 2)],
        ))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        OrderError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        }
    );
    assert_eq!(
        store
            .product(Category::Toy, &ProductId::from("toy-1"))
            .unwrap()
            .in_stock,
        3
    );
}

#[tokio::test]
async fn empty_item_list_is_rejected_before_any_transaction() {
    let store = Arc::new(MemoryStore::new());
    let err = service(&store)
        .place_order(request("Gujarat", Vec::new()))
        .await
        .unwrap_err();
    assert_eq!(err, OrderError::NoItemsSelected);
    assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    let mut req = request("Gujarat", vec![line("toy-1", "toy", 1)]);
    req.customer_info = None;
    let err = service(&store).place_order(req).await.unwrap_err();
    assert_eq!(err, OrderError::MissingFields);
}

#[tokio::test]
async fn unknown_category_tag_fails_validation() {
    let store = Arc::new(MemoryStore::new());
    let err = service(&store)
        .place_order(request("Gujarat", vec![line("p1", "furniture", 1)]))
        .await
        .unwrap_err();
    assert_matches!(err, OrderError::InvalidItem { reason } if reason.contains("furniture"));
}

#[tokio::test]
async fn unresolvable_product_fails_the_order() {
    let store = Arc::new(MemoryStore::new());
    let err = service(&store)
        .place_order(request("Gujarat", vec![line("ghost", "toy", 1)]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        OrderError::ProductNotFound {
            id: "ghost".into()
        }
    );
    assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn orders_are_rejected_while_the_store_is_down() {
    let store = Arc::new(MemoryStore::new());
    store.insert_product(
        Category::Toy,
        product("toy-1", Some("TOY-0001"), "Rattle", 199, 10, Some(150)),
    );
    store.set_ready(false);

    let err = service(&store)
        .place_order(request("Gujarat", vec![line("toy-1", "toy", 1)]))
        .await
        .unwrap_err();
    assert_eq!(err, OrderError::DatabaseUnavailable);

    store.set_ready(true);
    service(&store)
        .place_order(request("Gujarat", vec![line("toy-1", "toy", 1)]))
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_for_the_last_unit_commit_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    store.insert_product(
        Category::Toy,
        product("toy-1", Some("TOY-0001"), "Rattle", 199, 1, Some(150)),
    );
    let placement = Arc::new(service(&store));

    let first = {
        let placement = Arc::clone(&placement);
        tokio::spawn(
            async move { placement.place_order(request("Gujarat", vec![line("toy-1", "toy", 1)])).await },
        )
    };
    let second = {
        let placement = Arc::clone(&placement);
        tokio::spawn(
            async move { placement.place_order(request("Gujarat", vec![line("toy-1", "toy", 1)])).await },
        )
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let committed = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(committed, 1, "exactly one of the two orders must commit");

    let loser = outcomes
        .iter()
        .find_map(|outcome| outcome.clone().err())
        .unwrap();
    assert_matches!(
        loser,
        OrderError::InsufficientStock {
            available: 0,
            requested: 1,
            ..
        }
    );

    assert_eq!(
        store
            .product(Category::Toy, &ProductId::from("toy-1"))
            .unwrap()
            .in_stock,
        0
    );
    assert_eq!(store.order_count(), 1);
}

#[tokio::test]
async fn ledger_entries_update_in_place_on_later_orders() {
    let store = Arc::new(MemoryStore::new());
    store.insert_product(
        Category::Bath,
        product("bath-1", None, "Bath Duck", 149, 9, Some(80)),
    );
    let placement = service(&store);
    let key = LedgerKey {
        product_id: ProductId::from("bath-1"),
        category: Category::Bath,
    };

    placement
        .place_order(request("Gujarat", vec![line("bath-1", "bath", 2)]))
        .await
        .unwrap();
    let first = store.ledger_entry(&key).unwrap();
    assert_eq!(first.current_stock, 7);
    assert_eq!(first.product_code, "BATH-bath-1");

    placement
        .place_order(request("Gujarat", vec![line("bath-1", "bath", 3)]))
        .await
        .unwrap();
    let second = store.ledger_entry(&key).unwrap();
    assert_eq!(second.current_stock, 4);
    // Set-on-insert fields survive the update.
    assert_eq!(second.product_code, first.product_code);
    assert_eq!(second.product_name, first.product_name);
    assert!(second.last_updated >= first.last_updated);
}

#[test]
fn order_numbers_are_distinct_across_ten_thousand_draws() {
    let numbers: HashSet<String> = (0..10_000).map(|_| generate_order_number()).collect();
    assert_eq!(numbers.len(), 10_000);
}
