use super::*;
use crate::db::memory::MemoryStore;

const SHOP_ID: i64 = 1;

const LAWN_SUIT: i64 = 101;
const KHUSSA: i64 = 102;

const LAWN_SUIT_STOCK: i64 = 11;
const KHUSSA_STOCK: i64 = 12;

/// Workflow over an in-memory store seeded with one shop and two
/// stocked products (50 lawn suits, 20 khussas).
fn create_test_workflow(restock_on_cancel: bool) -> (OrderWorkflow, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.seed_shop(SHOP_ID);
    store.seed_product(LAWN_SUIT, "Lawn Suit");
    store.seed_product(KHUSSA, "Khussa Shoes");
    store.seed_stock(LAWN_SUIT_STOCK, LAWN_SUIT, SHOP_ID, 50);
    store.seed_stock(KHUSSA_STOCK, KHUSSA, SHOP_ID, 20);
    let workflow = OrderWorkflow::new(store.clone(), store.clone(), restock_on_cancel);
    (workflow, store)
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn line(product_id: i64, name: &str, quantity: i32, price: &str) -> NewOrderItem {
    NewOrderItem {
        product_id,
        product_name: name.to_string(),
        quantity,
        price: dec(price),
    }
}

fn draft(method: PaymentMethod, items: Vec<NewOrderItem>) -> OrderDraft {
    OrderDraft {
        shop_id: SHOP_ID,
        customer_id: Some(7),
        full_name: "Ayesha Khan".to_string(),
        email: Some("ayesha@example.com".to_string()),
        phone: "03001234567".to_string(),
        address: "House 12, Street 4, DHA Phase 5".to_string(),
        city: "Lahore".to_string(),
        province: "Punjab".to_string(),
        postal_code: "54000".to_string(),
        method,
        items,
    }
}

/// Checkout a single-line lawn suit order and return its id.
async fn place_order(workflow: &OrderWorkflow, method: PaymentMethod, quantity: i32) -> i64 {
    workflow
        .create_order(draft(
            method,
            vec![line(LAWN_SUIT, "Lawn Suit", quantity, "2500.00")],
        ))
        .await
        .expect("checkout failed")
        .order_id
}

fn status_change(order_status: OrderStatus, payment_status: PaymentStatus) -> StatusChange {
    StatusChange {
        order_status,
        payment_status,
        transaction_id: None,
    }
}

fn assert_code(err: AppError, expected: ErrorCode) {
    assert_eq!(err.code, expected, "unexpected error: {}", err.message);
}
