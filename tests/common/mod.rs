use chrono::NaiveDate;
use rust_decimal::dec;
use wallet_ledger::{
    domain::{
        Actor, BulkPurchaseId, NewBulkPurchase, Paise, ProductId, SourceType, UserId, Wallet,
    },
    ledger::{Ledger, WalletCommand},
};

pub fn run(commands: Vec<WalletCommand>) -> Ledger {
    let mut ledger = Ledger::new();
    ledger.process_commands(commands.into_iter(), admin());
    ledger
}

pub fn admin() -> Actor {
    Actor::Admin(UserId::from(900))
}

#[allow(dead_code)]
pub fn paise(value: i64) -> Paise {
    Paise::new(value)
}

#[allow(dead_code)]
pub fn wallet(user: u64, balance: i64, locked: i64) -> Wallet {
    Wallet::from_parts(user.into(), Paise::new(balance), Paise::new(locked)).unwrap()
}

/// A ledger where `user` has deposited `amount`.
#[allow(dead_code)]
pub fn funded(user: u64, amount: i64) -> Ledger {
    let mut ledger = Ledger::new();
    ledger
        .deposit(user.into(), Paise::new(amount), None, Actor::User(user.into()))
        .unwrap();
    ledger
}

#[allow(dead_code)]
pub fn new_purchase(product: ProductId, total: i64, cost: i64, date: &str) -> NewBulkPurchase {
    NewBulkPurchase {
        product_id: product,
        admin_id: Some(UserId::from(900)),
        face_value_purchased: Paise::new(total),
        actual_cost_paid: Paise::new(cost),
        discount_percentage: dec!(20),
        extra_allocation_percentage: dec!(0),
        total_value_received: Paise::new(total),
        seller_name: "Acme Holdings".to_owned(),
        source_type: SourceType::ManualEntry,
        purchase_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        notes: None,
    }
}

/// An approved product backed by a single purchase of `total` value.
#[allow(dead_code)]
pub fn stocked_product(ledger: &mut Ledger, total: i64) -> (ProductId, BulkPurchaseId) {
    let product = ledger.create_product("Pre-IPO Series A", admin());
    ledger.approve_product(product, admin()).unwrap();
    let purchase = ledger
        .create_bulk_purchase(new_purchase(product, total, total * 8 / 10, "2024-01-15"), admin())
        .unwrap();
    (product, purchase)
}
