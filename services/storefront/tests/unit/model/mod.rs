mod cart;

use std::str::FromStr;

use rust_decimal::Decimal;

use storefront::model::{parse_money_text, CartItemModel};

pub(crate) fn ut_decimal(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap()
}

pub(crate) fn ut_cart_item(id: &str, variant: Option<&str>, qty: u32, price: &str) -> CartItemModel {
    CartItemModel {
        id: id.to_string(),
        variant: variant.map(String::from),
        quantity: qty,
        price: ut_decimal(price),
        name: None,
        image: None,
        sku: None,
    }
}

#[test]
fn money_text_parse_ok() {
    let cases = [
        ("Kurier DPD - 19,99 zł", "19.99"),
        ("1 234,50 zł", "1234.50"),
        ("1,234.50 PLN", "1234.50"),
        ("49.99", "49.99"),
        ("7", "7"),
        ("cena: 12.000 zł", "12000"),
        ("od 5 do 30,5", "30.5"),
    ];
    for (raw, expect) in cases {
        let actual = parse_money_text(raw);
        assert_eq!(actual, Some(ut_decimal(expect)), "raw: {raw}");
    }
}

#[test]
fn money_text_parse_nothing() {
    for raw in ["", "darmowa dostawa", "zł", " , . "] {
        assert!(parse_money_text(raw).is_none(), "raw: {raw}");
    }
}
