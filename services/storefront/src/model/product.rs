use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value as JsnVal;

// read-only copy of the product record kept in the external content service,
// missing fields in the remote record fall back to zero, empty string or false
#[derive(Debug, Clone, PartialEq)]
pub struct ProductModel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discounted_price: Decimal,
    pub in_stock: bool,
    pub quantity_in_stock: u32,
    pub main_image: String,
    pub media: Vec<String>,
    pub category_id: String,
    pub sku: String,
    pub ean: String,
}

// category ID to display name, built on demand and owned by the caller
#[derive(Debug, Default, Clone)]
pub struct CategoryLookupModel(HashMap<String, String>);

fn jsn_field<'a>(item: &'a JsnVal, names: &[&str]) -> Option<&'a JsnVal> {
    names
        .iter()
        .filter_map(|n| item.get(*n))
        .find(|v| !v.is_null())
}

fn jsn_string(item: &JsnVal, names: &[&str]) -> String {
    match jsn_field(item, names) {
        Some(JsnVal::String(s)) => s.clone(),
        Some(JsnVal::Number(n)) => n.to_string(),
        _others => String::new(),
    }
}

fn jsn_decimal(item: &JsnVal, names: &[&str]) -> Decimal {
    let parsed = match jsn_field(item, names) {
        Some(JsnVal::Number(n)) => Decimal::from_str(n.to_string().as_str()).ok(),
        Some(JsnVal::String(s)) => super::parse_money_text(s.as_str()),
        _others => None,
    };
    parsed.unwrap_or(Decimal::ZERO)
}

// media entries are either plain URLs or objects carrying `src` / `url`
fn jsn_media_src(v: &JsnVal) -> Option<String> {
    match v {
        JsnVal::String(s) if !s.is_empty() => Some(s.clone()),
        JsnVal::Object(_) => {
            let s = jsn_string(v, &["src", "url"]);
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        }
        _others => None,
    }
}

impl ProductModel {
    /// normalize one item of the product collection, return `None` if the
    /// item does not carry any identifier
    pub fn from_content_item(item: &JsnVal) -> Option<Self> {
        let id = jsn_string(item, &["_id", "id"]);
        if id.is_empty() {
            return None;
        }
        let media = match jsn_field(item, &["mediaItems", "media"]) {
            Some(JsnVal::Array(a)) => a.iter().filter_map(jsn_media_src).collect(),
            _others => Vec::new(),
        };
        let main_image = jsn_field(item, &["mainMedia", "image"])
            .and_then(jsn_media_src)
            .or_else(|| media.first().cloned())
            .unwrap_or_default();
        let in_stock = match jsn_field(item, &["inStock"]) {
            Some(JsnVal::Bool(b)) => *b,
            _others => false,
        };
        let quantity_in_stock = jsn_field(item, &["quantityInStock", "stock"])
            .and_then(JsnVal::as_u64)
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0);
        let price = jsn_decimal(item, &["price"]);
        let discounted_price = match jsn_decimal(item, &["discountedPrice", "salePrice"]) {
            d if d.is_zero() => price,
            d => d,
        };
        Some(Self {
            id,
            name: jsn_string(item, &["name", "title"]),
            description: jsn_string(item, &["description"]),
            price,
            discounted_price,
            in_stock,
            quantity_in_stock,
            main_image,
            media,
            category_id: jsn_string(item, &["category", "categoryId"]),
            sku: jsn_string(item, &["sku"]),
            ean: jsn_string(item, &["ean"]),
        })
    } // end of fn from_content_item
} // end of impl ProductModel

impl CategoryLookupModel {
    pub fn from_content_items(items: &[JsnVal]) -> Self {
        let iter = items.iter().filter_map(|item| {
            let id = jsn_string(item, &["_id", "id"]);
            let name = jsn_string(item, &["name", "title"]);
            if id.is_empty() {
                None
            } else {
                Some((id, name))
            }
        });
        Self(HashMap::from_iter(iter))
    }

    pub fn name_of(&self, category_id: &str) -> Option<&str> {
        self.0.get(category_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}
