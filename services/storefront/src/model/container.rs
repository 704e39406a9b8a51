use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value as JsnVal;

use super::parse_money_text;

// one raw row from the spreadsheet service, the key identifies the row
pub type SheetRowModel = (String, HashMap<String, String>);

pub(crate) mod sheet_column {
    pub const CONTAINER_ID: &str = "containerId";
    pub const ORDER_ID: &str = "orderId";
    pub const CUSTOMER: &str = "customer";
    pub const DEPARTURE_DATE: &str = "departureDate";
    pub const PRODUCT_NAME: &str = "productName";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_PRICE: &str = "unitPrice";
    pub const TOTAL: &str = "total";
    pub const CURRENCY: &str = "currency";
    pub const ORDER_DATE: &str = "orderDate";
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryStageModel {
    pub waypoint: &'static str,
    pub label: &'static str,
    // position hint on the route map, percent of width and height
    pub position: (u8, u8),
    pub progress: u8,
}

/// simulated tracker of one sea route, elapsed days since departure are
/// mapped to a fixed staircase of waypoints
#[derive(Debug, Clone)]
pub struct DeliveryRouteModel {
    // lower bound in days of each stage, in ascending order, the first
    // stage is the origin port
    stages: Vec<(u32, DeliveryStageModel)>,
    // the destination port is reached on exactly this day
    arrival_day: u32,
    destination: DeliveryStageModel,
    unknown: DeliveryStageModel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerLineModel {
    pub order_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerModel {
    pub id: String,
    pub order_ids: Vec<String>,
    pub customers: Vec<String>,
    pub departure: Option<NaiveDate>,
    pub lines: Vec<ContainerLineModel>,
    pub total_amount: Decimal,
    pub currency: String,
    pub delivery: DeliveryStageModel,
}

// the shopper whose containers are requested, either field may be absent
#[derive(Debug, Clone, Default)]
pub struct MemberIdentity {
    pub member_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberContainerModel {
    pub id: String,
    pub number: String,
    pub departure: Option<NaiveDate>,
    pub product_ids: Vec<String>,
    pub delivery: DeliveryStageModel,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // date-time values keep only the date part
    let raw = raw.split(|c| c == 'T' || c == ' ').next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

impl DeliveryRouteModel {
    /// sea freight from Shanghai to Gdansk, one waypoint per week, the
    /// destination port is reached on day 56
    pub fn shanghai_gdansk() -> Self {
        let stage = |waypoint, label, position, progress| DeliveryStageModel {
            waypoint,
            label,
            position,
            progress,
        };
        Self {
            stages: vec![
                (0, stage("shanghai", "Port of Shanghai", (84, 38), 0)),
                (7, stage("south-china-sea", "South China Sea", (78, 47), 12)),
                (14, stage("malacca-strait", "Strait of Malacca", (72, 56), 25)),
                (21, stage("indian-ocean", "Indian Ocean", (62, 60), 37)),
                (28, stage("suez-canal", "Suez Canal", (52, 44), 50)),
                (35, stage("mediterranean-sea", "Mediterranean Sea", (45, 40), 62)),
                (42, stage("gibraltar", "Strait of Gibraltar", (36, 38), 75)),
                (49, stage("north-sea", "North Sea", (41, 24), 87)),
            ],
            arrival_day: 56,
            destination: stage("gdansk", "Port of Gdansk", (47, 21), 100),
            unknown: stage("unknown", "Unknown status", (0, 0), 0),
        }
    }

    /// departure later than today counts as still in the origin port
    pub fn stage_at(&self, elapsed_days: i64) -> &DeliveryStageModel {
        let arrival = self.arrival_day as i64;
        if elapsed_days > arrival {
            &self.unknown
        } else if elapsed_days == arrival {
            &self.destination
        } else {
            let days = elapsed_days.max(0) as u32;
            self.stages
                .iter()
                .rev()
                .find(|(lower, _)| days >= *lower)
                .map(|(_, s)| s)
                .unwrap_or(&self.unknown)
        }
    }

    pub fn stage_since(&self, departure: Option<NaiveDate>, today: NaiveDate) -> &DeliveryStageModel {
        match departure {
            Some(d) => self.stage_at((today - d).num_days()),
            None => &self.unknown,
        }
    }
} // end of impl DeliveryRouteModel

impl Default for DeliveryRouteModel {
    fn default() -> Self {
        Self::shanghai_gdansk()
    }
}

struct CleanRow(HashMap<String, String>);

impl CleanRow {
    // field names are trimmed, field values lose leading whitespace
    fn new(raw: HashMap<String, String>) -> Self {
        let iter = raw
            .into_iter()
            .map(|(k, v)| (k.trim().to_string(), v.trim_start().to_string()));
        Self(HashMap::from_iter(iter))
    }
    fn get(&self, column: &str) -> &str {
        self.0.get(column).map(|v| v.trim_end()).unwrap_or("")
    }
    fn quantity(&self) -> u32 {
        let raw = self.get(sheet_column::QUANTITY);
        parse_money_text(raw)
            .and_then(|d| u32::try_from(d.trunc()).ok())
            .unwrap_or(0)
    }
}

/// group spreadsheet rows by container (or order when a row has no
/// container) and derive the delivery stage of each group, groups keep the
/// order in which they first appear in the rows
pub fn aggregate_sheet_rows(
    rows: Vec<SheetRowModel>,
    route: &DeliveryRouteModel,
    today: NaiveDate,
) -> Vec<ContainerModel> {
    use sheet_column as col;
    let mut out: Vec<ContainerModel> = Vec::new();
    for (_row_key, raw) in rows {
        let row = CleanRow::new(raw);
        let group_id = match (row.get(col::CONTAINER_ID), row.get(col::ORDER_ID)) {
            ("", "") => continue,
            ("", oid) => oid.to_string(),
            (cid, _) => cid.to_string(),
        };
        let quantity = row.quantity();
        let unit_price = parse_money_text(row.get(col::UNIT_PRICE)).unwrap_or(Decimal::ZERO);
        let total = parse_money_text(row.get(col::TOTAL))
            .unwrap_or_else(|| unit_price * Decimal::from(quantity));
        let line = ContainerLineModel {
            order_id: row.get(col::ORDER_ID).to_string(),
            product_name: row.get(col::PRODUCT_NAME).to_string(),
            quantity,
            unit_price,
            total,
        };
        let pos = match out.iter().position(|c| c.id == group_id) {
            Some(p) => p,
            None => {
                out.push(ContainerModel {
                    id: group_id,
                    order_ids: Vec::new(),
                    customers: Vec::new(),
                    departure: None,
                    lines: Vec::new(),
                    total_amount: Decimal::ZERO,
                    currency: String::new(),
                    delivery: route.unknown.clone(),
                });
                out.len() - 1
            }
        };
        let container = &mut out[pos];
        if !line.order_id.is_empty() && !container.order_ids.contains(&line.order_id) {
            container.order_ids.push(line.order_id.clone());
        }
        let customer = row.get(col::CUSTOMER);
        if !customer.is_empty() && !container.customers.iter().any(|c| c == customer) {
            container.customers.push(customer.to_string());
        }
        if container.departure.is_none() {
            container.departure = parse_date(row.get(col::DEPARTURE_DATE));
        }
        if container.currency.is_empty() {
            container.currency = row.get(col::CURRENCY).to_string();
        }
        container.total_amount += line.total;
        if !line.product_name.is_empty() || quantity > 0 {
            container.lines.push(line);
        }
    } // end of loop
    for c in out.iter_mut() {
        c.delivery = route.stage_since(c.departure, today).clone();
    }
    out
} // end of fn aggregate_sheet_rows

impl MemberIdentity {
    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").is_empty();
        blank(&self.member_id) && blank(&self.email)
    }

    fn owns(&self, item: &JsnVal) -> bool {
        let field = |name: &str| item.get(name).and_then(JsnVal::as_str).map(str::trim);
        fn expected(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        let id_match = match (expected(&self.member_id), field("memberId")) {
            (Some(expect), Some(actual)) => expect == actual,
            _others => false,
        };
        let mail_match = match (expected(&self.email), field("email")) {
            (Some(expect), Some(actual)) => expect.eq_ignore_ascii_case(actual),
            _others => false,
        };
        id_match || mail_match
    }
}

impl MemberContainerModel {
    /// keep the items of the container collection owned by the member
    pub fn filter_owned(
        items: &[JsnVal],
        member: &MemberIdentity,
        route: &DeliveryRouteModel,
        today: NaiveDate,
    ) -> Vec<Self> {
        items
            .iter()
            .filter(|item| member.owns(item))
            .filter_map(|item| Self::from_content_item(item, route, today))
            .collect()
    }

    fn from_content_item(item: &JsnVal, route: &DeliveryRouteModel, today: NaiveDate) -> Option<Self> {
        let text = |name: &str| item.get(name).and_then(JsnVal::as_str).unwrap_or("");
        let id = match text("_id") {
            "" => text("id"),
            v => v,
        };
        if id.is_empty() {
            return None;
        }
        let number = match text("containerNumber") {
            "" => text("title"),
            v => v,
        };
        // product references are either an array of IDs, or one string of
        // comma-separated IDs
        let product_ids = match item.get("products") {
            Some(JsnVal::Array(a)) => a
                .iter()
                .filter_map(|v| match v {
                    JsnVal::String(s) => Some(s.trim().to_string()),
                    JsnVal::Object(_) => v.get("_id").and_then(JsnVal::as_str).map(String::from),
                    _others => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(JsnVal::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            _others => Vec::new(),
        };
        let departure = parse_date(text("departureDate"));
        Some(Self {
            id: id.to_string(),
            number: number.to_string(),
            departure,
            product_ids,
            delivery: route.stage_since(departure, today).clone(),
        })
    } // end of fn from_content_item
} // end of impl MemberContainerModel
