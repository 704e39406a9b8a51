use chrono::NaiveDate;

use storefront::model::{DeliveryRouteModel, MemberIdentity};
use storefront::usecase::{ContainerListUseCase, MemberContainersUseCase};
use storefront::AppSharedState;

use crate::model::ut_decimal;
use crate::ut_default_share_state;

fn ut_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

fn ut_member_uc(shr_state: &AppSharedState) -> MemberContainersUseCase {
    let cfg = shr_state.config();
    MemberContainersUseCase {
        content: shr_state.content_api(),
        container_collection: cfg.api_server.content.containers.clone(),
        product_collection: cfg.api_server.content.products.clone(),
        route: DeliveryRouteModel::default(),
        logctx: shr_state.log_context(),
    }
}

#[tokio::test]
async fn list_containers_from_sheet() {
    let shr_state = ut_default_share_state();
    let uc = ContainerListUseCase {
        spreadsheet: shr_state.spreadsheet(),
        route: DeliveryRouteModel::default(),
        logctx: shr_state.log_context(),
    };
    let result = uc.execute(ut_today()).await.unwrap();
    assert_eq!(result.len(), 2);
    let c0 = &result[0];
    assert_eq!(c0.id.as_str(), "KONT-001");
    assert_eq!(c0.order_ids.len(), 2);
    assert_eq!(c0.total_amount, ut_decimal("1500.50"));
    assert_eq!(c0.delivery.waypoint, "south-china-sea");
    let c1 = &result[1];
    assert_eq!(c1.id.as_str(), "ZAM-3");
    assert_eq!(c1.customers, vec!["Ewa Zielińska".to_string()]);
    // departure later than today
    assert_eq!(c1.delivery.waypoint, "shanghai");
}

#[tokio::test]
async fn member_containers_by_id() {
    let shr_state = ut_default_share_state();
    let member = MemberIdentity {
        member_id: Some("m-100".to_string()),
        email: None,
    };
    let out = ut_member_uc(&shr_state).execute(member, ut_today()).await.unwrap();
    assert_eq!(out.containers.len(), 1);
    let c = &out.containers[0];
    assert_eq!(c.number.as_str(), "KONT-001");
    assert_eq!(c.product_ids.len(), 3);
    // missing product skipped
    assert_eq!(out.products.len(), 2);
    assert!(out.products.contains_key("p1"));
    assert!(out.products.contains_key("p2"));
    assert!(!out.products.contains_key("p404"));
}

#[tokio::test]
async fn member_containers_by_email() {
    let shr_state = ut_default_share_state();
    let member = MemberIdentity {
        member_id: Some("m-999".to_string()),
        email: Some("anna@example.com".to_string()),
    };
    let today = NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
    let out = ut_member_uc(&shr_state).execute(member, today).await.unwrap();
    assert_eq!(out.containers.len(), 1);
    let c = &out.containers[0];
    assert_eq!(c.id.as_str(), "k2");
    assert_eq!(c.departure, NaiveDate::from_ymd_opt(2026, 2, 5));
    assert_eq!(c.delivery.waypoint, "malacca-strait");
    assert_eq!(out.products["p2"].name.as_str(), "Stół rozkładany");
}

#[tokio::test]
async fn member_containers_anonymous() {
    let shr_state = ut_default_share_state();
    let out = ut_member_uc(&shr_state)
        .execute(MemberIdentity::default(), ut_today())
        .await
        .unwrap();
    assert!(out.containers.is_empty());
    assert!(out.products.is_empty());
}
