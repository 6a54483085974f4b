use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = AccountId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = CompanyId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = JournalEntryId::from_uuid(uuid);
    assert_eq!(format!("{id}"), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = PostingRuleId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(AccountId::from_str("invalid").is_err());
}

#[test]
fn test_typed_ids_order_by_uuid() {
    let low = AccountId::from_uuid(Uuid::from_u128(1));
    let high = AccountId::from_uuid(Uuid::from_u128(2));
    assert!(low < high);

    let mut ids = vec![high, low];
    ids.sort();
    assert_eq!(ids, vec![low, high]);
}

#[test]
fn test_typed_id_serializes_transparently() {
    let uuid = Uuid::new_v4();
    let id = CompanyId::from_uuid(uuid);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));
}
