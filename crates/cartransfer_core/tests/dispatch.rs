use cartransfer_core::db::{open_db, open_db_in_memory};
use cartransfer_core::{init, invoke, Response, Status};
use rusqlite::{Connection, TransactionBehavior};
use serde_json::{json, Value};
use std::time::Duration;

fn call(conn: &mut Connection, function: &str, args: &[&str]) -> Response {
    let args = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>();
    invoke(conn, function, &args)
}

fn payload_json(response: &Response) -> Value {
    assert!(response.is_ok(), "{}", response.message);
    serde_json::from_slice(&response.payload).expect("payload should be JSON")
}

fn seed(conn: &mut Connection) {
    for owner in [r#"{"Id":"o1","Name":"Alice"}"#, r#"{"Id":"o2","Name":"Bob"}"#] {
        assert!(call(conn, "AddOwner", &[owner]).is_ok());
    }
    let car = r#"{"Id":"c1","OwnerId":"o1","Name":"Roadster","Color":"red"}"#;
    let response = call(conn, "AddCar", &[car]);
    assert!(response.is_ok(), "{}", response.message);
}

#[test]
fn init_succeeds_with_empty_payload() {
    let response = init();
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.status.code(), 200);
    assert!(response.payload.is_empty());
}

#[test]
fn add_and_list_owners() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    seed(&mut conn);

    let owners = payload_json(&call(&mut conn, "ListOwners", &[]));
    assert_eq!(
        owners,
        json!([{"Id": "o1", "Name": "Alice"}, {"Id": "o2", "Name": "Bob"}])
    );
}

#[test]
fn duplicate_owner_is_reported_as_already_exists() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    seed(&mut conn);

    let response = call(&mut conn, "AddOwner", &[r#"{"Id":"o1","Name":"Eve"}"#]);
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.error_code, Some("already_exists"));
    assert!(response.message.contains("o1"));
}

#[test]
fn get_car_returns_the_stored_json() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    seed(&mut conn);

    let car = payload_json(&call(&mut conn, "GetCar", &[r#""c1""#]));
    assert_eq!(
        car,
        json!({"Id": "c1", "OwnerId": "o1", "Name": "Roadster", "Color": "red"})
    );

    let missing = call(&mut conn, "GetCar", &[r#""nope""#]);
    assert_eq!(missing.error_code, Some("not_found"));
}

#[test]
fn transfer_car_moves_ownership_and_listing_follows() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    seed(&mut conn);

    let response = call(&mut conn, "TransferCar", &[r#""c1""#, r#""o2""#]);
    assert!(response.is_ok(), "{}", response.message);
    assert!(response.payload.is_empty());

    let for_o1 = payload_json(&call(&mut conn, "ListOwnerIdCars", &[r#""o1""#]));
    assert_eq!(for_o1, json!([]));
    let for_o2 = payload_json(&call(&mut conn, "ListOwnerIdCars", &[r#""o2""#]));
    assert_eq!(
        for_o2,
        json!([{"Id": "c1", "OwnerId": "o2", "Name": "Roadster", "Color": "red"}])
    );

    let rejected = call(&mut conn, "TransferCar", &[r#""c1""#, r#""ghost""#]);
    assert_eq!(rejected.error_code, Some("validation_failed"));
    let car = payload_json(&call(&mut conn, "GetCar", &[r#""c1""#]));
    assert_eq!(car["OwnerId"], "o2");
}

#[test]
fn update_car_and_list_cars() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    seed(&mut conn);

    let update = r#"{"Id":"c1","OwnerId":"o1","Name":"Roadster","Color":"blue","Mileage":1200}"#;
    assert!(call(&mut conn, "UpdateCar", &[update]).is_ok());
    let missing = call(&mut conn, "UpdateCar", &[r#"{"Id":"c9","OwnerId":"o1"}"#]);
    assert_eq!(missing.error_code, Some("not_found"));

    let cars = payload_json(&call(&mut conn, "ListCars", &[]));
    assert_eq!(
        cars,
        json!([{"Id": "c1", "OwnerId": "o1", "Name": "Roadster", "Color": "blue", "Mileage": 1200}])
    );
}

#[test]
fn extra_fields_pass_through_add_transfer_and_listing_verbatim() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    seed(&mut conn);

    let added = r#"{"Id":"c7","OwnerId":"o1","Vin":123456789012345678901234567890,"Price":1.50,"Zeta":1,"Alpha":2}"#;
    let response = call(&mut conn, "AddCar", &[added]);
    assert!(response.is_ok(), "{}", response.message);
    assert_eq!(call(&mut conn, "GetCar", &[r#""c7""#]).payload_text(), added);

    let response = call(&mut conn, "TransferCar", &[r#""c7""#, r#""o2""#]);
    assert!(response.is_ok(), "{}", response.message);
    let transferred = added.replace(r#""OwnerId":"o1""#, r#""OwnerId":"o2""#);
    assert_eq!(
        call(&mut conn, "GetCar", &[r#""c7""#]).payload_text(),
        transferred
    );
    assert_eq!(
        call(&mut conn, "ListOwnerIdCars", &[r#""o2""#]).payload_text(),
        format!("[{transferred}]")
    );
}

#[test]
fn null_string_argument_reads_as_empty_id() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    seed(&mut conn);
    assert!(call(&mut conn, "AddOwner", &[r#"{"Id":""}"#]).is_ok());
    assert!(call(&mut conn, "AddCar", &[r#"{"Id":"c2","OwnerId":""}"#]).is_ok());

    let cars = payload_json(&call(&mut conn, "ListOwnerIdCars", &["null"]));
    assert_eq!(cars, json!([{"Id": "c2", "OwnerId": ""}]));

    let missing = call(&mut conn, "GetCar", &["null"]);
    assert_eq!(missing.error_code, Some("not_found"));

    let response = call(&mut conn, "TransferCar", &[r#""c1""#, "null"]);
    assert!(response.is_ok(), "{}", response.message);
    let car = payload_json(&call(&mut conn, "GetCar", &[r#""c1""#]));
    assert_eq!(car["OwnerId"], "");

    let response = call(&mut conn, "AddCar", &["null"]);
    assert_eq!(response.error_code, Some("malformed_input"));
}

#[test]
fn admin_filter_lists_every_car() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    seed(&mut conn);
    assert!(call(&mut conn, "AddCar", &[r#"{"Id":"c2","OwnerId":"o2"}"#]).is_ok());

    let cars = payload_json(&call(&mut conn, "ListOwnerIdCars", &[r#""admin""#]));
    assert_eq!(cars.as_array().expect("payload should be an array").len(), 2);
}

#[test]
fn add_car_with_unknown_owner_is_rejected() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    seed(&mut conn);

    let response = call(&mut conn, "AddCar", &[r#"{"Id":"c2","OwnerId":"ghost"}"#]);
    assert_eq!(response.error_code, Some("validation_failed"));
    assert_eq!(
        call(&mut conn, "GetCar", &[r#""c2""#]).error_code,
        Some("not_found")
    );
}

#[test]
fn argument_count_is_checked_before_decoding() {
    let mut conn = open_db_in_memory().expect("open in-memory db");

    let response = call(&mut conn, "TransferCar", &["not json"]);
    assert_eq!(response.error_code, Some("malformed_input"));
    assert_eq!(
        response.message,
        "not enough number of arguments: 1 given, 2 expected"
    );

    for function in ["AddOwner", "AddCar", "GetCar", "UpdateCar", "ListOwnerIdCars"] {
        let response = call(&mut conn, function, &[]);
        assert_eq!(response.error_code, Some("malformed_input"), "{function}");
    }
}

#[test]
fn undecodable_arguments_are_malformed_input() {
    let mut conn = open_db_in_memory().expect("open in-memory db");

    let response = call(&mut conn, "AddOwner", &["{\"Name\":\"no id\"}"]);
    assert_eq!(response.error_code, Some("malformed_input"));
    assert!(response.message.starts_with("failed to decode Owner JSON"));

    let response = call(&mut conn, "GetCar", &["c1"]);
    assert_eq!(response.error_code, Some("malformed_input"));

    let response = call(&mut conn, "TransferCar", &[r#""c1""#, "42x"]);
    assert!(response.message.contains("2nd argument"));
}

#[test]
fn unknown_operation_is_rejected() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let response = call(&mut conn, "DeleteCar", &[r#""c1""#]);
    assert_eq!(response.error_code, Some("unknown_operation"));
    assert_eq!(response.message, "Unknown method: DeleteCar");
}

#[test]
fn each_invocation_gets_its_own_tx_id() {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let first = call(&mut conn, "ListOwners", &[]);
    let second = call(&mut conn, "ListOwners", &[]);
    assert_ne!(first.tx_id, second.tx_id);
    assert_eq!(first.payload_text(), "[]");
}

#[test]
fn committed_invocations_survive_reopen() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("ledger.sqlite3");

    {
        let mut conn = open_db(&path).expect("open db");
        seed(&mut conn);
    }

    let mut reopened = open_db(&path).expect("open db");
    let cars = payload_json(&call(&mut reopened, "ListCars", &[]));
    assert_eq!(cars.as_array().expect("payload should be an array").len(), 1);
}

#[test]
fn write_conflict_surfaces_as_store_failure_without_retry() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("ledger.sqlite3");
    let mut holder = open_db(&path).expect("open db");
    let mut contender = open_db(&path).expect("open db");
    contender.busy_timeout(Duration::ZERO).expect("set busy timeout");

    let lock = holder
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .expect("take write lock");
    let response = call(&mut contender, "AddOwner", &[r#"{"Id":"o1"}"#]);
    assert_eq!(response.error_code, Some("store_failure"));
    assert!(response.message.contains("conflict"));
    lock.rollback().expect("release lock");

    assert!(call(&mut contender, "AddOwner", &[r#"{"Id":"o1"}"#]).is_ok());
}
