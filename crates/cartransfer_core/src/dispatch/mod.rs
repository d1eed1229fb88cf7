//! Invocation dispatch: operation name + JSON string arguments in, response out.
//!
//! # Responsibility
//! - Map operation names onto repository calls and encode their results.
//! - Scope every invocation to one SQLite transaction.
//!
//! # Invariants
//! - Argument count is checked before any argument is decoded.
//! - An invocation commits all of its writes or none of them.
//! - Failures are terminal; nothing is retried.
//! - Logs carry metadata only (function, argument count, tx id), never
//!   argument contents.

use crate::ledger::{LedgerError, SqliteLedger, StateStore};
use crate::model::car::Car;
use crate::model::owner::Owner;
use crate::repo::car_repo::CarRepository;
use crate::repo::owner_repo::OwnerRepository;
use crate::repo::RepoError;
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

mod operation;
mod response;

pub use operation::Operation;
pub use response::{Response, Status};

pub type DispatchResult<T> = Result<T, DispatchError>;

#[derive(Debug)]
pub enum DispatchError {
    /// Too few arguments, or an argument failed to decode.
    MalformedInput(String),
    /// Operation name not recognised.
    UnknownOperation(String),
    Repo(RepoError),
    /// Transaction begin/commit failed.
    Store(LedgerError),
    /// Result payload failed to encode.
    Encode(serde_json::Error),
}

impl DispatchError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::UnknownOperation(_) => "unknown_operation",
            Self::Repo(err) => err.error_code(),
            Self::Store(_) => "store_failure",
            Self::Encode(_) => "encode_failed",
        }
    }
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedInput(message) => write!(f, "{message}"),
            Self::UnknownOperation(name) => write!(f, "Unknown method: {name}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode result: {err}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::MalformedInput(_) | Self::UnknownOperation(_) => None,
        }
    }
}

impl From<RepoError> for DispatchError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for DispatchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(value.into())
    }
}

/// Entry point run once when the ledger program is instantiated.
pub fn init() -> Response {
    let tx_id = Uuid::new_v4();
    info!("event=init module=dispatch status=ok tx_id={tx_id}");
    Response::success(tx_id, Vec::new())
}

/// Runs one invocation inside its own transaction on `conn`.
///
/// The transaction commits only when the operation succeeds; every failure
/// rolls it back.
pub fn invoke(conn: &mut Connection, function: &str, args: &[String]) -> Response {
    let tx_id = Uuid::new_v4();
    let started_at = Instant::now();
    info!(
        "event=invoke module=dispatch status=start tx_id={} timestamp_ms={} function={} arg_count={}",
        tx_id,
        epoch_millis(),
        function,
        args.len()
    );

    match invoke_in_transaction(conn, function, args) {
        Ok(payload) => {
            info!(
                "event=invoke module=dispatch status=ok tx_id={} function={} duration_ms={} payload_bytes={}",
                tx_id,
                function,
                started_at.elapsed().as_millis(),
                payload.len()
            );
            Response::success(tx_id, payload)
        }
        Err(err) => {
            warn!(
                "event=invoke module=dispatch status=error tx_id={} function={} duration_ms={} error_code={} error={}",
                tx_id,
                function,
                started_at.elapsed().as_millis(),
                err.error_code(),
                err
            );
            Response::failure(tx_id, &err)
        }
    }
}

fn invoke_in_transaction(
    conn: &mut Connection,
    function: &str,
    args: &[String],
) -> DispatchResult<Vec<u8>> {
    let operation = function.parse::<Operation>()?;
    let behavior = if operation.is_read_only() {
        TransactionBehavior::Deferred
    } else {
        TransactionBehavior::Immediate
    };

    let tx = conn.transaction_with_behavior(behavior)?;
    let payload = {
        let ledger = SqliteLedger::new(&tx);
        execute(&ledger, operation, args)?
    };
    tx.commit()?;
    Ok(payload)
}

/// Decodes `args`, runs `operation` against `stub`, and encodes the result.
///
/// Performs no transaction management; the caller owns atomicity.
pub fn execute<S: StateStore + ?Sized>(
    stub: &S,
    operation: Operation,
    args: &[String],
) -> DispatchResult<Vec<u8>> {
    check_len(operation, args)?;

    let owners = OwnerRepository::new(stub);
    let cars = CarRepository::new(stub, owners);

    match operation {
        Operation::AddOwner => {
            let owner: Owner = decode_arg(args, 0, "Owner JSON")?;
            owners.add(&owner)?;
            Ok(Vec::new())
        }
        Operation::ListOwners => encode_payload(&owners.list()?),
        Operation::AddCar => {
            let car: Car = decode_arg(args, 0, "Car JSON")?;
            cars.add(&car)?;
            Ok(Vec::new())
        }
        Operation::ListCars => encode_payload(&cars.list()?),
        Operation::ListOwnerIdCars => {
            let owner_id = decode_string_arg(args, 0, "the 1st argument")?;
            encode_payload(&cars.list_by_owner(&owner_id)?)
        }
        Operation::GetCar => {
            let id = decode_string_arg(args, 0, "the 1st argument")?;
            encode_payload(&cars.get(&id)?)
        }
        Operation::UpdateCar => {
            let car: Car = decode_arg(args, 0, "Car JSON")?;
            cars.update(&car)?;
            Ok(Vec::new())
        }
        Operation::TransferCar => {
            let car_id = decode_string_arg(args, 0, "the 1st argument")?;
            let new_owner_id = decode_string_arg(args, 1, "the 2nd argument")?;
            cars.transfer(&car_id, &new_owner_id)?;
            Ok(Vec::new())
        }
    }
}

fn check_len(operation: Operation, args: &[String]) -> DispatchResult<()> {
    let expected = operation.min_args();
    if args.len() < expected {
        return Err(DispatchError::MalformedInput(format!(
            "not enough number of arguments: {} given, {} expected",
            args.len(),
            expected
        )));
    }
    Ok(())
}

fn decode_arg<T: DeserializeOwned>(
    args: &[String],
    index: usize,
    what: &str,
) -> DispatchResult<T> {
    let raw = args.get(index).ok_or_else(|| {
        DispatchError::MalformedInput(format!("missing argument at position {index}"))
    })?;
    serde_json::from_str(raw)
        .map_err(|err| DispatchError::MalformedInput(format!("failed to decode {what}: {err}")))
}

/// Decodes a JSON string argument; `null` reads as the empty string.
fn decode_string_arg(args: &[String], index: usize, what: &str) -> DispatchResult<String> {
    decode_arg::<Option<String>>(args, index, what).map(Option::unwrap_or_default)
}

fn encode_payload<T: Serialize + ?Sized>(value: &T) -> DispatchResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(DispatchError::Encode)
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}
