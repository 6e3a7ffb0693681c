//! Time-ordered record ids.
//!
//! All rows this crate inserts get UUIDv7 ids from one shared clock context,
//! which keeps ids from the same process strictly increasing. Queries that
//! order by timestamp use the id as tiebreak, so rows sharing a timestamp
//! still come back in insertion order.

use once_cell::sync::Lazy;
use std::sync::Mutex;
use uuid::{ContextV7, Timestamp, Uuid};

static CLOCK: Lazy<Mutex<ContextV7>> = Lazy::new(|| Mutex::new(ContextV7::new()));

pub fn new_id() -> Uuid {
    Uuid::new_v7(Timestamp::now(&*CLOCK))
}
