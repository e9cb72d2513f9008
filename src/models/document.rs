//! JSONB mapping for documents embedded in a row.
//!
//! Postgres sends `jsonb` in binary form as a version byte followed by the
//! JSON text; each embedded type is (de)serialized through serde_json.

use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Jsonb;
use std::io::Write;

use super::{OrderItems, PaymentResult, Reviews, ShippingAddress};

const JSONB_VERSION: u8 = 1;

macro_rules! jsonb_document {
    ($($ty:ty),+ $(,)?) => {$(
        impl ToSql<Jsonb, Pg> for $ty {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(&[JSONB_VERSION])?;
                serde_json::to_writer(out, self)?;
                Ok(serialize::IsNull::No)
            }
        }

        impl FromSql<Jsonb, Pg> for $ty {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let value = <serde_json::Value as FromSql<Jsonb, Pg>>::from_sql(bytes)?;
                Ok(serde_json::from_value(value)?)
            }
        }
    )+};
}

jsonb_document!(Reviews, OrderItems, ShippingAddress, PaymentResult);
