//! Uniqueness checks for people identified by PESEL, email and phone number

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

/// Identity values to check; `None` fields are skipped
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity<'a> {
    pub pesel: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone_number: Option<&'a str>,
}

impl<'a> Identity<'a> {
    /// Field name and SQL condition on `$1` for every value present
    fn checks(&self) -> Vec<(&'static str, &'static str, &'a str)> {
        [
            ("pesel", "pesel = $1", self.pesel),
            ("email", "LOWER(email) = LOWER($1)", self.email),
            ("phone_number", "phone_number = $1", self.phone_number),
        ]
        .into_iter()
        .filter_map(|(field, condition, value)| value.map(|v| (field, condition, v)))
        .collect()
    }
}

/// Name of the first field of `identity` already used by another row of `table`
pub async fn taken_field(
    pool: &Pool<Postgres>,
    table: &'static str,
    identity: Identity<'_>,
    exclude_id: Option<i32>,
) -> AppResult<Option<&'static str>> {
    for (field, condition, value) in identity.checks() {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} AND ($2::INT IS NULL OR id != $2))",
            table, condition
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(value)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;
        if exists {
            return Ok(Some(field));
        }
    }

    Ok(None)
}
