use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{MySql, MySqlPool, Row};
use std::marker::PhantomData;
use tracing::{debug, trace, warn};
use waypoint_core::error::{RuleError, StorageError};
use waypoint_core::rule::{OrderBy, RedirectKind, Rule, RuleId};
use waypoint_core::store::{ReadRuleStore, Result, RuleStore};
use waypoint_core::{DomainRedirect, Priority, RegexRedirect};

type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

/// Table definitions for every rule type, in creation order.
pub const SCHEMA: &[&str] = &[
    include_str!("../ddl/mysql/domain_redirects.sql"),
    include_str!("../ddl/mysql/regex_redirects.sql"),
];

/// Table mapping for a rule type stored in MySQL.
///
/// Every table has an auto-increment `id` primary key; `COLUMNS` lists the
/// remaining columns in the order [`MySqlRule::bind_columns`] binds them.
pub trait MySqlRule: Rule {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &MySqlRow) -> Result<Self>;

    fn bind_columns<'q>(&self, query: MySqlQuery<'q>) -> MySqlQuery<'q>;
}

fn invalid_rule(table: &str, err: RuleError) -> StorageError {
    StorageError::InvalidData(format!("invalid row in '{table}': {err}"))
}

fn parse_kind(table: &str, raw: &str) -> Result<RedirectKind> {
    raw.parse().map_err(|e| invalid_rule(table, e))
}

impl MySqlRule for DomainRedirect {
    const TABLE: &'static str = "domain_redirects";
    const COLUMNS: &'static [&'static str] = &["domain", "target_domain", "redirect_type"];

    fn from_row(row: &MySqlRow) -> Result<Self> {
        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let domain: String = row.try_get("domain").map_err(map_sqlx_error)?;
        let target_domain: String = row.try_get("target_domain").map_err(map_sqlx_error)?;
        let kind: String = row.try_get("redirect_type").map_err(map_sqlx_error)?;

        Ok(DomainRedirect::new(domain, target_domain, parse_kind(Self::TABLE, &kind)?)
            .with_id(RuleId::new(id)))
    }

    fn bind_columns<'q>(&self, query: MySqlQuery<'q>) -> MySqlQuery<'q> {
        query
            .bind(self.domain.clone())
            .bind(self.target_domain.clone())
            .bind(self.kind.as_str())
    }
}

impl MySqlRule for RegexRedirect {
    const TABLE: &'static str = "regex_redirects";
    const COLUMNS: &'static [&'static str] =
        &["pattern", "replacement", "redirect_type", "priority"];

    fn from_row(row: &MySqlRow) -> Result<Self> {
        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let pattern: String = row.try_get("pattern").map_err(map_sqlx_error)?;
        let replacement: String = row.try_get("replacement").map_err(map_sqlx_error)?;
        let kind: String = row.try_get("redirect_type").map_err(map_sqlx_error)?;
        let priority: u8 = row.try_get("priority").map_err(map_sqlx_error)?;

        let priority =
            Priority::new(i64::from(priority)).map_err(|e| invalid_rule(Self::TABLE, e))?;

        Ok(RegexRedirect::new(pattern, replacement, parse_kind(Self::TABLE, &kind)?)
            .with_priority(priority)
            .with_id(RuleId::new(id)))
    }

    fn bind_columns<'q>(&self, query: MySqlQuery<'q>) -> MySqlQuery<'q> {
        query
            .bind(self.pattern.clone())
            .bind(self.replacement.clone())
            .bind(self.kind.as_str())
            .bind(self.priority.get())
    }
}

/// MySQL implementation of the rule store contract for one rule type.
///
/// Deletes are hard deletes: a removed rule must disappear from the next
/// rebuilt index, and nothing else reads the table.
#[derive(Debug, Clone)]
pub struct MySqlRuleStore<R> {
    pool: MySqlPool,
    _rule: PhantomData<fn() -> R>,
}

impl<R: MySqlRule> MySqlRuleStore<R> {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            _rule: PhantomData,
        }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn select_sql(order: OrderBy) -> String {
        let order_clause = match order {
            OrderBy::Id => "id".to_string(),
            other => format!("{}, id", other.field()),
        };
        format!(
            "SELECT id, {} FROM {} ORDER BY {}",
            R::COLUMNS.join(", "),
            R::TABLE,
            order_clause
        )
    }

    async fn fetch_ordered(&self, order: OrderBy) -> Result<Vec<R>> {
        let sql = Self::select_sql(order);
        trace!(table = R::TABLE, %order, "Listing rules");

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.iter().filter_map(decode_listed::<R>).collect())
    }
}

/// Decodes one row of a listing. A malformed row is logged and left out,
/// so the rest of the table still lists.
fn decode_listed<R: MySqlRule>(row: &MySqlRow) -> Option<R> {
    match R::from_row(row) {
        Ok(rule) => Some(rule),
        Err(err) => {
            let id = row.try_get::<i64, _>("id").ok();
            warn!(table = R::TABLE, id = ?id, error = %err, "Skipping malformed row");
            None
        }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl<R: MySqlRule> ReadRuleStore<R> for MySqlRuleStore<R> {
    async fn list_all(&self) -> Result<Vec<R>> {
        self.fetch_ordered(OrderBy::Id).await
    }

    async fn list_all_ordered(&self, order: OrderBy) -> Result<Vec<R>> {
        if !R::orderable_by(order) {
            return Err(StorageError::Query(format!(
                "table '{}' has no '{order}' column",
                R::TABLE
            )));
        }
        self.fetch_ordered(order).await
    }

    async fn get(&self, id: RuleId) -> Result<Option<R>> {
        let sql = format!(
            "SELECT id, {} FROM {} WHERE id = ? LIMIT 1",
            R::COLUMNS.join(", "),
            R::TABLE
        );

        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(R::from_row).transpose()
    }
}

#[async_trait]
impl<R: MySqlRule> RuleStore<R> for MySqlRuleStore<R> {
    async fn upsert(&self, rule: R) -> Result<R> {
        let columns = R::COLUMNS.join(", ");
        let placeholders = vec!["?"; R::COLUMNS.len()].join(", ");

        match rule.id() {
            Some(id) => {
                let updates = R::COLUMNS
                    .iter()
                    .map(|column| format!("{column} = VALUES({column})"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "INSERT INTO {} (id, {columns}) VALUES (?, {placeholders}) \
                     ON DUPLICATE KEY UPDATE {updates}",
                    R::TABLE
                );

                rule.bind_columns(sqlx::query(&sql).bind(id.get()))
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                debug!(table = R::TABLE, %id, "Upserted rule");
                Ok(rule)
            }
            None => {
                let sql = format!(
                    "INSERT INTO {} ({columns}) VALUES ({placeholders})",
                    R::TABLE
                );

                let result = rule
                    .bind_columns(sqlx::query(&sql))
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                let id = i64::try_from(result.last_insert_id()).map_err(|e| {
                    StorageError::InvalidData(format!(
                        "generated id for '{}' is out of range: {e}",
                        R::TABLE
                    ))
                })?;

                debug!(table = R::TABLE, id, "Inserted rule");
                Ok(rule.with_id(RuleId::new(id)))
            }
        }
    }

    async fn delete(&self, id: RuleId) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", R::TABLE);

        let result = sqlx::query(&sql)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
