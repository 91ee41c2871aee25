use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::{debug, info};

use crate::config::CategoryTable;
use crate::models::{RankedProduct, RankingRecord, UpdateLogEntry};

const RANKING_COLUMNS: &str =
    "date, category, rank, brand, product, sale_price, original_price, event";

pub struct Database {
    pool: SqlitePool,
}

fn ranking_from_row(row: &SqliteRow) -> RankingRecord {
    RankingRecord {
        date: row.get("date"),
        category: row.get("category"),
        rank: row.get("rank"),
        brand: row.get("brand"),
        product: row.get("product"),
        sale_price: row.get("sale_price"),
        original_price: row.get("original_price"),
        event: row.get("event"),
    }
}

/// Filesystem path behind a `sqlite:` URL, if it names a file.
fn database_file(db_url: &str) -> Option<&Path> {
    let rest = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);

    if path.is_empty() || path.contains(":memory:") {
        None
    } else {
        Some(Path::new(path))
    }
}

/// Escape `LIKE` wildcards so the query matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Database {
    pub async fn open(db_url: &str) -> Result<Self> {
        if let Some(parent) = database_file(db_url).and_then(Path::parent)
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // Create database file if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database file");
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePool::connect(db_url)
            .await
            .with_context(|| format!("Failed to connect to {db_url}"))?;

        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    /// Replace the `(date, category)` snapshot and record the update.
    ///
    /// Runs as one transaction: old rows are deleted, the new rows inserted,
    /// and the log entry appended before commit. Any failure rolls the whole
    /// unit back, leaving the previous snapshot in place.
    pub async fn replace_snapshot(
        &self,
        date: NaiveDate,
        category: &str,
        products: &[RankedProduct],
        updated_at: DateTime<FixedOffset>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM rankings WHERE date = ? AND category = ?")
            .bind(date)
            .bind(category)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for product in products {
            sqlx::query(
                r"
                INSERT INTO rankings (date, category, rank, brand, product, sale_price, original_price, event)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(date)
            .bind(category)
            .bind(product.rank)
            .bind(&product.brand)
            .bind(&product.product)
            .bind(&product.sale_price)
            .bind(&product.original_price)
            .bind(&product.event)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("INSERT INTO update_logs (category, updated_at) VALUES (?, ?)")
            .bind(category)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            "Replaced {} rows with {} for {} on {}",
            removed,
            products.len(),
            category,
            date
        );
        Ok(())
    }

    pub async fn rankings_on(&self, category: &str, date: NaiveDate) -> Result<Vec<RankingRecord>> {
        self.rankings_between(category, date, date).await
    }

    /// Rankings for an inclusive date range, ordered by date then rank.
    pub async fn rankings_between(
        &self,
        category: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RankingRecord>> {
        let sql = format!(
            "SELECT {RANKING_COLUMNS} FROM rankings \
             WHERE category = ? AND date BETWEEN ? AND ? \
             ORDER BY date, rank"
        );

        let rows = sqlx::query(&sql)
            .bind(category)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(ranking_from_row).collect())
    }

    pub async fn latest_update(&self) -> Result<Option<UpdateLogEntry>> {
        let row = sqlx::query(
            "SELECT id, category, updated_at FROM update_logs ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UpdateLogEntry {
            id: row.get("id"),
            category: row.get("category"),
            updated_at: row.get("updated_at"),
        }))
    }

    pub async fn latest_update_for(&self, category: &str) -> Result<Option<UpdateLogEntry>> {
        let row = sqlx::query(
            "SELECT id, category, updated_at FROM update_logs WHERE category = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UpdateLogEntry {
            id: row.get("id"),
            category: row.get("category"),
            updated_at: row.get("updated_at"),
        }))
    }

    /// Product-name substring search, case-insensitive for ASCII.
    ///
    /// A product that ranks in several categories on the same day is reported
    /// once, under the category that comes first in `categories`.
    pub async fn search(
        &self,
        query: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        categories: &CategoryTable,
    ) -> Result<Vec<RankingRecord>> {
        let sql = format!(
            "SELECT {RANKING_COLUMNS} FROM rankings \
             WHERE product LIKE '%' || ? || '%' ESCAPE '\\' \
             AND (? IS NULL OR date >= ?) \
             AND (? IS NULL OR date <= ?)"
        );

        let rows = sqlx::query(&sql)
            .bind(escape_like(query))
            .bind(from)
            .bind(from)
            .bind(to)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        let mut matches: Vec<RankingRecord> = rows.iter().map(ranking_from_row).collect();
        matches.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.product.cmp(&b.product))
                .then_with(|| {
                    categories
                        .priority(&a.category)
                        .cmp(&categories.priority(&b.category))
                })
                .then_with(|| a.rank.cmp(&b.rank))
        });

        let mut seen = HashSet::new();
        matches.retain(|r| seen.insert((r.date, r.product.clone())));
        matches.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.rank.cmp(&b.rank)));

        Ok(matches)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}
