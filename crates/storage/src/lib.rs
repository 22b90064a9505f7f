use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite, Transaction,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{
        AdminUserId, AdminUserSummary, Category, CategoryFilter, OrderId, OrderSummary, Price,
        Product, ProductId,
    },
    protocol::ProductDraft,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredAdminUser {
    pub id: AdminUserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl StoredAdminUser {
    pub fn summary(&self) -> AdminUserSummary {
        AdminUserSummary {
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, category, image, stock, created_at";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_product(&self, draft: &ProductDraft) -> Result<ProductId> {
        let mut tx = self.pool.begin().await?;
        let rec = sqlx::query(
            "INSERT INTO products (name, description, price_cents, category, image, stock, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price.cents())
        .bind(draft.category.as_str())
        .bind(&draft.image)
        .bind(draft.stock)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .context("failed to insert product")?;
        let product_id = ProductId(rec.get::<i64, _>(0));
        replace_media(&mut tx, product_id, draft).await?;
        tx.commit().await?;
        Ok(product_id)
    }

    pub async fn load_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(product_id.0)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut product = product_from_row(&row);
        self.load_media(&mut product).await?;
        Ok(Some(product))
    }

    /// Lists products oldest first, optionally narrowed by category and a
    /// case-insensitive substring of the name.
    pub async fn list_products(
        &self,
        filter: &CategoryFilter,
        search: Option<&str>,
    ) -> Result<Vec<Product>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM products
             WHERE (?1 IS NULL OR category = ?1)
               AND (?2 IS NULL OR instr(lower(name), lower(?2)) > 0)
             ORDER BY id ASC"
        ))
        .bind(filter.as_category().map(Category::as_str))
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let mut product = product_from_row(&row);
            self.load_media(&mut product).await?;
            products.push(product);
        }
        Ok(products)
    }

    /// Returns `false` when no product has this id.
    pub async fn update_product(&self, product_id: ProductId, draft: &ProductDraft) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE products
             SET name = ?, description = ?, price_cents = ?, category = ?, image = ?, stock = ?
             WHERE id = ?",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price.cents())
        .bind(draft.category.as_str())
        .bind(&draft.image)
        .bind(draft.stock)
        .bind(product_id.0)
        .execute(&mut *tx)
        .await
        .context("failed to update product")?
        .rows_affected();
        if updated == 0 {
            return Ok(false);
        }
        replace_media(&mut tx, product_id, draft).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Returns `false` when no product has this id.
    pub async fn delete_product(&self, product_id: ProductId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM product_photos WHERE product_id = ?")
            .bind(product_id.0)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM product_details WHERE product_id = ?")
            .bind(product_id.0)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(product_id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    pub async fn count_products(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Sum of the listed price of every product, as the dashboard reports it.
    pub async fn total_catalog_value(&self) -> Result<Price> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(price_cents), 0) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(Price(total))
    }

    pub async fn count_admin_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn create_admin_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<AdminUserId> {
        let rec = sqlx::query(
            "INSERT INTO admin_users (email, name, password_hash, created_at) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert admin user '{email}'"))?;
        Ok(AdminUserId(rec.get::<i64, _>(0)))
    }

    /// Inserts the admin only while the table is empty, in one statement, so
    /// concurrent first-time setups cannot both succeed.
    pub async fn create_first_admin_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<Option<AdminUserId>> {
        let rec = sqlx::query(
            "INSERT INTO admin_users (email, name, password_hash, created_at) \
             SELECT ?, ?, ?, ? WHERE NOT EXISTS (SELECT 1 FROM admin_users) RETURNING id",
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to insert first admin user '{email}'"))?;
        Ok(rec.map(|r| AdminUserId(r.get::<i64, _>(0))))
    }

    pub async fn find_admin_by_email(&self, email: &str) -> Result<Option<StoredAdminUser>> {
        let row = sqlx::query(
            "SELECT id, email, name, password_hash, created_at FROM admin_users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| StoredAdminUser {
            id: AdminUserId(r.get::<i64, _>(0)),
            email: r.get::<String, _>(1),
            name: r.get::<String, _>(2),
            password_hash: r.get::<String, _>(3),
            created_at: r.get::<DateTime<Utc>, _>(4),
        }))
    }

    pub async fn insert_order(
        &self,
        customer_name: &str,
        total: Price,
        status: &str,
    ) -> Result<OrderId> {
        let rec = sqlx::query(
            "INSERT INTO orders (customer_name, total_cents, status, created_at) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(customer_name)
        .bind(total.cents())
        .bind(status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(OrderId(rec.get::<i64, _>(0)))
    }

    pub async fn count_orders(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Newest first.
    pub async fn recent_orders(&self, limit: u32) -> Result<Vec<OrderSummary>> {
        let rows = sqlx::query(
            "SELECT id, customer_name, total_cents, status, created_at
             FROM orders
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| OrderSummary {
                id: OrderId(r.get::<i64, _>(0)),
                customer_name: r.get::<String, _>(1),
                total: Price(r.get::<i64, _>(2)),
                status: r.get::<String, _>(3),
                created_at: r.get::<DateTime<Utc>, _>(4),
            })
            .collect())
    }

    async fn load_media(&self, product: &mut Product) -> Result<()> {
        product.photos = sqlx::query_scalar::<_, String>(
            "SELECT url FROM product_photos WHERE product_id = ? ORDER BY position ASC",
        )
        .bind(product.id.0)
        .fetch_all(&self.pool)
        .await?;
        product.details = sqlx::query_scalar::<_, String>(
            "SELECT line FROM product_details WHERE product_id = ? ORDER BY position ASC",
        )
        .bind(product.id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(())
    }
}

fn product_from_row(r: &SqliteRow) -> Product {
    Product {
        id: ProductId(r.get::<i64, _>(0)),
        name: r.get::<String, _>(1),
        description: r.get::<String, _>(2),
        price: Price(r.get::<i64, _>(3)),
        category: Category(r.get::<String, _>(4)),
        image: r.get::<String, _>(5),
        photos: Vec::new(),
        details: Vec::new(),
        stock: r.get::<i64, _>(6),
        created_at: r.get::<DateTime<Utc>, _>(7),
    }
}

async fn replace_media(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: ProductId,
    draft: &ProductDraft,
) -> Result<()> {
    sqlx::query("DELETE FROM product_photos WHERE product_id = ?")
        .bind(product_id.0)
        .execute(&mut **tx)
        .await?;
    for (position, url) in draft.photos.iter().enumerate() {
        sqlx::query("INSERT INTO product_photos (product_id, position, url) VALUES (?, ?, ?)")
            .bind(product_id.0)
            .bind(position as i64)
            .bind(url)
            .execute(&mut **tx)
            .await?;
    }

    sqlx::query("DELETE FROM product_details WHERE product_id = ?")
        .bind(product_id.0)
        .execute(&mut **tx)
        .await?;
    for (position, line) in draft.details.iter().enumerate() {
        sqlx::query("INSERT INTO product_details (product_id, position, line) VALUES (?, ?, ?)")
            .bind(product_id.0)
            .bind(position as i64)
            .bind(line)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
