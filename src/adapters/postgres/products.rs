use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{or_not_found, parse_column};
use crate::domain::{Product, ProductStatus};
use crate::ports::{ProductRepository, RepositoryError, RepositoryResult};

#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn insert(&self, product: &Product) -> RepositoryResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (
                id, name, description, base_price, coverage_min, coverage_max,
                status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.base_price)
        .bind(&product.coverage_min)
        .bind(&product.coverage_max)
        .bind(product.status.as_str())
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        or_not_found(row, "product", id)?.into_domain()
    }

    async fn list(&self, status: Option<ProductStatus>) -> RepositoryResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT * FROM products
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(ProductStatus::as_str))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProductRow::into_domain).collect()
    }

    async fn update(&self, product: &Product) -> RepositoryResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name = $2, description = $3, base_price = $4, coverage_min = $5,
                coverage_max = $6, status = $7, updated_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.base_price)
        .bind(&product.coverage_min)
        .bind(&product.coverage_max)
        .bind(product.status.as_str())
        .bind(product.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        or_not_found(row, "product", product.id)?.into_domain()
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                // foreign_key_violation
                sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23503") => {
                    RepositoryError::Conflict(format!(
                        "product {} is referenced by applications or payments",
                        id
                    ))
                }
                other => RepositoryError::from(other),
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("product {}", id)));
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    base_price: BigDecimal,
    coverage_min: BigDecimal,
    coverage_max: BigDecimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_domain(self) -> RepositoryResult<Product> {
        Ok(Product {
            id: self.id,
            name: self.name,
            description: self.description,
            base_price: self.base_price,
            coverage_min: self.coverage_min,
            coverage_max: self.coverage_max,
            status: parse_column(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
