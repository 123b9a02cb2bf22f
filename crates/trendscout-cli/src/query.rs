//! Read-only product queries and the standalone archival sweep.

use trendscout_trends::{PgProductStore, ProductStore};

pub(crate) fn clip(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

pub(crate) fn fmt_price(price: Option<f64>) -> String {
    price.map_or_else(|| "-".to_string(), |p| format!("{p:.2}"))
}

/// Prints the top active products.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_top(pool: &sqlx::PgPool, limit: usize) -> anyhow::Result<()> {
    let store = PgProductStore::new(pool.clone());
    let products = store.top_by_score(limit).await?;

    if products.is_empty() {
        println!("no active products; run `scan` first");
        return Ok(());
    }

    println!(
        "{:<7}{:<8}{:<10}{:<12}{:<18}PRODUCT",
        "ID", "SCORE", "PRICE", "UPDATED", "CATEGORY"
    );
    for p in &products {
        println!(
            "{:<7}{:<8.2}{:<10}{:<12}{:<18}{}",
            p.id,
            p.trend_score,
            fmt_price(p.price_estimate),
            p.last_updated.format("%Y-%m-%d"),
            clip(&p.category, 16),
            clip(&p.product_name, 60),
        );
    }
    Ok(())
}

/// Prints the score history of one product, newest first.
///
/// # Errors
///
/// Returns an error if the product does not exist or a query fails.
pub(crate) async fn run_history(
    pool: &sqlx::PgPool,
    product_id: i64,
    limit: usize,
) -> anyhow::Result<()> {
    let product = match trendscout_db::get_product(pool, product_id).await {
        Ok(row) => row,
        Err(trendscout_db::DbError::NotFound) => {
            anyhow::bail!("product {product_id} not found; see `top` for ids")
        }
        Err(e) => return Err(e.into()),
    };

    let store = PgProductStore::new(pool.clone());
    let history = store.history(product_id, limit).await?;

    println!("Product: {}", product.product_name);
    println!(
        "Status: {}  First seen: {}",
        product.status,
        product.first_seen_date.format("%Y-%m-%d")
    );
    println!();
    println!("{:<22}{:<8}VOLUME", "RECORDED", "SCORE");
    for entry in &history {
        println!(
            "{:<22}{:<8.2}{}",
            entry.recorded_at.format("%Y-%m-%d %H:%M"),
            entry.trend_score,
            entry.search_volume
        );
    }
    Ok(())
}

/// Runs only the archival sweep.
///
/// # Errors
///
/// Returns an error if the sweep fails.
pub(crate) async fn run_archive(
    pool: &sqlx::PgPool,
    days: u32,
    below: f64,
) -> anyhow::Result<()> {
    let store = PgProductStore::new(pool.clone());
    let archived = store.archive_stale(days, below).await?;
    println!("archived {archived} product(s) not updated in {days} days scoring below {below}");
    Ok(())
}
