//! Plain-text rendering for command results.

use inventiq_core::models::{DemandForecast, InventorySummary, Product, RestockRecommendation};

/// Widest product name shown in tables
const NAME_WIDTH: usize = 24;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", -amount)
    } else {
        format!("${:.2}", amount)
    }
}

pub fn product_table(products: &[Product]) -> String {
    let mut out = format!(
        "{:<8} {:<width$} {:<14} {:>6} {:>8} {:>10}  {}\n",
        "ID",
        "NAME",
        "CATEGORY",
        "STOCK",
        "REORDER",
        "PRICE",
        "STATUS",
        width = NAME_WIDTH
    );
    for p in products {
        out.push_str(&format!(
            "{:<8} {:<width$} {:<14} {:>6} {:>8} {:>10}  {}\n",
            truncate(&p.id, 8),
            truncate(&p.name, NAME_WIDTH),
            truncate(&p.category, 14),
            p.current_stock,
            p.reorder_level,
            format_currency(p.selling_price),
            p.stock_status(),
            width = NAME_WIDTH
        ));
    }
    out
}

pub fn product_detail(p: &Product) -> String {
    format!(
        "{} ({})\n  Category:      {}\n  Supplier:      {}\n  Stock:         {} (reorder at {}) - {}\n  \
         Purchase/Sell: {} / {} (margin {})\n  Lead time:     {} days\n  Units sold:    {}\n",
        p.name,
        p.id,
        p.category,
        p.supplier,
        p.current_stock,
        p.reorder_level,
        p.stock_status(),
        format_currency(p.purchase_price),
        format_currency(p.selling_price),
        format_currency(p.margin()),
        p.lead_time,
        p.total_units_sold(),
    )
}

pub fn summary(summary: &InventorySummary) -> String {
    let mut out = format!(
        "Total products: {}\nLow stock:      {}\nOut of stock:   {}\n",
        summary.total_products,
        summary.low_stock.len(),
        summary.out_of_stock.len()
    );

    if !summary.categories.is_empty() {
        out.push_str("\nBy category:\n");
        for (category, count) in &summary.categories {
            let label = if category.is_empty() { "(none)" } else { category.as_str() };
            out.push_str(&format!("  {:<20} {}\n", truncate(label, 20), count));
        }
    }

    if !summary.low_stock.is_empty() {
        out.push_str("\nNeeds attention:\n");
        out.push_str(&product_table(&summary.low_stock));
    }
    out
}

pub fn forecast(product_id: &str, forecast: &DemandForecast) -> String {
    let daily: Vec<String> = forecast.ensemble.iter().map(|d| d.to_string()).collect();
    format!(
        "Forecast for {} over {} days: {} units\n  Daily: {}\n",
        product_id,
        forecast.days(),
        forecast.total_demand(),
        daily.join(" ")
    )
}

pub fn restock(product_id: &str, rec: &RestockRecommendation) -> String {
    let verdict = if rec.should_restock() {
        format!("order {} units", rec.recommended_restock)
    } else {
        "no restock needed".to_string()
    };
    format!(
        "{}: {} (predicted demand {}, safety stock {})\n",
        product_id, verdict, rec.predicted_demand, rec.safety_stock
    )
}
