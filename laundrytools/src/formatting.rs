use std::fmt::Write;

use anyhow::Result;
use laundry_engine::{
    affiliate_objects::AffiliateSummary,
    db_types::{ArticleServicePrice, CommissionTransaction, Order, PointTransaction, PriceAdjustmentRecord},
    loyalty_objects::LoyaltySummary,
    order_objects::{OrderDetails, PriceAdjustment},
};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

pub fn format_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Status", "Subtotal", "Total", "Manual price", "Affiliate", "Created At"]);
    for order in orders {
        table.add_row(row![
            order.id,
            order.status.to_string(),
            r->order.subtotal.to_string(),
            r->order.total_amount.to_string(),
            r->order.manual_price.map(|p| p.to_string()).unwrap_or_default(),
            order.affiliate_code.as_deref().unwrap_or_default(),
            order.created_at.to_string()
        ]);
    }
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_order_details(details: &OrderDetails, adjustments: &[PriceAdjustmentRecord]) -> Result<String> {
    let order = &details.order;
    let mut f = String::new();
    writeln!(f, "===============================================================================")?;
    writeln!(f, "Order #{id:<10} Customer #{user:<10} Created {created}", id = order.id, user = order.user_id, created = order.created_at)?;
    writeln!(f, "[{:^15}]  Paid: {:<5}                   Updated {}", order.status.to_string(), details.is_paid(), order.updated_at)?;
    writeln!(f, "-------------------------------------------------------------------------------")?;
    let mut items = Table::new();
    items.set_titles(row!["Article", "Service", "Qty", "Weight", "Unit price", "Line total", "Pricing", "Premium"]);
    for item in &details.items {
        items.add_row(row![
            item.article_id,
            item.service_id,
            r->item.quantity,
            r->item.weight.map(|w| format!("{w:.2} kg")).unwrap_or_default(),
            r->item.unit_price.to_string(),
            r->item.line_total.to_string(),
            item.pricing_type,
            item.is_premium
        ]);
    }
    markdown_style(&mut items);
    writeln!(f, "{items}")?;
    for discount in &details.discounts {
        writeln!(f, "Offer #{}: -{} ({} points)", discount.offer_id, discount.amount, discount.points_spent)?;
    }
    writeln!(f, "Subtotal:     {:>12}", order.subtotal)?;
    writeln!(f, "Total:        {:>12}", order.total_amount)?;
    if let Some(price) = order.manual_price {
        writeln!(f, "Manual price: {price:>12}")?;
    }
    writeln!(f, "Affiliate:    {}", order.affiliate_code.as_deref().unwrap_or("None"))?;
    if !details.status_history.is_empty() {
        writeln!(f, "-------------------------------------------------------------------------------")?;
        for change in &details.status_history {
            writeln!(f, "{}  {} -> {} by user #{}", change.changed_at, change.old_status, change.new_status, change.changed_by)?;
        }
    }
    if !adjustments.is_empty() {
        writeln!(f, "-------------------------------------------------------------------------------")?;
        for a in adjustments {
            writeln!(
                f,
                "{}  {} -> {}  points {:+}  commission {}",
                a.created_at, a.old_price, a.new_price, a.points_adjustment, a.commission_delta
            )?;
        }
    }
    writeln!(f, "===============================================================================")?;
    Ok(f)
}

pub fn format_price_adjustment(adjustment: &PriceAdjustment) -> Result<String> {
    let mut f = String::new();
    if adjustment.is_noop() {
        writeln!(f, "The price of order #{} is already {}. Nothing changed.", adjustment.order.id, adjustment.new_price)?;
        return Ok(f);
    }
    writeln!(f, "Order #{} repriced from {} to {}", adjustment.order.id, adjustment.old_price, adjustment.new_price)?;
    writeln!(f, "Points adjustment: {:+}", adjustment.points_adjustment)?;
    match adjustment.affiliate_id {
        Some(id) => writeln!(f, "Commission adjustment: {} (affiliate #{id})", adjustment.commission_delta)?,
        None => writeln!(f, "No commission adjustment")?,
    }
    Ok(f)
}

pub fn format_loyalty_summary(summary: &LoyaltySummary) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "User #{}", summary.user_id)?;
    writeln!(f, "Balance:      {:>10} points", summary.points_balance)?;
    writeln!(f, "Total earned: {:>10} points", summary.total_earned)?;
    match summary.points_to_next_tier {
        Some(points) => writeln!(f, "Tier: {} ({points} points to the next tier)", summary.tier)?,
        None => writeln!(f, "Tier: {}", summary.tier)?,
    }
    Ok(f)
}

pub fn format_point_history(history: &[PointTransaction]) -> String {
    if history.is_empty() {
        return "No point transactions".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Points", "Source", "Reference", "Created At"]);
    for t in history {
        table.add_row(row![t.id, r->t.points, t.source.to_string(), t.reference_id, t.created_at.to_string()]);
    }
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_affiliate_summary(summary: &AffiliateSummary) -> Result<String> {
    let p = &summary.profile;
    let mut f = String::new();
    writeln!(f, "Affiliate #{} ({}) for user #{}", p.id, p.affiliate_code, p.user_id)?;
    writeln!(f, "Status: {} (active: {})", p.status, p.is_active)?;
    writeln!(f, "Parent: {}", p.parent_affiliate_id.map(|id| format!("#{id}")).unwrap_or_else(|| "None".into()))?;
    writeln!(f, "Referrals: {}", p.total_referrals)?;
    writeln!(f, "Rate: {}", summary.effective_rate)?;
    if let Some(level) = &summary.current_level {
        writeln!(f, "Level: {}", level.name)?;
    }
    if let Some(level) = &summary.next_level {
        writeln!(f, "Next level: {} at {} referrals", level.name, level.min_referrals)?;
    }
    writeln!(f, "Balance:      {:>12}", p.commission_balance)?;
    writeln!(f, "Total earned: {:>12}", p.total_earned)?;
    if !summary.pending_withdrawals.is_empty() {
        writeln!(f, "Pending withdrawals:")?;
        writeln!(f, "{}", format_commission_history(&summary.pending_withdrawals))?;
    }
    Ok(f)
}

pub fn format_commission_history(history: &[CommissionTransaction]) -> String {
    if history.is_empty() {
        return "No commission transactions".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Order", "Amount", "Status", "Notes", "Created At"]);
    for t in history {
        table.add_row(row![
            t.id,
            t.order_id.map(|id| id.to_string()).unwrap_or_else(|| "withdrawal".into()),
            r->t.amount.to_string(),
            t.status.to_string(),
            t.notes.as_deref().unwrap_or_default(),
            t.created_at.to_string()
        ]);
    }
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_price(price: &ArticleServicePrice) -> String {
    let mut table = Table::new();
    table.set_titles(row!["Article", "Service type", "Service", "Pricing", "Base", "Premium", "Per kg", "Available"]);
    table.add_row(row![
        price.article_id,
        price.service_type_id,
        price.service_id,
        price.pricing_type.to_string(),
        r->price.base_price.to_string(),
        r->price.premium_price.to_string(),
        r->price.price_per_kg.map(|p| p.to_string()).unwrap_or_default(),
        price.is_available
    ]);
    markdown_style(&mut table);
    format!("{table}\n")
}
