use super::ScheduleRenderer;
use crate::domain::model::{Schedule, ScheduleBucket};
use crate::utils::error::Result;
use std::fmt::Write;

const BASE_BLUE: &str = "#40A8EA";
const BASE_GREEN: &str = "#0F9268";

/// 單一 HTML 檔案的儀表板，每個小時一張可展開的卡片
pub struct HtmlRenderer;

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn capacity_label(capacity: i64) -> String {
    if capacity > 0 {
        format!("{} Agents", capacity)
    } else {
        "Unlimited".to_string()
    }
}

fn write_head(html: &mut String) {
    html.push_str("<!DOCTYPE html><html><head><meta charset='utf-8'>");
    html.push_str("<title>Agent Scheduler</title><style>");
    html.push_str("body { font-family: 'Inter', sans-serif; background: #F8FAFC; color: #1E293B; padding: 40px; }");
    html.push_str(".container { max-width: 1000px; margin: 0 auto; }");
    let _ = write!(html, "h1 {{ color: {}; font-weight: 800; }}", BASE_BLUE);
    html.push_str(".card { background: white; border: 1px solid #E2E8F0; border-radius: 12px; margin-bottom: 12px; }");
    html.push_str("summary { padding: 20px; cursor: pointer; display: flex; justify-content: space-between; align-items: center; list-style: none; }");
    html.push_str(".badge { padding: 4px 12px; border-radius: 99px; font-size: 12px; font-weight: 600; }");
    let _ = write!(
        html,
        ".badge-ok {{ background: #DCFCE7; color: {}; }}",
        BASE_GREEN
    );
    html.push_str(".badge-warn { background: #FEE2E2; color: #EF4444; }");
    html.push_str(".table-container { padding: 0 20px 20px; border-top: 1px solid #F1F5F9; }");
    html.push_str("table { width: 100%; border-collapse: collapse; margin-top: 15px; }");
    html.push_str("th { text-align: left; font-size: 13px; color: #64748B; padding-bottom: 8px; }");
    html.push_str("td { padding: 12px 0; font-size: 14px; }");
    html.push_str(".unmet { color: #EF4444; font-weight: bold; }");
    html.push_str("</style></head><body><div class='container'>");
}

fn write_bucket(html: &mut String, bucket: &ScheduleBucket) {
    let (status_class, status_text) = if bucket.is_any_throttled() {
        ("badge-warn", "Demand Exceeded")
    } else {
        ("badge-ok", "Healthy")
    };

    html.push_str("<details class='card'><summary>");
    let _ = write!(
        html,
        "<div><strong>{} PT</strong></div><div style='color: #64748B'>Total Allocation: {}</div><div class='badge {}'>{}</div>",
        bucket.hour_label(),
        bucket.total_allocated,
        status_class,
        status_text
    );
    html.push_str("</summary><div class='table-container'><table>");
    html.push_str("<tr><th>Customer</th><th>Priority</th><th>Required</th><th>Allocated</th><th>Gap</th></tr>");

    // 以需求為準，完全沒分到的客戶也要列出
    for (customer, demand) in &bucket.demands {
        let allocated = bucket.allocation_for(customer);
        let gap = demand.saturating_sub(allocated);
        let priority = bucket
            .priority_of_customer
            .get(customer)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let (gap_class, gap_text) = if gap > 0 {
            ("unmet", format!("-{}", gap))
        } else {
            ("", "0".to_string())
        };

        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class='{}'>{}</td></tr>",
            escape_html(customer),
            priority,
            demand,
            allocated,
            gap_class,
            gap_text
        );
    }

    html.push_str("</table></div></details>");
}

impl ScheduleRenderer for HtmlRenderer {
    fn render(&self, schedule: &Schedule, capacity: i64) -> Result<String> {
        let mut html = String::new();
        write_head(&mut html);

        html.push_str("<h1>Agent Allocation Dashboard</h1>");
        let _ = write!(
            html,
            "<p>Capacity Constraint: <strong>{}</strong></p>",
            capacity_label(capacity)
        );

        if schedule.is_empty() {
            html.push_str("<p>No schedule available.</p>");
        }
        for bucket in schedule {
            write_bucket(&mut html, bucket);
        }

        html.push_str("</div></body></html>");
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttled_schedule() -> Schedule {
        let mut bucket = ScheduleBucket::empty(10);
        bucket.total_allocated = 15;
        bucket.allocations.insert("A".to_string(), 15);
        bucket.demands.insert("A".to_string(), 15);
        bucket.demands.insert("<B&Co>".to_string(), 4);
        bucket.priority_of_customer.insert("A".to_string(), 1);
        bucket.priority_of_customer.insert("<B&Co>".to_string(), 2);
        Schedule::assemble(vec![bucket])
    }

    #[test]
    fn test_dashboard_contents() {
        let html = HtmlRenderer.render(&throttled_schedule(), 15).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Capacity Constraint: <strong>15 Agents</strong>"));
        assert_eq!(html.matches("<details class='card'>").count(), 24);
        assert!(html.contains("<strong>10:00 PT</strong>"));
        assert!(html.contains("Demand Exceeded"));
        assert!(html.contains("Healthy"));
        assert!(html.contains("<td>&lt;B&amp;Co&gt;</td><td>2</td><td>4</td><td>0</td><td class='unmet'>-4</td>"));
        assert!(!html.contains("<B&Co>"));
    }

    #[test]
    fn test_unlimited_capacity_label() {
        let html = HtmlRenderer.render(&Schedule::default(), 0).unwrap();
        assert!(html.contains("Unlimited"));
        assert!(html.contains("No schedule available."));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a'b\"c"), "a&#39;b&quot;c");
    }
}
