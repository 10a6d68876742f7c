//! HTML and text output of a dashboard snapshot.

use super::{bar_color, format_percentage, percentage, DashboardItem, DashboardSnapshot, ItemResult};
use crate::api::AdvCountResponse;
use crate::render::escape;
use crate::render::terminal::{pad, truncate, MAX_CELL_WIDTH};
use colored::Colorize;

fn bar(pct: f64) -> String {
    let text = format_percentage(pct);
    format!(
        "<div class=\"bar\"><div class=\"bar-fill\" style=\"width: {}%; background-color: {}\"></div><span class=\"percentage\">{}%</span></div>",
        text,
        bar_color(pct),
        text
    )
}

pub fn render_html(items: &[DashboardItem], snapshot: &DashboardSnapshot) -> String {
    let processed = snapshot.processed();
    let mut totals = String::from("<div class=\"dashboard-totals\">");
    let mut lists = String::from("<div class=\"dashboard-lists\">");

    for item in items {
        let Some(result) = snapshot.result(item.key) else {
            continue;
        };
        match result {
            ItemResult::Total(value) => totals.push_str(&format!(
                "<div class=\"dashboard-total\" data-item=\"{}\"><span class=\"label\">{}</span><span class=\"value\">{}</span>{}</div>",
                item.key,
                escape(item.label),
                value,
                bar(percentage(*value, processed))
            )),
            ItemResult::TopN(response) => lists.push_str(&render_list(item, response)),
            ItemResult::Failed(message) => {
                let target = match item.kind {
                    super::ItemKind::Total => &mut totals,
                    super::ItemKind::TopN => &mut lists,
                };
                target.push_str(&format!(
                    "<div class=\"dashboard-error\" data-item=\"{}\">{}: {}</div>",
                    item.key,
                    escape(item.label),
                    escape(message)
                ));
            }
        }
    }

    totals.push_str("</div>");
    lists.push_str("</div>");
    format!(
        "<div class=\"dashboard\" data-hours=\"{}\">{}{}</div>",
        snapshot.lookback_hours, totals, lists
    )
}

fn render_list(item: &DashboardItem, response: &AdvCountResponse) -> String {
    let mut html = format!(
        "<div class=\"dashboard-top\" data-item=\"{}\"><h3>{}</h3><ul>",
        item.key,
        escape(item.label)
    );
    for entry in &response.items {
        html.push_str(&format!(
            "<li class=\"drilldown\" data-item=\"{}\" data-key=\"{}\"><span class=\"key\">{}</span><span class=\"value\">{}</span>{}</li>",
            item.key,
            escape(&entry.key),
            escape(&entry.key),
            entry.value,
            bar(percentage(entry.value, response.total))
        ));
    }
    html.push_str("</ul></div>");
    html
}

pub fn render_text(items: &[DashboardItem], snapshot: &DashboardSnapshot) -> String {
    let processed = snapshot.processed();
    let label_width = items.iter().map(|i| i.label.len()).max().unwrap_or(0);
    let mut out = format!(
        "{}\n",
        format!("Last {} hours", snapshot.lookback_hours).bold()
    );

    for item in items {
        let Some(result) = snapshot.result(item.key) else {
            continue;
        };
        match result {
            ItemResult::Total(value) => out.push_str(&format!(
                "  {}  {:>8}  {:>6}%\n",
                pad(item.label, label_width),
                value,
                format_percentage(percentage(*value, processed))
            )),
            ItemResult::TopN(response) => {
                out.push_str(&format!("\n{}\n", item.label.cyan()));
                for entry in &response.items {
                    out.push_str(&format!(
                        "  {}  {:>8}  {:>6}%\n",
                        pad(&truncate(&entry.key, MAX_CELL_WIDTH), MAX_CELL_WIDTH),
                        entry.value,
                        format_percentage(percentage(entry.value, response.total))
                    ));
                }
            }
            ItemResult::Failed(message) => out.push_str(&format!(
                "  {}  {}\n",
                pad(item.label, label_width),
                message.red()
            )),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CountItem;
    use crate::dashboard::default_items;
    use crate::expression::DateTimeRange;

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            window: DateTimeRange::default(),
            lookback_hours: 24,
            results: vec![
                ("processed", ItemResult::Total(200)),
                ("spam", ItemResult::Total(50)),
                ("virus", ItemResult::Failed("HTTP 500".into())),
                (
                    "sender_domains",
                    ItemResult::TopN(AdvCountResponse {
                        total: 8,
                        items: vec![CountItem {
                            key: "<evil>.com".into(),
                            value: 2,
                        }],
                    }),
                ),
            ],
        }
    }

    #[test]
    fn test_html_percentages_and_drilldown() {
        let html = render_html(&default_items(), &snapshot());
        assert!(html.contains("data-item=\"spam\""));
        assert!(html.contains("<span class=\"percentage\">25.00%</span>"));
        assert!(html.contains("data-key=\"&lt;evil&gt;.com\""));
        assert!(html.contains("dashboard-error"));
        assert!(!html.contains("data-item=\"rejected\""));
    }

    #[test]
    fn test_text_output() {
        let text = render_text(&default_items(), &snapshot());
        assert!(text.contains("25.00%"));
        assert!(text.contains("<evil>.com"));
        assert!(text.contains("HTTP 500"));
    }
}
