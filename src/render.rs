//! Table presentation: row labels, amount and percentage formatting, and the
//! assembled three-column table.

use crate::keys;
use crate::model::SupplyTree;
use crate::view::ViewState;

// ANSI color codes
pub const GREEN: &str = "\x1b[32m";
pub const CYAN: &str = "\x1b[36m";
pub const RED: &str = "\x1b[31m";
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

const LABEL_WIDTH: usize = 30;
const AMOUNT_WIDTH: usize = 18;
const PERCENT_WIDTH: usize = 8;

pub fn percentage_of_total(value: f64, total_supply: f64) -> f64 {
    if total_supply <= 0.0 || value <= 0.0 {
        return 0.0;
    }
    (value / total_supply) * 100.0
}

pub fn format_percentage(percentage: f64) -> String {
    if percentage == 0.0 {
        return "0.0%".to_string();
    }
    if percentage >= 100.0 {
        return "100.0%".to_string();
    }
    format!("{:.1}%", percentage)
}

/// Whole-token amount with thousands separators.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round() as i64;
    if rounded == 0 {
        return "0".to_string();
    }
    if rounded < 0 {
        return format!("-{}", group_thousands(rounded.unsigned_abs()));
    }
    group_thousands(rounded as u64)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// One renderable row of the table, already formatted.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub key: String,
    pub label: String,
    pub amount: String,
    pub percent: String,
    pub expandable: bool,
    pub expanded: bool,
    pub is_root: bool,
}

/// Visible rows in display order. The total row always reads 100%.
pub fn table_rows(tree: &SupplyTree, view: &ViewState, total_supply: f64) -> Vec<TableRow> {
    tree.iter()
        .filter(|node| view.is_visible(&node.key, tree))
        .map(|node| {
            let percent = if node.key == "total" {
                "100.0%".to_string()
            } else {
                format_percentage(percentage_of_total(node.value, total_supply))
            };
            TableRow {
                label: keys::display_name(&node.key),
                amount: format_amount(node.value),
                percent,
                expandable: node.expandable,
                expanded: view.is_expanded(&node.key),
                is_root: node.parent.is_none(),
                key: node.key.clone(),
            }
        })
        .collect()
}

pub fn format_row(row: &TableRow) -> String {
    let marker = if row.expandable {
        if row.expanded {
            "▾ "
        } else {
            "▸ "
        }
    } else {
        "  "
    };
    let label = format!("{}{}", marker, row.label);
    let line = format!(
        "{:<label$}{:>amount$}{:>percent$}",
        label,
        row.amount,
        row.percent,
        label = LABEL_WIDTH,
        amount = AMOUNT_WIDTH,
        percent = PERCENT_WIDTH,
    );
    if row.is_root {
        format!("{}{}{}", BOLD, line, RESET)
    } else {
        line
    }
}

pub fn header() -> String {
    format!(
        "{}{}{:<label$}{:>amount$}{:>percent$}{}",
        BOLD,
        CYAN,
        "  Category",
        "ICP",
        "%",
        RESET,
        label = LABEL_WIDTH,
        amount = AMOUNT_WIDTH,
        percent = PERCENT_WIDTH,
    )
}

/// Full table as one string, used by the one-shot `show` mode.
pub fn render_table(
    tree: &SupplyTree,
    view: &ViewState,
    total_supply: f64,
    last_updated: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str(&header());
    out.push('\n');
    for row in table_rows(tree, view, total_supply) {
        out.push_str(&format_row(&row));
        out.push('\n');
    }
    match last_updated {
        Some(ts) => out.push_str(&format!("\n{}Data updated: {}{}\n", DIM, ts, RESET)),
        None => out.push_str(&format!("\n{}No snapshot loaded yet{}\n", DIM, RESET)),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_amount_formatting() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(0.4), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1_000.0), "1,000");
        assert_eq!(format_amount(244_946_282.0), "244,946,282");
        assert_eq!(format_amount(537_308_290.4), "537,308,290");
    }

    #[test]
    fn test_percentage_formatting() {
        assert_eq!(format_percentage(0.0), "0.0%");
        assert_eq!(format_percentage(100.0), "100.0%");
        assert_eq!(format_percentage(123.4), "100.0%");
        assert_eq!(format_percentage(45.584), "45.6%");
    }

    #[test]
    fn test_liquid_share_scenario() {
        let pct = percentage_of_total(244_946_282.0, 537_308_290.0);
        assert_eq!(format_percentage(pct), "45.6%");
    }

    #[test]
    fn test_percentage_of_total_degenerate_inputs() {
        assert_eq!(percentage_of_total(10.0, 0.0), 0.0);
        assert_eq!(percentage_of_total(0.0, 100.0), 0.0);
        assert_eq!(percentage_of_total(-5.0, 100.0), 0.0);
    }

    #[test]
    fn test_default_view_rows() {
        let mut values = HashMap::new();
        values.insert("total".to_string(), 1000.0);
        values.insert("liquid".to_string(), 456.0);
        let tree = SupplyTree::from_values(&values);
        let view = ViewState::new();
        let rows = table_rows(&tree, &view, 1000.0);
        // 5 roots + the level-1 children of staked, rewards and burned.
        assert_eq!(rows.len(), 15);
        assert_eq!(rows[0].key, "total");
        assert_eq!(rows[0].percent, "100.0%");
        let liquid = rows.iter().find(|r| r.key == "liquid").unwrap();
        assert_eq!(liquid.percent, "45.6%");
        assert_eq!(liquid.amount, "456");
    }

    #[test]
    fn test_expand_markers() {
        let tree = SupplyTree::from_values(&HashMap::new());
        let view = ViewState::new();
        let rows = table_rows(&tree, &view, 0.0);
        let staked = rows.iter().find(|r| r.key == "staked").unwrap();
        assert!(staked.expandable && staked.expanded);
        assert!(format_row(staked).contains("▾"));
        let unlocking = rows.iter().find(|r| r.key == "staked.unlocking").unwrap();
        assert!(unlocking.expandable && !unlocking.expanded);
        assert!(format_row(unlocking).contains("▸"));
        let liquid = rows.iter().find(|r| r.key == "liquid").unwrap();
        assert!(!liquid.expandable);
    }
}
