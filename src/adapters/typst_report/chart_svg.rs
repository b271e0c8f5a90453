//! SVG charts shared by the Typst report and the web dashboard.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::ledger::EquityPoint;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

pub fn fmt_money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

fn plot_width() -> f64 {
    CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn open_svg(svg: &mut String, title: &str) {
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" text-anchor=\"end\" font-size=\"12\" fill=\"#666\">{}</text>\n",
        CHART_WIDTH, title
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
}

fn y_label(svg: &mut String, y: f64, label: &str) {
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
        MARGIN_LEFT - 5.0,
        y,
        label
    ));
}

fn date_labels(svg: &mut String, start: NaiveDate, mid: NaiveDate, end: NaiveDate) {
    for (x, date) in [
        (MARGIN_LEFT, start),
        (MARGIN_LEFT + plot_width() / 2.0, mid),
        (CHART_WIDTH - MARGIN_RIGHT, end),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            x, CHART_HEIGHT, date
        ));
    }
}

/// Equity line with a dashed reference at the starting capital.
pub fn generate_equity_svg(equity_curve: &[EquityPoint]) -> String {
    let (first, last) = match (equity_curve.first(), equity_curve.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return String::new(),
    };

    let min_equity = equity_curve
        .iter()
        .map(|p| p.equity)
        .fold(f64::INFINITY, f64::min);
    let max_equity = equity_curve
        .iter()
        .map(|p| p.equity)
        .fold(f64::NEG_INFINITY, f64::max);
    let range = (max_equity - min_equity).max(1.0);

    let x_scale = |i: usize| -> f64 {
        MARGIN_LEFT + (i as f64 / (equity_curve.len() - 1).max(1) as f64) * plot_width()
    };
    let y_scale =
        |v: f64| -> f64 { MARGIN_TOP + plot_height() - ((v - min_equity) / range) * plot_height() };

    let mut path_data = String::new();
    for (i, point) in equity_curve.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        path_data.push_str(&format!(
            "{} {:.1} {:.1}",
            cmd,
            x_scale(i),
            y_scale(point.equity)
        ));
    }

    let mid = equity_curve[equity_curve.len() / 2].date;

    let mut svg = String::new();
    open_svg(&mut svg, "Equity ($)");
    y_label(&mut svg, MARGIN_TOP + 5.0, &fmt_money(max_equity));
    y_label(
        &mut svg,
        MARGIN_TOP + plot_height() / 2.0,
        &fmt_money((max_equity + min_equity) / 2.0),
    );
    y_label(
        &mut svg,
        CHART_HEIGHT - MARGIN_BOTTOM - 5.0,
        &fmt_money(min_equity),
    );
    date_labels(&mut svg, first.date, mid, last.date);
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"#999\" stroke-dasharray=\"4 4\"/>\n",
        MARGIN_LEFT,
        y_scale(first.equity),
        CHART_WIDTH - MARGIN_RIGHT,
        y_scale(first.equity)
    ));
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"#2563eb\" stroke-width=\"2\"/>\n",
        path_data
    ));
    svg.push_str("</svg>");
    svg
}

/// One bar per trading day, green above the zero line and red below.
pub fn generate_daily_pnl_svg(daily: &BTreeMap<NaiveDate, f64>) -> String {
    let (start, end) = match (daily.keys().next(), daily.keys().next_back()) {
        (Some(start), Some(end)) => (*start, *end),
        _ => return String::new(),
    };

    let max_abs = daily.values().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1.0);
    let zero_y = MARGIN_TOP + plot_height() / 2.0;
    let half = plot_height() / 2.0;
    let slot = plot_width() / daily.len() as f64;
    let bar_width = (slot * 0.8).max(1.0);
    let mid = daily
        .keys()
        .nth(daily.len() / 2)
        .copied()
        .unwrap_or(start);

    let mut svg = String::new();
    open_svg(&mut svg, "Daily P/L ($)");
    y_label(&mut svg, MARGIN_TOP + 5.0, &fmt_money(max_abs));
    y_label(&mut svg, zero_y, "$0.00");
    y_label(
        &mut svg,
        CHART_HEIGHT - MARGIN_BOTTOM - 5.0,
        &fmt_money(-max_abs),
    );
    date_labels(&mut svg, start, mid, end);
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        zero_y,
        CHART_WIDTH - MARGIN_RIGHT,
        zero_y
    ));

    for (i, pnl) in daily.values().enumerate() {
        let height = pnl.abs() / max_abs * half;
        let x = MARGIN_LEFT + i as f64 * slot + (slot - bar_width) / 2.0;
        let (y, fill) = if *pnl >= 0.0 {
            (zero_y - height, "#16a34a")
        } else {
            (zero_y, "#dc2626")
        };
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>\n",
            x, y, bar_width, height, fill
        ));
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, equity: f64) -> EquityPoint {
        EquityPoint {
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            equity,
        }
    }

    #[test]
    fn fmt_money_groups_thousands() {
        assert_eq!(fmt_money(0.0), "$0.00");
        assert_eq!(fmt_money(1234.5), "$1,234.50");
        assert_eq!(fmt_money(-987_654.321), "-$987,654.32");
        assert_eq!(fmt_money(100.0), "$100.00");
    }

    #[test]
    fn equity_svg_empty_curve() {
        assert!(generate_equity_svg(&[]).is_empty());
    }

    #[test]
    fn equity_svg_single_point() {
        let svg = generate_equity_svg(&[point(1, 10_000.0)]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("M 70.0"));
    }

    #[test]
    fn equity_svg_multiple_points() {
        let svg = generate_equity_svg(&[
            point(1, 10_000.0),
            point(2, 10_500.0),
            point(3, 9_800.0),
        ]);
        assert_eq!(svg.matches(" L ").count(), 2);
        assert!(svg.contains("$10,500.00"));
        assert!(svg.contains("$9,800.00"));
        assert!(svg.contains("2024-04-03"));
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn daily_pnl_svg_empty() {
        assert!(generate_daily_pnl_svg(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn daily_pnl_svg_colours_bars() {
        let mut daily = BTreeMap::new();
        daily.insert(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), 250.0);
        daily.insert(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(), -100.0);
        daily.insert(NaiveDate::from_ymd_opt(2024, 4, 3).unwrap(), 0.0);
        let svg = generate_daily_pnl_svg(&daily);
        assert_eq!(svg.matches("#16a34a").count(), 2);
        assert_eq!(svg.matches("#dc2626").count(), 1);
        assert!(svg.contains("Daily P/L"));
    }
}
