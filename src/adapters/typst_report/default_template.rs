//! Built-in Typst dashboard template.
//!
//! Custom templates may use any subset of the same `{{PLACEHOLDER}}` markers.

pub const PLACEHOLDERS: [&str; 10] = [
    "ACCOUNT_SUMMARY",
    "STATS_TABLE",
    "RISK_TABLE",
    "STREAKS_TABLE",
    "ACHIEVEMENTS",
    "EQUITY_CURVE_SVG",
    "INSTRUMENT_TABLE",
    "FLAG_TABLE",
    "TRADE_LOG",
    "MONTHLY_PNL",
];

pub fn template() -> &'static str {
    DEFAULT_TEMPLATE
}

const DEFAULT_TEMPLATE: &str = r#"#set page(paper: "a4", margin: (x: 1.5cm, y: 2cm), numbering: "1")
#set text(font: "Linux Libertine", size: 10pt)
#set table(stroke: 0.5pt + luma(200), inset: 5pt)
#show heading.where(level: 1): set text(size: 18pt)

= Trading Journal

{{ACCOUNT_SUMMARY}}

== Performance

#grid(
  columns: (1fr, 1fr),
  gutter: 12pt,
  [
    === Statistics
    {{STATS_TABLE}}
  ],
  [
    === Risk Plan
    {{RISK_TABLE}}

    === Streaks
    {{STREAKS_TABLE}}
  ],
)

== Equity Curve

{{EQUITY_CURVE_SVG}}

== Monthly P/L

{{MONTHLY_PNL}}

== Instruments

{{INSTRUMENT_TABLE}}

== Risk Rule Breaches

{{FLAG_TABLE}}

== Achievements

{{ACHIEVEMENTS}}

#pagebreak()

== Trade Log

{{TRADE_LOG}}
"#;
