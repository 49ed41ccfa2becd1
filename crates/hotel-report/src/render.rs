//! Plain-text and JSON rendering of an [`InsightReport`].
//!
//! Text output is a sequence of aligned tables, each with a title line and,
//! for additive measures, a highlighted TOTAL row at the bottom.

use std::fmt::Write as _;
use std::str::FromStr;

use hotel_core::error::{HotelError, Result};
use hotel_core::formatting::{format_currency, format_number, format_percent};
use hotel_data::aggregator::GroupStat;
use unicode_width::UnicodeWidthStr;

use crate::insights::InsightReport;

// ── ReportFormat ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = HotelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(HotelError::Config(format!("unknown report format {:?}", other))),
        }
    }
}

/// Render `report` in `format`.
pub fn render(report: &InsightReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => render_json(report),
    }
}

pub fn render_json(report: &InsightReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

// ── TextTable ─────────────────────────────────────────────────────────────────

/// A titled table; the first column is left-aligned, the rest right-aligned.
#[derive(Debug, Clone)]
pub struct TextTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub totals: Option<Vec<String>>,
}

impl TextTable {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            totals: None,
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in self.rows.iter().chain(self.totals.iter()) {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.width());
                }
            }
        }
        widths
    }

    /// Render the table, ending with a newline.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let rule: String = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("──");

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "{}", format_row(&self.headers, &widths));
        let _ = writeln!(out, "{}", rule);
        if self.rows.is_empty() {
            let _ = writeln!(out, "(no data)");
        }
        for row in &self.rows {
            let _ = writeln!(out, "{}", format_row(row, &widths));
        }
        if let Some(totals) = &self.totals {
            let _ = writeln!(out, "{}", rule);
            let _ = writeln!(out, "{}", format_row(totals, &widths));
        }
        out
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            let pad = " ".repeat(width.saturating_sub(cell.width()));
            if i == 0 {
                format!("{cell}{pad}")
            } else {
                format!("{pad}{cell}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

// ── Tables per insight ────────────────────────────────────────────────────────

fn occupancy_table(title: &str, key_header: &str, stats: &[GroupStat]) -> TextTable {
    let mut table = TextTable::new(title, &[key_header, "Avg occupancy", "Rows"]);
    for s in stats {
        table.push(vec![
            s.key.clone(),
            format_percent(s.value),
            format_number(s.count as f64, 0),
        ]);
    }
    table
}

fn revenue_table(title: &str, key_header: &str, stats: &[GroupStat]) -> TextTable {
    let mut table = TextTable::new(title, &[key_header, "Revenue realized", "Bookings"]);
    for s in stats {
        table.push(vec![
            s.key.clone(),
            format_currency(s.value),
            format_number(s.count as f64, 0),
        ]);
    }
    let total: f64 = stats.iter().map(|s| s.value).sum();
    let count: usize = stats.iter().map(|s| s.count).sum();
    table.totals = Some(vec![
        "TOTAL".to_string(),
        format_currency(total),
        format_number(count as f64, 0),
    ]);
    table
}

fn count_table(title: &str, key_header: &str, stats: &[GroupStat]) -> TextTable {
    let mut table = TextTable::new(title, &[key_header, "Count"]);
    for s in stats {
        table.push(vec![s.key.clone(), format_number(s.value, 0)]);
    }
    table
}

fn optional_currency(value: Option<f64>) -> String {
    value.map(format_currency).unwrap_or_else(|| "-".to_string())
}

fn pipeline_table(report: &InsightReport) -> TextTable {
    let c = &report.metadata.counts;
    let r = &report.rejections;
    let mut table = TextTable::new("Pipeline", &["Stage", "Rows", "Dropped"]);
    let mut push = |stage: &str, rows: usize, dropped: Option<usize>| {
        table.push(vec![
            stage.to_string(),
            format_number(rows as f64, 0),
            dropped.map(|d| format_number(d as f64, 0)).unwrap_or_default(),
        ]);
    };
    push("bookings loaded", c.raw_bookings, None);
    push("after guest rule", c.after_guest_rule, Some(r.guest_count));
    push("after revenue rule", c.after_revenue_rule, Some(r.revenue));
    push("aggregates loaded", c.raw_aggregates, None);
    push("capacity imputed", c.imputed_capacity, None);
    push("after capacity rule", c.after_capacity_rule, Some(r.capacity));
    push("occupancy joined", c.enriched_occupancy, Some(r.occupancy_join));
    push("bookings joined", c.enriched_bookings, Some(r.booking_join));
    table
}

/// Render every section of `report` as aligned text.
pub fn render_text(report: &InsightReport) -> String {
    let meta = &report.metadata;
    let profile = &report.profile;
    let mut out = String::new();

    let _ = writeln!(out, "Hotel booking analysis ({})", meta.generated_at);
    if let Some(bounds) = &meta.revenue_bounds {
        let _ = writeln!(
            out,
            "Revenue band ({}σ): {} .. {} (only the upper limit is applied)",
            format_number(bounds.k, 1),
            format_currency(bounds.lower()),
            format_currency(bounds.upper()),
        );
    }
    if let Some(median) = meta.capacity_median {
        let _ = writeln!(out, "Capacity median: {}", format_number(median, 1));
    }
    let _ = writeln!(out);

    let mut sections = vec![pipeline_table(report)];

    let mut overview = TextTable::new("Raw bookings", &["Measure", "Value"]);
    overview.push(vec![
        "rows".to_string(),
        format_number(profile.booking_rows as f64, 0),
    ]);
    overview.push(vec![
        "room categories".to_string(),
        profile.room_categories.join(", "),
    ]);
    overview.push(vec![
        "min revenue generated".to_string(),
        optional_currency(profile.min_revenue_generated),
    ]);
    overview.push(vec![
        "max revenue generated".to_string(),
        optional_currency(profile.max_revenue_generated),
    ]);
    overview.push(vec![
        "guests <= 0".to_string(),
        format_number(profile.non_positive_guest_rows as f64, 0),
    ]);
    overview.push(vec![
        "missing ratings".to_string(),
        format_number(profile.null_counts.ratings_given as f64, 0),
    ]);
    overview.push(vec![
        "over-capacity rows".to_string(),
        format_number(profile.over_capacity_rows.len() as f64, 0),
    ]);
    overview.push(vec![
        "missing capacity".to_string(),
        format_number(profile.null_capacity as f64, 0),
    ]);
    sections.push(overview);

    sections.push(count_table(
        "Bookings per platform",
        "Platform",
        &profile.bookings_per_platform,
    ));
    sections.push(count_table("Hotels per city", "City", &profile.hotels_by_city));

    let mut realized = TextTable::new(
        "Revenue realized diagnostic",
        &["Scope", "Mean", "Std", "Threshold", "Above"],
    );
    for t in &profile.realized_thresholds {
        realized.push(vec![
            t.scope.clone(),
            format_currency(t.mean),
            format_number(t.std, 2),
            format_currency(t.threshold),
            format_number(t.above as f64, 0),
        ]);
    }
    sections.push(realized);

    sections.push(occupancy_table(
        "Occupancy by room category",
        "Category",
        &report.occupancy_by_room_category,
    ));
    sections.push(occupancy_table(
        "Occupancy by room class",
        "Class",
        &report.occupancy_by_room_class,
    ));
    sections.push(occupancy_table("Occupancy by city", "City", &report.occupancy_by_city));
    sections.push(occupancy_table(
        "Occupancy by day type",
        "Day type",
        &report.occupancy_by_day_type,
    ));
    sections.push(occupancy_table(
        &format!("Occupancy by city in {}", report.month),
        "City",
        &report.occupancy_by_city_for_month,
    ));

    let mut append = TextTable::new("Supplementary append", &["Table", "Rows"]);
    let a = &report.append_counts;
    for (label, rows) in [
        ("before", a.before),
        ("supplementary", a.supplementary),
        ("after", a.after),
    ] {
        append.push(vec![label.to_string(), format_number(rows as f64, 0)]);
    }
    sections.push(append);

    sections.push(revenue_table("Revenue by city", "City", &report.revenue_by_city));
    sections.push(revenue_table("Revenue by month", "Month", &report.revenue_by_month));
    sections.push(revenue_table(
        "Revenue by property",
        "Property",
        &report.revenue_by_property,
    ));

    let mut ratings = TextTable::new("Average rating by city", &["City", "Rating", "Rated"]);
    for s in &report.rating_by_city {
        ratings.push(vec![
            s.key.clone(),
            format_number(s.value, 2),
            format_number(s.count as f64, 0),
        ]);
    }
    sections.push(ratings);

    sections.push(revenue_table(
        "Revenue by platform",
        "Platform",
        &report.revenue_by_platform,
    ));

    let rendered: Vec<String> = sections.iter().map(TextTable::render).collect();
    out.push_str(&rendered.join("\n"));
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{AppendCounts, RejectionCounts};
    use hotel_data::analysis::{PipelineMetadata, StageCounts};
    use hotel_data::profile::DataProfile;

    fn make_stat(key: &str, value: f64, count: usize) -> GroupStat {
        GroupStat {
            key: key.to_string(),
            value,
            count,
        }
    }

    fn make_report() -> InsightReport {
        InsightReport {
            metadata: PipelineMetadata {
                generated_at: "2022-08-01T00:00:00+00:00".to_string(),
                counts: StageCounts::default(),
                revenue_bounds: None,
                capacity_median: Some(25.0),
                load_time_seconds: 0.0,
                transform_time_seconds: 0.0,
            },
            rejections: RejectionCounts::default(),
            profile: DataProfile::default(),
            occupancy_by_room_category: vec![make_stat("RT1", 57.89, 10)],
            occupancy_by_room_class: vec![make_stat("Standard", 57.89, 10)],
            occupancy_by_city: vec![make_stat("Delhi", 61.61, 4)],
            occupancy_by_day_type: vec![make_stat("weekday", 50.9, 7)],
            month: "Jun 22".to_string(),
            occupancy_by_city_for_month: vec![],
            append_counts: AppendCounts {
                before: 10,
                supplementary: 2,
                after: 12,
            },
            revenue_by_city: vec![
                make_stat("Delhi", 1_000.0, 3),
                make_stat("Mumbai", 2_500.5, 4),
            ],
            revenue_by_month: vec![make_stat("May 22", 3_500.5, 7)],
            revenue_by_property: vec![],
            rating_by_city: vec![make_stat("Delhi", 3.78, 2)],
            revenue_by_platform: vec![],
        }
    }

    // ── format ───────────────────────────────────────────────────────────────

    #[test]
    fn test_report_format_from_str() {
        assert_eq!("text".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!(matches!(
            "xml".parse::<ReportFormat>(),
            Err(HotelError::Config(_))
        ));
    }

    // ── TextTable ────────────────────────────────────────────────────────────

    #[test]
    fn test_text_table_alignment() {
        let mut table = TextTable::new("T", &["City", "Value"]);
        table.push(vec!["Delhi".into(), "1".into()]);
        table.push(vec!["Bangalore".into(), "100".into()]);
        let text = table.render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "T");
        assert_eq!(lines[1], "City       Value");
        assert_eq!(lines[3], "Delhi          1");
        assert_eq!(lines[4], "Bangalore    100");
    }

    #[test]
    fn test_text_table_empty_and_totals() {
        let mut table = TextTable::new("Empty", &["A", "B"]);
        assert!(table.render().contains("(no data)"));
        table.totals = Some(vec!["TOTAL".into(), "0".into()]);
        assert!(table.render().lines().last().unwrap().starts_with("TOTAL"));
    }

    #[test]
    fn test_text_table_pads_by_display_width() {
        let mut table = TextTable::new("W", &["Amount", "N"]);
        table.push(vec![format_currency(5.0), "1".into()]);
        let text = table.render();
        // "₹5.00" is five columns wide even though it is more bytes.
        assert!(text.lines().nth(3).unwrap().starts_with("₹5.00   "));
    }

    // ── render ───────────────────────────────────────────────────────────────

    #[test]
    fn test_render_text_sections() {
        let text = render(&make_report(), ReportFormat::Text).unwrap();
        assert!(text.contains("Occupancy by city in Jun 22"));
        assert!(text.contains("57.89%"));
        assert!(text.contains("₹2,500.50"));
        // Revenue by city total: 1,000 + 2,500.50.
        assert!(text.contains("₹3,500.50"));
        assert!(text.contains("Capacity median: 25.0"));
    }

    #[test]
    fn test_render_json_round_trips_through_value() {
        let json = render(&make_report(), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["month"], "Jun 22");
        assert_eq!(value["append_counts"]["after"], 12);
        assert_eq!(value["revenue_by_city"][1]["key"], "Mumbai");
        assert_eq!(value["metadata"]["capacity_median"], 25.0);
    }
}
