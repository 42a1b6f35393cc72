use chrono::{DateTime, Utc};
use itertools::Itertools;
use rust_decimal::Decimal;
use std::fmt::Write;
use xyz_volume::{
    ComparisonReport, HistoryReport, MetricsReport,
    metrics::percentage,
    tracker::WindowWarning,
};

const WIDTH: usize = 80;

/// Most recent months shown in the monthly table.
const MONTHS_SHOWN: usize = 12;

const SHARE_BAR_WIDTH: usize = 50;

/// Format an amount with a `$B`, `$M` or `$K` suffix and two decimals.
pub fn format_currency(amount: Decimal) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    let amount = amount.abs();

    let (scaled, suffix) = if amount >= Decimal::from(1_000_000_000) {
        (amount / Decimal::from(1_000_000_000), "B")
    } else if amount >= Decimal::from(1_000_000) {
        (amount / Decimal::from(1_000_000), "M")
    } else if amount >= Decimal::from(1_000) {
        (amount / Decimal::from(1_000), "K")
    } else {
        (amount, "")
    };

    format!("{sign}${:.2}{suffix}", scaled.round_dp(2))
}

/// Render `share_pct` on a fixed width bar, saturating at 100%.
fn share_bar(share_pct: f64, width: usize) -> String {
    let filled = ((share_pct / 100.0).clamp(0.0, 1.0) * width as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn rule(out: &mut impl Write, ch: char) -> std::fmt::Result {
    writeln!(out, "{}", ch.to_string().repeat(WIDTH))
}

fn section(out: &mut impl Write, title: &str) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "{title}")?;
    rule(out, '-')
}

fn header(
    out: &mut impl Write,
    title: &str,
    report: &HistoryReport,
    timeframe: &str,
    now: DateTime<Utc>,
) -> std::fmt::Result {
    rule(out, '=')?;
    writeln!(out, "{title}")?;
    rule(out, '=')?;
    writeln!(out, "Account:    {}", report.account)?;
    writeln!(out, "Timeframe:  {timeframe}")?;
    writeln!(
        out,
        "Windows:    {} of {} fetched",
        report.windows_fetched, report.windows_planned
    )?;
    writeln!(out, "Generated:  {}", now.format("%Y-%m-%d %H:%M:%S UTC"))?;
    rule(out, '=')?;
    anomalies(out, report)
}

/// Partial run banner and page limit warnings.
fn anomalies(out: &mut impl Write, report: &HistoryReport) -> std::fmt::Result {
    if report.is_partial() {
        writeln!(out)?;
        writeln!(
            out,
            "PARTIAL REPORT: {} of {} windows failed, figures below undercount",
            report.failed_windows.len(),
            report.windows_planned
        )?;
        for failure in &report.failed_windows {
            writeln!(
                out,
                "  {} {} (attempts: {})",
                failure.window, failure.error, failure.attempts
            )?;
        }
    }

    for warning in &report.warnings {
        match warning {
            WindowWarning::PageLimitReached { window, records } => writeln!(
                out,
                "WARNING: {window} returned {records} records, the page limit; fills may be missing"
            )?,
        }
    }

    Ok(())
}

fn summary(out: &mut impl Write, metrics: &MetricsReport) -> std::fmt::Result {
    writeln!(out, "Total Volume:      {}", format_currency(metrics.total_volume))?;
    writeln!(out, "Total Trades:      {}", metrics.trade_count)?;
    writeln!(out, "Avg Trade Size:    {}", format_currency(metrics.avg_trade_size))
}

/// Render a full-history report.
pub fn history(
    out: &mut impl Write,
    report: &HistoryReport,
    now: DateTime<Utc>,
) -> std::fmt::Result {
    let timeframe = format!(
        "{} to {}",
        report.period.start.format("%Y-%m-%d"),
        report.period.end.format("%Y-%m-%d %H:%M")
    );
    header(out, "TRADE.XYZ VOLUME HISTORY", report, &timeframe, now)?;

    let metrics = &report.metrics;
    if metrics.is_empty() {
        writeln!(out)?;
        writeln!(out, "No activity: no xyz trades found in this period.")?;
        return Ok(());
    }

    section(out, "ALL-TIME STATISTICS")?;
    summary(out, metrics)?;
    let date = |time: Option<DateTime<Utc>>| {
        time.map_or_else(|| "N/A".to_string(), |time| time.format("%Y-%m-%d").to_string())
    };
    writeln!(out, "First Trade:       {}", date(metrics.first_trade))?;
    writeln!(out, "Last Trade:        {}", date(metrics.last_trade))?;
    writeln!(out, "Total Fees:        {}", format_currency(metrics.total_fees))?;
    writeln!(out, "Realized PnL:      {}", format_currency(metrics.realized_pnl))?;

    section(out, "TRADING CONSISTENCY")?;
    writeln!(out, "Days Active:       {} days", metrics.days_active)?;
    writeln!(out, "Months Active:     {}", metrics.months_active)?;
    writeln!(out, "Total Period:      {} days", metrics.total_period_days)?;
    writeln!(
        out,
        "Consistency:       {:.2}% (active days / total days)",
        metrics.consistency_pct
    )?;
    writeln!(out, "Avg Daily Volume:  {}", format_currency(metrics.avg_daily_volume))?;
    writeln!(out, "Rating:            {}", metrics.consistency)?;

    section(out, "MONTHLY VOLUME")?;
    writeln!(out, "{:<12} {:<20} {:<15}", "Month", "Volume", "% of Total")?;
    rule(out, '-')?;
    for (month, volume) in metrics.monthly_descending().take(MONTHS_SHOWN) {
        writeln!(
            out,
            "{:<12} {:<20} {:.2}%",
            month.to_string(),
            format_currency(volume),
            percentage(volume, metrics.total_volume)
        )?;
    }
    if metrics.monthly.len() > MONTHS_SHOWN {
        writeln!(out, "... and {} more months", metrics.monthly.len() - MONTHS_SHOWN)?;
    }

    section(out, "ASSET BREAKDOWN")?;
    writeln!(out, "{:<15} {:<20} {:<10} {:<12}", "Asset", "Volume", "Trades", "% of Total")?;
    rule(out, '-')?;
    for (market, asset) in metrics.assets_by_volume() {
        writeln!(
            out,
            "{:<15} {:<20} {:<10} {:.2}%",
            market.as_str(),
            format_currency(asset.volume),
            asset.trades,
            asset.share_pct
        )?;
    }

    section(out, "ELIGIBILITY ESTIMATE")?;
    writeln!(
        out,
        "Estimated Tier:    {} ({})",
        metrics.tier,
        metrics.tier.likelihood()
    )?;
    writeln!(out)?;
    writeln!(out, "NOTE: tiers are rough estimates, actual reward criteria are unknown.")?;
    rule(out, '=')
}

/// Render a short-term report with its market comparison.
pub fn comparison(
    out: &mut impl Write,
    report: &ComparisonReport,
    hours: i64,
    now: DateTime<Utc>,
) -> std::fmt::Result {
    let ComparisonReport {
        history,
        comparison,
    } = report;
    header(
        out,
        "TRADE.XYZ VOLUME TRACKER",
        history,
        &format!("Last {hours} hours"),
        now,
    )?;

    if history.metrics.is_empty() {
        writeln!(out)?;
        writeln!(out, "No activity: no xyz trades found in the last {hours} hours.")?;
        writeln!(
            out,
            "Total XYZ Market Volume (24h): {}",
            format_currency(comparison.market_volume)
        )?;
        return Ok(());
    }

    section(out, "YOUR STATS")?;
    summary(out, &history.metrics)?;

    section(out, "MARKET COMPARISON")?;
    writeln!(out, "Total XYZ Volume:  {}", format_currency(comparison.market_volume))?;
    writeln!(out, "Your Market Share: {:.4}%", comparison.share_pct)?;
    writeln!(out, "Your Rank:         {}", comparison.rank)?;
    writeln!(out)?;
    writeln!(
        out,
        "Volume Share:      [{}] {:.4}%",
        share_bar(comparison.share_pct, SHARE_BAR_WIDTH),
        comparison.share_pct
    )?;

    section(out, "BREAKDOWN BY ASSET")?;
    writeln!(
        out,
        "{:<15} {:<20} {:<20} {:<10}",
        "Asset", "Your Volume", "Market Volume", "Your %"
    )?;
    rule(out, '-')?;
    for asset in &comparison.assets {
        writeln!(
            out,
            "{:<15} {:<20} {:<20} {:.4}%",
            asset.market.as_str(),
            format_currency(asset.account_volume),
            format_currency(asset.market_volume),
            asset.share_pct
        )?;
    }
    rule(out, '=')?;

    if !comparison.untraded.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "Active XYZ markets you did not trade: {}",
            comparison.untraded.iter().join(", ")
        )?;
    }

    Ok(())
}
