use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use wheelrun_game::RunOutcome;

use super::policy::GameplayStrategy;
use super::simulation::RunRecord;

/// Per-strategy roll-up of simulated runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyAggregate {
    pub strategy: GameplayStrategy,
    pub runs: usize,
    pub collected: usize,
    pub gave_up: usize,
    pub collect_rate: f64,
    pub mean_final_level: f64,
    pub best_final_level: u32,
    pub mean_banked: f64,
    pub mean_spins: f64,
    pub bombs: u64,
    pub revives: u64,
    pub revive_spend: u64,
}

#[allow(clippy::cast_precision_loss)]
fn mean(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Group records by strategy, in strategy order.
#[must_use]
pub fn aggregate(records: &[RunRecord]) -> Vec<StrategyAggregate> {
    let mut groups: BTreeMap<GameplayStrategy, Vec<&RunRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.strategy).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(strategy, group)| {
            let runs = group.len();
            let collected = group
                .iter()
                .filter(|r| r.outcome == RunOutcome::Collected)
                .count();
            StrategyAggregate {
                strategy,
                runs,
                collected,
                gave_up: runs - collected,
                collect_rate: mean(collected as u64, runs),
                mean_final_level: mean(group.iter().map(|r| u64::from(r.final_level)).sum(), runs),
                best_final_level: group.iter().map(|r| r.final_level).max().unwrap_or(0),
                mean_banked: mean(group.iter().map(|r| r.banked_total).sum(), runs),
                mean_spins: mean(group.iter().map(|r| u64::from(r.spins)).sum(), runs),
                bombs: group.iter().map(|r| u64::from(r.bombs)).sum(),
                revives: group.iter().map(|r| u64::from(r.revives)).sum(),
                revive_spend: group.iter().map(|r| r.revive_spend).sum(),
            }
        })
        .collect()
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    records: &[RunRecord],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Simulation Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "=====================".cyan())?;
    writeln!(writer, "Total runs: {}", records.len())?;
    writeln!(writer)?;

    for agg in aggregates {
        writeln!(writer, "{} {}", "🎡".bold(), agg.strategy.label().bold())?;
        writeln!(
            writer,
            "   Collected: {} / Gave up: {} ({:.1}% banked)",
            agg.collected.to_string().green(),
            agg.gave_up.to_string().red(),
            agg.collect_rate * 100.0
        )?;
        writeln!(
            writer,
            "   Mean level: {:.1} (best {})",
            agg.mean_final_level, agg.best_final_level
        )?;
        writeln!(
            writer,
            "   Mean banked: {:.1}  Mean spins: {:.1}",
            agg.mean_banked, agg.mean_spins
        )?;
        writeln!(
            writer,
            "   Bombs: {}  Revives: {}  Revive spend: {}",
            agg.bombs, agg.revives, agg.revive_spend
        )?;
        writeln!(writer)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    aggregates: &'a [StrategyAggregate],
    runs: &'a [RunRecord],
}

pub fn generate_json_report<W: Write + ?Sized>(
    writer: &mut W,
    records: &[RunRecord],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    let report = JsonReport {
        aggregates,
        runs: records,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    writeln!(writer, "# Wheelrun Simulation Results")?;
    writeln!(writer)?;
    if aggregates.is_empty() {
        writeln!(writer, "_No runs simulated._")?;
        return Ok(());
    }
    writeln!(
        writer,
        "| Strategy | Runs | Collected | Gave up | Mean level | Best | Mean banked | Revives |"
    )?;
    writeln!(writer, "|---|---|---|---|---|---|---|---|")?;
    for agg in aggregates {
        writeln!(
            writer,
            "| {} | {} | {} | {} | {:.1} | {} | {:.1} | {} |",
            agg.strategy,
            agg.runs,
            agg.collected,
            agg.gave_up,
            agg.mean_final_level,
            agg.best_final_level,
            agg.mean_banked,
            agg.revives
        )?;
    }
    Ok(())
}
