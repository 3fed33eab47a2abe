//! `lanebook run` / `lanebook validate`: config-driven market allocation.

use std::path::{Path, PathBuf};

use lanebook_alloc::model::AllocResult;
use lanebook_alloc::{load_csv_legs, run_sharded, AllocConfig, AllocError};
use rust_decimal::Decimal;

use crate::exit_codes::{alloc_exit_code, EXIT_INVALID_CONFIG, EXIT_RUNTIME, EXIT_WARNINGS};
use crate::CliError;

fn alloc_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError::new(code, msg)
}

fn engine_err(err: AllocError) -> CliError {
    let code = alloc_exit_code(&err);
    let cli = alloc_err(code, err.to_string());
    if err.is_validation() {
        cli.with_hint("set validation.enabled = false to allocate unchecked input")
    } else {
        cli
    }
}

fn read_config(config_path: &Path) -> Result<AllocConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| alloc_err(EXIT_RUNTIME, format!("cannot read config: {e}")))?;
    AllocConfig::from_toml(&config_str).map_err(engine_err)
}

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
    shards: usize,
) -> Result<(), CliError> {
    if shards == 0 {
        return Err(CliError::usage("--shards must be at least 1"));
    }

    let config = read_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let input = config.input.as_deref().ok_or_else(|| {
        alloc_err(EXIT_INVALID_CONFIG, "config has no input file")
            .with_hint("add `input = \"ledger.csv\"` to the config")
    })?;
    let csv_path = base_dir.join(input);
    let csv_data = std::fs::read_to_string(&csv_path)
        .map_err(|e| alloc_err(EXIT_RUNTIME, format!("cannot read {}: {e}", csv_path.display())))?;

    let legs = load_csv_legs(&csv_data, &config.columns, &config.filter).map_err(engine_err)?;
    let result = run_sharded(&config, &legs, shards).map_err(engine_err)?;

    // Output
    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| alloc_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;

    let output_path = output_file.or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p)));
    if let Some(ref path) = output_path {
        std::fs::write(path, &json_str)
            .map_err(|e| alloc_err(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    print_summary(&result);

    if strict && !result.warnings.is_empty() {
        return Err(alloc_err(
            EXIT_WARNINGS,
            format!("{} reconciliation warning(s) (--strict)", result.warnings.len()),
        ));
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "valid: allocation '{}' (crossdock prefixes {}, input {})",
        config.name,
        config.crossdock.prefixes.join(", "),
        config.input.as_deref().unwrap_or("<none>"),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Human summary (stderr)
// ---------------------------------------------------------------------------

fn money(d: Decimal) -> String {
    d.round_dp(2).to_string()
}

fn print_summary(result: &AllocResult) {
    let s = &result.summary;
    eprintln!(
        "'{}': {} legs -> {} LTL + {} FTL shipments in {} market(s)",
        result.meta.config_name, s.input_legs, s.ltl_shipments, s.ftl_shipments, s.markets,
    );
    eprintln!(
        "discarded: {} LTL main leg(s), {} FTL order(s); {} multi-market FTL order(s) split",
        s.ltl_main_discarded, s.ftl_orders_discarded, s.multi_market_orders,
    );

    if !result.markets.is_empty() {
        eprintln!();
        eprintln!(
            "{:<6} {:>6} {:>14} {:>14} {:>14} {:>8} {:>10} {:>8}",
            "market", "ships", "revenue", "cost", "profit", "units", "cpu", "margin%"
        );
        for m in &result.markets {
            let t = &m.totals;
            eprintln!(
                "{:<6} {:>6} {:>14} {:>14} {:>14} {:>8} {:>10} {:>8}",
                t.market.as_str(),
                t.shipment_count,
                money(t.revenue),
                money(t.cost),
                money(m.profit),
                t.units,
                money(m.cost_per_unit),
                money(m.margin_pct),
            );
        }
        eprintln!(
            "{:<6} {:>6} {:>14} {:>14} {:>14} {:>8}",
            "total",
            result.shipments.len(),
            money(s.revenue),
            money(s.cost),
            money(s.revenue - s.cost),
            s.units,
        );
    }

    if !s.warning_counts.is_empty() {
        eprintln!();
        for (kind, count) in &s.warning_counts {
            eprintln!("warning: {count} x {kind}");
        }
    }
}
