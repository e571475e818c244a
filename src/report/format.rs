//! Formatted terminal output.
//!
//! We keep formatting code in one place so the fitting code stays free of
//! presentation concerns.

use crate::domain::{Comparable, Estimate, FitConfig, StellarSystem};
use crate::fit::{GridPointRecord, GridSearch, ResidualTable};
use crate::models::{FamilyDescriptor, FamilyRegistry};

/// Run header: subject, family, options and the best grid point.
pub fn format_run_summary(system: &StellarSystem, family: &FamilyDescriptor, search: &GridSearch, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== isofit - isochrone grid fit ===\n");
    out.push_str(&format!(
        "System: {} ({} component{})\n",
        display_name(&system.name),
        system.n_components(),
        if system.n_components() == 1 { "" } else { "s" }
    ));
    for star in system.stars() {
        out.push_str(&format!("  - {}\n", display_name(&star.name)));
    }
    out.push_str(&format!("Family: {}\n", family.name));
    out.push_str(&format!("Independent: {}\n", config.independent));
    if let Some(compare) = &config.compare {
        let names: Vec<&str> = compare.iter().map(|p| p.name()).collect();
        out.push_str(&format!("Compare: {}\n", names.join(", ")));
    }
    out.push_str(&format!(
        "Grid: {} points | scored={} | unavailable={}\n",
        search.grid_size,
        search.records.len(),
        search.unavailable.len()
    ));

    let best = search.best();
    out.push_str("\nBest fit:\n");
    out.push_str(&format!("- age   : {:.4} Gyr\n", best.age_gyr()));
    out.push_str(&format!("- [Fe/H]: {:+.2}\n", best.feh()));
    out.push_str(&format!("- [a/Fe]: {:+.2}\n", best.afe()));
    out.push_str(&format!(
        "- L     : {:.6e} (ln L = {:.4}, chi2 = {:.4})\n",
        best.likelihood.value, best.likelihood.ln_value, best.likelihood.chi_square
    ));
    out.push_str(&format!(
        "- used  : {} of {} comparisons\n",
        best.likelihood.used, best.likelihood.expected
    ));
    if best.likelihood.is_degenerate() {
        out.push_str("  ! no information: every comparison was undefined at this grid point\n");
    }
    out.push('\n');

    out
}

/// The `n` highest-likelihood grid points.
pub fn format_top(search: &GridSearch, n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("Top {} grid points:\n", n.min(search.records.len())));
    out.push_str(
        format!(
            "{:>4} {:>10} {:>7} {:>7} {:>14} {:>10} {:>6}\n",
            "rank", "age[Gyr]", "[Fe/H]", "[a/Fe]", "likelihood", "ln L", "used"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<4} {:-<10} {:-<7} {:-<7} {:-<14} {:-<10} {:-<6}", "", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for (rank, record) in search.ranked().into_iter().take(n).enumerate() {
        out.push_str(&format_top_row(rank + 1, record));
        out.push('\n');
    }
    out
}

fn format_top_row(rank: usize, record: &GridPointRecord) -> String {
    let flag = if record.likelihood.is_degenerate() { "  (no information)" } else { "" };
    format!(
        "{:>4} {:>10.4} {:>+7.2} {:>+7.2} {:>14.6e} {:>10.4} {:>3}/{:<2}{flag}",
        rank,
        record.age_gyr(),
        record.feh(),
        record.afe(),
        record.likelihood.value,
        record.likelihood.ln_value,
        record.likelihood.used,
        record.likelihood.expected,
    )
    .trim_end()
    .to_string()
}

/// Per-star comparison at one grid point.
pub fn format_residuals(residuals: &ResidualTable) -> String {
    let mut out = String::new();
    out.push_str(&format!("Residuals (independent = {}):\n", residuals.independent));
    for row in &residuals.rows {
        out.push_str(&format!("  {}\n", display_name(&row.name)));
        out.push_str(
            format!(
                "    {:<12} {:>14} {:>12} {:>10}\n",
                "quantity", "theory", "rel.error", "nsigma"
            )
            .trim_end(),
        );
        out.push('\n');
        for (var, record) in residuals.comparison_vars.iter().zip(row.records.iter()) {
            out.push_str(
                format!(
                    "    {:<12} {:>14} {:>12} {:>10}",
                    var.name(),
                    fmt_estimate(record.theory, 6),
                    fmt_estimate(record.error, 4),
                    fmt_estimate(record.nsigma, 3),
                )
                .trim_end(),
            );
            out.push('\n');
        }
    }
    out
}

/// Known families and their grid sizes.
pub fn format_families(registry: &FamilyRegistry) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<10} {:>6} {:>6} {:>6} {:>8}  {}\n", "family", "ages", "[Fe/H]", "[a/Fe]", "points", "aliases").trim_end());
    out.push('\n');
    for family in registry.iter() {
        out.push_str(
            format!(
                "{:<10} {:>6} {:>6} {:>6} {:>8}  {}",
                family.name,
                family.ages.len(),
                family.metallicities.len(),
                family.alpha_enhancements.len(),
                family.grid_size(),
                family.aliases.join(", ")
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_estimate(e: Estimate, precision: usize) -> String {
    match e {
        Estimate::Value(v) => format!("{v:.precision$}"),
        Estimate::Undefined(reason) => format!("-- ({})", short_reason(reason)),
    }
}

fn short_reason(reason: crate::domain::UndefinedReason) -> &'static str {
    use crate::domain::UndefinedReason::*;
    match reason {
        OutOfDomain => "domain",
        MissingObservation => "unset",
        MissingColumn => "column",
        SingularRatio => "singular",
        NotApplicable => "n/a",
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() { "(unnamed)" } else { name }
}
