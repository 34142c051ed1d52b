//! Human-readable reports.

use colored::Colorize;
use indicatif::HumanBytes;
use neomirror_core::{ContentClass, Discovery, MirrorReport, SizeReport};

fn fallback_notice(discovery: &Discovery) -> Option<String> {
    discovery.is_fallback().then(|| {
        format!(
            "{} no source could be read; listing the homepage guesses only",
            "warning:".yellow().bold()
        )
    })
}

/// Classified URL listing for `discover`.
pub fn discovery(discovery: &Discovery) -> String {
    let set = &discovery.set;
    let stats = &discovery.stats;
    let mut lines = Vec::new();

    lines.extend(fallback_notice(discovery));
    lines.push(format!(
        "{} {} URLs on {} ({} pages, {} assets)",
        "Found".green().bold(),
        set.len(),
        set.origin().to_string().bold(),
        set.count(ContentClass::Page),
        set.count(ContentClass::Asset),
    ));
    lines.push(format!(
        "  sitemap {}, homepage {}, crawl {} ({} levels, {} pages failed)",
        stats.from_sitemap,
        stats.from_homepage,
        stats.from_crawl,
        stats.levels_walked,
        stats.pages_failed,
    ));
    lines.push(String::new());
    for record in set {
        let class = match record.class {
            ContentClass::Page => "page ".cyan(),
            ContentClass::Asset => "asset".magenta(),
            ContentClass::Unknown => "?    ".dimmed(),
        };
        lines.push(format!("  {class}  {}", record.url));
    }
    lines.join("\n")
}

/// Totals and largest files for `size`.
pub fn size(discovery: &Discovery, report: &SizeReport, top: usize, default_size: u64) -> String {
    let set = &discovery.set;
    let mut lines = Vec::new();

    lines.extend(fallback_notice(discovery));
    lines.push(format!(
        "{} {} across {} URLs on {}",
        "Total:".green().bold(),
        HumanBytes(report.total_bytes()).to_string().bold(),
        report.len(),
        set.origin().to_string().bold(),
    ));
    lines.push(format!(
        "  pages   {:>5}  {}",
        set.count(ContentClass::Page),
        HumanBytes(report.total_for(ContentClass::Page)),
    ));
    lines.push(format!(
        "  assets  {:>5}  {}",
        set.count(ContentClass::Asset),
        HumanBytes(report.total_for(ContentClass::Asset)),
    ));
    if report.defaulted_count() > 0 {
        lines.push(format!(
            "  {} sizes unknown, counted as {} each",
            report.defaulted_count().to_string().yellow(),
            HumanBytes(default_size),
        ));
    }

    let largest = report.top(top);
    if !largest.is_empty() {
        lines.push(String::new());
        lines.push("Largest files:".bold().to_string());
        for (rank, entry) in largest.iter().enumerate() {
            let marker = if entry.defaulted { "*" } else { " " };
            lines.push(format!(
                "  {:>3}. {:>10}{marker} {}",
                rank + 1,
                HumanBytes(entry.bytes).to_string(),
                entry.url,
            ));
        }
    }
    lines.join("\n")
}

/// Fetch and reconciliation summary for `mirror`.
pub fn mirror(discovery: &Discovery, report: &MirrorReport) -> String {
    let outcomes = &report.outcomes;
    let sweep = &report.reconcile.sweep;
    let final_pass = &report.reconcile.final_pass;
    let mut lines = Vec::new();

    lines.extend(fallback_notice(discovery));
    lines.push(format!(
        "{} {} into {}",
        "Mirrored".green().bold(),
        discovery.set.origin().to_string().bold(),
        report.root.display(),
    ));
    let failed = if outcomes.failed_count() > 0 {
        outcomes.failed_count().to_string().red().bold()
    } else {
        outcomes.failed_count().to_string().normal()
    };
    lines.push(format!(
        "  fetched {} files ({}), failed {failed}",
        outcomes.fetched_count(),
        HumanBytes(outcomes.fetched_bytes()),
    ));
    lines.push(format!(
        "  inner pages: {} scanned, {} missing assets queued, {} fetched",
        sweep.pages_scanned, sweep.queued, sweep.fetched,
    ));
    if final_pass.homepage_reachable {
        lines.push(format!(
            "  homepage links: {} checked, {} missing, {} fetched",
            final_pass.checked, final_pass.missing, final_pass.fetched,
        ));
    } else {
        lines.push(format!(
            "  homepage links: {}",
            "homepage unreachable, final check skipped".yellow()
        ));
    }

    if outcomes.failed_count() > 0 {
        lines.push(String::new());
        lines.push("Failed:".red().bold().to_string());
        for (url, reason) in outcomes.failures() {
            lines.push(format!("  {url}  {}", reason.dimmed()));
        }
    }

    let elapsed = (report.finished_at - report.started_at)
        .to_std()
        .unwrap_or_default();
    lines.push(format!("Finished in {:.1}s", elapsed.as_secs_f64()));
    lines.join("\n")
}
