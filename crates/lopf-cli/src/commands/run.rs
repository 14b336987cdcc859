//! `lopf run`: build, solve, report.

use anyhow::{bail, Context, Result};
use lopf_algo::{check_all, demo_case, Lopf};
use lopf_cli::{RunArgs, RunReport, Reporter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::info;

pub fn handle(args: &RunArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate().context("validating configuration")?;

    let snapshots = config.solve_snapshots();
    let Some(current) = snapshots.get(args.report_snapshot).copied() else {
        bail!(
            "--report-snapshot {} is outside the {} solved snapshots",
            args.report_snapshot,
            snapshots.len()
        );
    };

    let mut case = demo_case(&config).context("building demo network")?;
    info!(
        seed = config.random_seed,
        sub_networks = case.network.sub_networks.len(),
        "demo network ready"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    {
        let reporter = Reporter::new(&case.network);
        reporter.header(&mut out, &current)?;
        reporter.wind_series(&mut out, &case.series.wind)?;
        reporter.sub_networks(&mut out)?;
    }

    let summary = Lopf::new()
        .with_link_dispatch(config.link_dispatch)
        .solve(&mut case.network, &snapshots)
        .context("solving LOPF")?;
    writeln!(out, "\n{}", summary.summary())?;

    let reporter = Reporter::new(&case.network);
    reporter.solved_sections(&mut out, &snapshots, &current)?;

    let consistency = if args.check {
        let report = check_all(&case.network, &snapshots, config.balance_tolerance)
            .context("post-solve consistency check")?;
        writeln!(
            out,
            "\nConsistency checks passed (max imbalance {:.2e} MW, emissions {:.4} t)",
            report.max_imbalance, report.emissions
        )?;
        Some(report)
    } else {
        None
    };
    out.flush()?;

    if let Some(path) = &args.json {
        let report = RunReport::collect(&config, &case.network, &summary, consistency)?;
        let file = File::create(path)
            .with_context(|| format!("creating JSON report {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &report).context("writing JSON report")?;
        writer.flush()?;
        info!(path = %path.display(), "wrote JSON report");
    }

    Ok(())
}
