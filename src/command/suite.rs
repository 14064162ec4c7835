use anyhow::{bail, Result};

use readygate::session::TestSession;
use readygate::suite::{builtin_cases, run_suite, SuiteReport};

use crate::cli::SessionArgs;

pub async fn run_smoke_suite(name: Option<String>, args: SessionArgs) -> Result<()> {
    let mut config = args.to_config();
    if let Some(name) = name {
        config = config.with_environment_name(name);
    }

    // Waiting on the gate blocks, so keep it off the async workers.
    let report = tokio::task::spawn_blocking(move || -> Result<SuiteReport> {
        let mut session = TestSession::new(config);
        session.start()?;
        run_suite(&session, &builtin_cases())
    })
    .await??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.all_passed() {
        bail!("{} case(s) failed", report.failed);
    }
    Ok(())
}

fn print_report(report: &SuiteReport) {
    println!(
        "🧪 Environment {} ({})",
        report.environment.name, report.environment.id
    );
    for outcome in &report.outcomes {
        if outcome.passed {
            println!("   ✅ {} ({}ms)", outcome.name, outcome.duration_ms);
        } else {
            println!(
                "   ❌ {}: {}",
                outcome.name,
                outcome.message.as_deref().unwrap_or("failed")
            );
        }
    }
    println!("   {} passed, {} failed", report.passed, report.failed);
}
