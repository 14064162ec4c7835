use anyhow::{bail, Result};

use readygate::handshake::{self, HandshakeConfig, HandshakeReport};

use crate::cli::SessionArgs;

pub async fn run_handshake(consumers: usize, use_async: bool, args: SessionArgs) -> Result<()> {
    let session = args.to_config();
    let config = HandshakeConfig {
        value: session.environment_name,
        producer_delay: session.load_delay,
        consumers,
        wait_timeout: session.wait_timeout,
    };

    let report = if use_async {
        handshake::run_async(&config).await?
    } else {
        let config = config.clone();
        tokio::task::spawn_blocking(move || handshake::run_blocking(&config)).await??
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.consistent() {
        bail!("Consumers observed different values");
    }
    Ok(())
}

fn print_report(report: &HandshakeReport) {
    println!(
        "🤝 Published {:?} after {}ms",
        report.value, report.producer_delay_ms
    );
    for o in &report.observations {
        let when = if o.published_when_started {
            "after publish"
        } else {
            "before publish"
        };
        println!(
            "   consumer {} started at {}ms ({}) -> {:?}",
            o.consumer, o.started_after_ms, when, o.value
        );
    }
    println!("   total: {}ms", report.elapsed_ms);
}
