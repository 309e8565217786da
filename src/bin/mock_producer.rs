//! Mock robot producer
//!
//! Streams random joint readings to a running pipeline, one JSON object per
//! line.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::Rng;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

const JOINTS: usize = 6;
const TCP_LABELS: [&str; 6] = ["fx", "fy", "fz", "tx", "ty", "tz"];

#[derive(Parser, Debug)]
#[command(name = "mock-producer")]
#[command(about = "Stream mock robot readings to a telemetry pipeline", long_about = None)]
struct Args {
    /// Pipeline address
    #[arg(default_value = "127.0.0.1:5000")]
    addr: String,

    /// Number of readings to send
    #[arg(default_value_t = 10)]
    count: u64,

    /// Pause between readings (milliseconds)
    #[arg(default_value_t = 500)]
    interval_ms: u64,

    /// Pin temp_j1 at 140 on every Nth reading (0 disables)
    #[arg(default_value_t = 0)]
    spike_every: u64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// One reading with the field names the robot logger uses
fn mock_reading(rng: &mut impl Rng, spike: bool) -> serde_json::Value {
    let mut fields = serde_json::Map::new();

    for j in 1..=JOINTS {
        let temp = if spike && j == 1 { 140.0 } else { rng.gen_range(30.0..80.0) };
        fields.insert(format!("temp_j{}", j), round2(temp).into());
    }
    for j in 1..=JOINTS {
        fields.insert(format!("joint_voltage_j{}", j), round2(rng.gen_range(20.0..48.0)).into());
    }
    fields.insert("robot_voltage".into(), round2(rng.gen_range(20.0..48.0)).into());
    for j in 1..=JOINTS {
        fields.insert(format!("effort_j{}", j), round2(rng.gen_range(0.0..100.0)).into());
    }
    fields.insert("payload".into(), round2(rng.gen_range(0.0..10.0)).into());
    for label in TCP_LABELS {
        fields.insert(format!("tcp_{}", label), round2(rng.gen_range(-50.0..50.0)).into());
    }

    serde_json::Value::Object(fields)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Args {
        addr,
        count,
        interval_ms,
        spike_every,
    } = Args::parse();

    let mut stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;
    log::info!("Connected to {}, sending {} readings", addr, count);

    let mut rng = rand::thread_rng();
    for i in 1..=count {
        let spike = spike_every > 0 && i % spike_every == 0;
        let mut line = mock_reading(&mut rng, spike).to_string();
        line.push('\n');

        stream
            .write_all(line.as_bytes())
            .await
            .context("connection lost")?;
        log::info!("Sent reading {}{}", i, if spike { " (spike)" } else { "" });

        tokio::time::sleep(Duration::from_millis(interval_ms)).await;
    }

    stream.shutdown().await.ok();
    log::info!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults_and_positionals() {
        let args = Args::try_parse_from(["mock-producer"]).unwrap();
        assert_eq!(args.addr, "127.0.0.1:5000");
        assert_eq!(args.count, 10);
        assert_eq!(args.interval_ms, 500);
        assert_eq!(args.spike_every, 0);

        let args = Args::try_parse_from(["mock-producer", "10.0.0.2:6000", "3", "50", "2"]).unwrap();
        assert_eq!(args.addr, "10.0.0.2:6000");
        assert_eq!((args.count, args.interval_ms, args.spike_every), (3, 50, 2));

        assert!(Args::try_parse_from(["mock-producer", "127.0.0.1:5000", "lots"]).is_err());
    }

    #[test]
    fn test_spike_pins_first_joint_temperature() {
        let mut rng = rand::thread_rng();
        let reading = mock_reading(&mut rng, true);
        assert_eq!(reading["temp_j1"], 140.0);
        assert_eq!(reading.as_object().unwrap().len(), 26);
    }
}
