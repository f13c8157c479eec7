use clap::Parser;
use hbridge_core::utils::controllers::{
    parse_command, BridgeController, BridgeSettings, EnablePolicy, FloatOutput, HBridgeConfig,
    SharedHBridge, BRIDGE_CHANNEL,
};
use std::io::BufRead;
use tracing::{error, info, warn};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// Commands with |output| at or below this value coast the bridge
    #[clap(long, default_value_t = 0.0)]
    deadband: f32,
    /// hold the enable output high even while stopped
    #[clap(long)]
    always_on: bool,
    /// run without an enable output
    #[clap(long)]
    no_enable: bool,
    /// command applied once at startup
    #[clap(long, allow_hyphen_values = true)]
    output: Option<f32>,
}

/// Output that logs every level it is driven to.
struct ConsoleOutput {
    name: &'static str,
}

impl FloatOutput for ConsoleOutput {
    fn set_level(&mut self, level: f32) {
        info!("{}: {:.3}", self.name, level);
    }
}

fn run<E: FloatOutput>(opts: &Opts, config: HBridgeConfig<ConsoleOutput, ConsoleOutput, E>) {
    let bridge = match SharedHBridge::new(config) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("H-bridge configuration failed: {}", e);
            std::process::exit(1);
        }
    };
    bridge.with(|b| b.log_config());

    if let Some(output) = opts.output {
        info!("Applying startup output {}", output);
        bridge.set_output(output);
    }

    // Commands arrive one JSON object per line, e.g. {"bc":"set_output","output":0.4}
    let controller = BridgeController::new(&bridge, &BRIDGE_CHANNEL);
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("stdin read failed: {:?}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = parse_command(line.as_bytes()) {
            if BRIDGE_CHANNEL.try_send(command).is_err() {
                warn!("Command queue full, dropping {:?}", command);
            }
        }
        controller.poll_commands();
    }

    info!("Input closed, stopping bridge");
    bridge.set_output(0.0);
    info!("Final state: {:?}", bridge.state());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts: Opts = Opts::parse();
    let settings = BridgeSettings {
        enable_policy: if opts.always_on {
            EnablePolicy::AlwaysOn
        } else {
            EnablePolicy::TrackMagnitude
        },
        deadband: opts.deadband,
    };
    let config = HBridgeConfig::new()
        .output_a(ConsoleOutput { name: "output_a" })
        .output_b(ConsoleOutput { name: "output_b" })
        .settings(settings);

    if opts.no_enable {
        run(&opts, config);
    } else {
        run(&opts, config.output_enable(ConsoleOutput { name: "output_enable" }));
    }
}
