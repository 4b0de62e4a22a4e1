// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use itertools::Itertools;
use itla_controller::decode::Frequency;
use itla_controller::default_baud_rate;
use itla_controller::messages::register::RegisterValue;
use itla_controller::messages::RegisterDescriptor;
use itla_controller::ConfigBuilder;
use itla_controller::Controller;
use itla_controller::ProtocolVersion;
use itla_controller::RegisterAddress;
use itla_controller::SerialLink;
use itla_controller::Transport;
use itla_controller::Vendor;
use slog::Drain;
use slog::Level;
use std::path::PathBuf;
use std::time::Duration;
use tabled::Table;
use tabled::Tabled;
use tokio_serial::SerialPortBuilderExt;

fn parse_log_level(s: &str) -> Result<Level, String> {
    s.parse().map_err(|_| String::from("invalid log level"))
}

/// Administer OIF-ITLA-MSA tunable laser modules.
///
/// This tool talks to a single laser over a serial port, using the MSA
/// register command protocol.
#[derive(Parser)]
#[command(version, about, long_about)]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,

    /// The serial port the laser is attached to.
    #[arg(short, long)]
    port: String,

    /// The baud rate of the serial port.
    #[arg(short, long, default_value_t = default_baud_rate())]
    baud: u32,

    /// The MSA revision the laser implements.
    #[arg(long, value_enum, default_value_t = ProtocolVersion::Msa13)]
    protocol: ProtocolVersion,

    /// The vendor of the laser.
    #[arg(long, value_enum, default_value_t = Vendor::Generic)]
    vendor: Vendor,

    /// A JSON file describing registers beyond the MSA and vendor tables.
    #[arg(long)]
    registers: Option<PathBuf>,

    /// The time to wait for each response, in milliseconds.
    #[arg(
        short,
        long,
        default_value_t = 500,
        value_parser = clap::value_parser!(u64).range(1..=10000)
    )]
    response_timeout: u64,

    /// The delay between polls of a pending operation, in milliseconds.
    #[arg(long, default_value_t = 10)]
    poll_interval: u64,

    /// The maximum number of polls of a pending operation before failing.
    ///
    /// The default is to poll until the operation completes.
    #[arg(short = 'n', long)]
    max_pending_polls: Option<usize>,

    /// The log-level.
    #[arg(
        short,
        long,
        default_value_t = Level::Info,
        value_parser = parse_log_level
    )]
    log_level: Level,
}

#[derive(Subcommand)]
enum Cmd {
    /// Read the NOP register, reporting pending operations and errors.
    Nop,

    /// Read a register, by name or address.
    Read { register: String },

    /// Write a value to a register, by name or address.
    Write {
        register: String,
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },

    /// Read every register the laser is known to implement.
    Dump,

    /// Print the identity strings of the laser.
    Identify,

    /// Print the status registers of the laser.
    Status,

    /// Enable the optical output.
    Enable {
        /// Wait for the output to report enabled.
        #[arg(short, long)]
        wait: bool,
    },

    /// Disable the optical output.
    Disable,

    /// Tune the laser to a frequency, in THz.
    ///
    /// The output must be disabled.
    SetFrequency { thz: f64 },

    /// Set the output power, in dBm.
    SetPower {
        #[arg(allow_negative_numbers = true)]
        dbm: f64,
    },

    /// Print the monitored temperatures, currents, and power.
    Monitors,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog::LevelFilter::new(drain, args.log_level).fuse();
    let log = slog::Logger::root(drain, slog::o!());

    let extra_registers = match &args.registers {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<Vec<RegisterDescriptor>>(&contents)
                .context("invalid register descriptions")?
        }
        None => Vec::new(),
    };
    let mut builder = ConfigBuilder::new(args.vendor)
        .protocol(args.protocol)
        .extra_registers(extra_registers)
        .response_timeout(Duration::from_millis(args.response_timeout));
    builder = if args.poll_interval == 0 {
        builder.no_poll_interval()
    } else {
        builder.poll_interval(Duration::from_millis(args.poll_interval))
    };
    if let Some(polls) = args.max_pending_polls {
        builder = builder.max_pending_polls(polls);
    }
    let config = builder.build()?;

    let port = tokio_serial::new(&args.port, args.baud)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .with_context(|| format!("failed to open serial port {}", args.port))?;
    let link = SerialLink::new(port, config.response_timeout);
    let controller = Controller::new(config, log, link)?;

    match args.cmd {
        Cmd::Nop => {
            let status = controller.nop().await?;
            println!("{status:?}");
        }
        Cmd::Read { register } => {
            let address = lookup(&controller, &register)?;
            let value = controller.read(address).await?;
            let descriptor = controller.profile().register(address)?;
            println!("{}: {}", descriptor.name, format_value(descriptor, &value));
        }
        Cmd::Write { register, value } => {
            let address = lookup(&controller, &register)?;
            controller.write(address, value).await?;
        }
        Cmd::Dump => dump(&controller).await,
        Cmd::Identify => {
            let ident = controller.identity().await?;
            println!("{ident}");
        }
        Cmd::Status => {
            println!("Fatal:     {:?}", controller.fatal_error(false).await?);
            println!("Warning:   {:?}", controller.warning_error(false).await?);
            println!("ResEna:    {:?}", controller.reset_enable().await?);
            println!("MCB:       {:?}", controller.module_config().await?);
            println!("Disabled:  {}", controller.is_disabled().await?);
        }
        Cmd::Enable { wait } => {
            controller.enable().await?;
            if wait {
                controller.wait_until_enabled().await?;
            }
        }
        Cmd::Disable => controller.disable().await?,
        Cmd::SetFrequency { thz } => {
            let frequency = Frequency::from_thz(thz)?;
            controller.set_frequency(frequency).await?;
            println!("Frequency: {}", controller.frequency().await?);
        }
        Cmd::SetPower { dbm } => controller.set_power(dbm).await?,
        Cmd::Monitors => {
            let monitors = controller.monitors().await?;
            let temps = controller.temperatures().await?;
            let currents = controller.currents().await?;
            println!("Temperature:  {:.2} C", monitors.temperature);
            println!("Output power: {:.2} dBm", monitors.output_power);
            println!("Frequency:    {}", controller.frequency().await?);
            println!("Age:          {}%", monitors.age);
            println!("Temperatures: {:?}", temps.0);
            println!("Currents:     {:?}", currents.0);
        }
    }
    Ok(())
}

// Resolve a register given as a name or as a decimal or hex address.
fn lookup<T: Transport>(
    controller: &Controller<T>,
    register: &str,
) -> anyhow::Result<RegisterAddress> {
    let address = match register.strip_prefix("0x") {
        Some(hex) => RegisterAddress::from_str_radix(hex, 16).ok(),
        None => register.parse().ok(),
    };
    match address {
        Some(address) => Ok(controller.profile().register(address)?.address),
        None => Ok(controller.profile().register_by_name(register)?.address),
    }
}

fn format_value(descriptor: &RegisterDescriptor, value: &RegisterValue) -> String {
    if !descriptor.extended {
        if let Some(word) = value.value() {
            return format!("{word} (0x{:04x})", word as u16);
        }
    }
    if descriptor.signed {
        return format!("[{}]", value.signed_words().join(", "));
    }
    match value.as_str() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => value.bytes.iter().map(|b| format!("{b:02x}")).join(" "),
    }
}

#[derive(Tabled)]
struct RegisterRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

async fn dump<T: Transport>(controller: &Controller<T>) {
    let descriptors = controller.profile().table().iter().cloned().collect::<Vec<_>>();
    let mut rows = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let value = match controller.read(descriptor.address).await {
            Ok(value) => format_value(&descriptor, &value),
            Err(e) => format!("error: {e}"),
        };
        rows.push(RegisterRow {
            address: format!("0x{:02x}", descriptor.address),
            name: descriptor.name.to_string(),
            value,
        });
    }
    println!("{}", Table::new(rows));
}
