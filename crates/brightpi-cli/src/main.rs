//! Bright Pi Control Tool
//!
//! CLI for switching, dimming and animating the Bright Pi LEDs.

mod config;

use anyhow::{ensure, Context, Result};
use brightpi_hw::registers::MAX_GAIN;
use brightpi_hw::{
    Effect, I2cDevBus, LedGroup, LedSet, LedState, MemoryBus, RegisterBus, SpecialEffects,
};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;

type Controller = SpecialEffects<Box<dyn RegisterBus>>;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliEffect {
    /// Every LED on, then off
    Flash,
    /// One white LED sweeping back and forth
    NightRider,
    /// White LEDs alternating in pairs
    Alternate,
}

impl From<CliEffect> for Effect {
    fn from(effect: CliEffect) -> Self {
        match effect {
            CliEffect::Flash => Effect::Flash,
            CliEffect::NightRider => Effect::NightRider,
            CliEffect::Alternate => Effect::Alternate,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum DemoScript {
    /// White off, infrared off, gain set, status printed
    IrOff,
    /// Reset, white off, infrared on, gain set, status printed
    IrOn,
}

#[derive(Parser)]
#[command(name = "brightpictl")]
#[command(about = "Control tool for the Bright Pi illumination board")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (default: config/default.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// I2C bus device, overrides the configuration file
    #[arg(long)]
    device: Option<String>,

    /// Slave address (e.g. 0x70), overrides the configuration file
    #[arg(long, value_parser = parse_address)]
    address: Option<u16>,

    /// Drive an in-memory register file instead of hardware
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current LED state
    Status {
        /// Print JSON instead of a status line
        #[arg(long)]
        json: bool,
    },
    /// Switch LEDs on or off
    Led {
        /// LEDs: white, ir, all, or LED numbers such as 1,2,7
        leds: String,
        /// State: on or off
        state: String,
    },
    /// Set the global gain
    Gain {
        /// Gain level (0-15)
        level: u8,
    },
    /// Set the dim level of LEDs
    Dim {
        /// LEDs: white, ir, all, or LED numbers such as 1,2,7
        leds: String,
        /// Dim level (0-63)
        level: u8,
    },
    /// Restore defaults: LEDs off, full dim level, default gain
    Reset,
    /// Switch every LED off
    Off,
    /// Light one group at full gain
    Illuminate {
        /// Group: white, ir or all
        group: String,
    },
    /// Run a light effect
    Effect {
        #[arg(value_enum)]
        effect: CliEffect,

        /// Number of cycles
        #[arg(long)]
        repetitions: Option<u32>,

        /// Frame period in milliseconds
        #[arg(long)]
        period_ms: Option<u64>,
    },
    /// Run one of the demo scripts
    Demo {
        #[arg(value_enum)]
        script: DemoScript,

        /// How long to hold the final state, in milliseconds
        #[arg(long)]
        hold_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(device) = cli.device {
        config.bus.device = device;
    }
    if let Some(address) = cli.address {
        config.bus.address = address;
    }
    if cli.simulate {
        config.bus.simulate = true;
    }

    let mut fx = open_controller(&config)?;

    match cli.command {
        Commands::Status { json } => handle_status(&fx, json)?,
        Commands::Led { leds, state } => {
            let leds: LedSet = leds.parse()?;
            let state: LedState = state.parse()?;
            fx.set_led_on_off(leds, state)?;
            println!("LEDs {} turned {}", leds, state);
        }
        Commands::Gain { level } => {
            fx.set_gain(level)?;
            println!("Gain set to: {}", level);
        }
        Commands::Dim { leds, level } => {
            let leds: LedSet = leds.parse()?;
            fx.set_led_dim(leds, level)?;
            println!("LEDs {} dimmed to: {}", leds, level);
        }
        Commands::Reset => {
            fx.reset()?;
            println!("Bright Pi reset");
        }
        Commands::Off => {
            fx.all_off()?;
            println!("LEDs turned off");
        }
        Commands::Illuminate { group } => {
            let group: LedGroup = group.parse()?;
            fx.illuminate(group)?;
            println!("Illuminating: {}", group);
        }
        Commands::Effect {
            effect,
            repetitions,
            period_ms,
        } => {
            let repetitions = repetitions.unwrap_or(config.effects.repetitions);
            let period = Duration::from_millis(period_ms.unwrap_or(config.effects.period_ms));
            run_effect(&mut fx, effect.into(), repetitions, period, interrupted()).await?;
        }
        Commands::Demo { script, hold_ms } => {
            let hold_for = Duration::from_millis(hold_ms.unwrap_or(config.demo.hold_ms));
            run_demo(&mut fx, script, config.demo.gain, hold_for, interrupted()).await?;
        }
    }

    Ok(())
}

/// Parses a slave address in decimal or `0x` hexadecimal.
fn parse_address(s: &str) -> std::result::Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    match parsed {
        Ok(address) if address <= 0x7F => Ok(address),
        Ok(address) => Err(format!("address 0x{:X} is not a 7-bit I2C address", address)),
        Err(e) => Err(format!("invalid address {:?}: {}", s, e)),
    }
}

fn open_controller(config: &Config) -> Result<Controller> {
    let bus: Box<dyn RegisterBus> = if config.bus.simulate {
        info!("Using simulated register bus");
        Box::new(MemoryBus::new())
    } else {
        Box::new(
            I2cDevBus::open(&config.bus.device, config.bus.address).with_context(|| {
                format!(
                    "Failed to open Bright Pi at {} (0x{:02X})",
                    config.bus.device, config.bus.address
                )
            })?,
        )
    };

    SpecialEffects::from_device(bus).context("Failed to read Bright Pi registers")
}

fn handle_status(fx: &Controller, json: bool) -> Result<()> {
    if json {
        let status = serde_json::to_string_pretty(&fx.status())?;
        println!("{}", status);
    } else {
        println!("{}", fx);
    }
    Ok(())
}

/// Completes on Ctrl-C. Never completes if the signal cannot be watched.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Sleeps for `duration`. Returns false if `cancel` completes first.
async fn hold<C>(duration: Duration, cancel: &mut C) -> bool
where
    C: Future<Output = ()> + Unpin,
{
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel => {
            warn!("Interrupted");
            false
        }
    }
}

async fn run_effect<B: RegisterBus>(
    fx: &mut SpecialEffects<B>,
    effect: Effect,
    repetitions: u32,
    period: Duration,
    cancel: impl Future<Output = ()>,
) -> Result<()> {
    let frames = effect.frames(repetitions, period)?;
    tokio::pin!(cancel);
    fx.start_effect(effect);

    for frame in &frames {
        fx.show_frame(frame)?;
        if !hold(frame.hold, &mut cancel).await {
            break;
        }
    }

    fx.finish_effect()?;
    println!("Effect finished: {}", effect);
    Ok(())
}

async fn run_demo<B: RegisterBus>(
    fx: &mut SpecialEffects<B>,
    script: DemoScript,
    gain: u8,
    hold_for: Duration,
    cancel: impl Future<Output = ()>,
) -> Result<()> {
    ensure!(
        gain <= MAX_GAIN,
        "Demo gain must be between 0 and {}, got {}",
        MAX_GAIN,
        gain
    );
    if let DemoScript::IrOn = script {
        fx.reset()?;
    }

    let ir = match script {
        DemoScript::IrOff => LedState::Off,
        DemoScript::IrOn => LedState::On,
    };
    fx.set_led_on_off(LedGroup::White, LedState::Off)?;
    fx.set_led_on_off(LedGroup::Ir, ir)?;
    fx.set_gain(gain)?;

    println!("{}", fx);
    tokio::pin!(cancel);
    hold(hold_for, &mut cancel).await;
    Ok(())
}
