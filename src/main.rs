//! evmux - input event monitor for Linux console
//!
//! Discovers evdev devices, reports keys already held down, then prints
//! every event (after remapping) until interrupted.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};

use evmux::config::{self, Config};
use evmux::input::keycodes::{event_type_name, key_name, EV_KEY};
use evmux::{DescriptorId, EvdevDevice, EventMux, InputError, InputEvent, Ready};

fn print_help() {
    println!(
        r#"evmux {} - evdev input multiplexer and event monitor

USAGE:
    evmux [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --timeout=MS            Exit after MS milliseconds without input (default: wait forever)
    --count=N               Exit after N events
    --device=TAG            Device tag for remap lookup (overrides DEVICE= on the kernel command line)
    --extra=PATH            Also monitor PATH as an extra descriptor (repeatable)
    --no-sync               Do not report keys already held down at startup
    --no-remap              Disable .keys remapping
    --init-config           Write the default config file
    -f, --force             Overwrite config file without confirmation

CONFIG FILE:
    ~/.config/evmux/config.toml   (or EVMUX_CONFIG, or /etc/evmux/config.toml)

REMAP FILES:
    /sdcard/devices/<TAG>/<NAME>.keys
    /sdcard/devices/.input/Vendor_XXXX_Product_YYYY[_Version_ZZZZ].keys
    /sdcard/devices/.input/<NAME>_<TAG>.keys, <NAME>.keys, Generic.keys
    (then the same names under /res/input)

ENVIRONMENT:
    RUST_LOG=debug          Show discovery and remap search details
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Value of a `--name=value` argument
fn arg_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .filter_map(|a| a.strip_prefix(name))
        .filter_map(|rest| rest.strip_prefix('='))
        .last()
}

fn format_event(id: DescriptorId, event: &InputEvent) -> String {
    let ty = event_type_name(event.type_)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:04x}", event.type_));
    let name = if event.type_ == EV_KEY {
        key_name(event.code)
    } else {
        None
    };
    let code = match name {
        Some(name) => name.to_string(),
        None => format!("{:04x}", event.code),
    };
    format!(
        "[{:>6}.{:06}] {:<6} {:<8} {:<16} {}",
        event.time.tv_sec, event.time.tv_usec, id, ty, code, event.value
    )
}

fn init_config(force: bool) -> Result<()> {
    let path = config::default_config_path()
        .ok_or_else(|| anyhow!("Cannot determine config directory"))?;
    if path.exists() && !force {
        println!("Config file already exists: {}", path.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }
    let path = Config::write_default_config(&path)?;
    println!("Config written: {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Check command line arguments
    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("evmux {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.iter().any(|a| a == "--init-config") {
        let force = args.iter().any(|a| a == "--force" || a == "-f");
        return init_config(force);
    }

    let timeout_ms: i32 = match arg_value(&args, "--timeout") {
        Some(v) => v.parse().with_context(|| format!("Invalid --timeout: {}", v))?,
        None => -1,
    };
    let max_events: Option<u64> = arg_value(&args, "--count")
        .map(|v| v.parse().with_context(|| format!("Invalid --count: {}", v)))
        .transpose()?;
    let sync = !args.iter().any(|a| a == "--no-sync");

    let mut config = Config::load();
    if let Some(tag) = arg_value(&args, "--device") {
        config.input.device_tag = Some(tag.to_string());
    }
    if args.iter().any(|a| a == "--no-remap") {
        config.remap.enabled = false;
    }

    info!("evmux starting...");

    let seen = Rc::new(Cell::new(0u64));
    let counter = seen.clone();
    let print_ready = move |ready: &mut Ready<'_>| match ready.read_event() {
        Ok(event) => {
            println!("{}", format_event(ready.id(), &event));
            counter.set(counter.get() + 1);
        }
        Err(e) => debug!("{}: {}", ready.id(), e),
    };

    let mut mux = EventMux::new(&config);
    let devices = mux.initialize(print_ready.clone());

    for path in args.iter().filter_map(|a| a.strip_prefix("--extra=")) {
        let device = EvdevDevice::open(Path::new(path))
            .with_context(|| format!("Cannot open extra descriptor {}", path))?;
        let id = mux.register_extra(device, print_ready.clone())?;
        info!("{} registered as {}", path, id);
    }

    if mux.is_empty() {
        return Err(anyhow!(
            "No input devices found. Check permissions for {}/event*.",
            config.input.device_dir.display()
        ));
    }
    println!("{} devices, {} extra descriptors", devices, mux.misc_count());

    if sync {
        mux.sync_key_state(|code, pressed| {
            let name = key_name(code)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{:04x}", code));
            println!("held   {:<16} {}", name, pressed as i32);
        });
    }

    loop {
        match mux.wait(timeout_ms) {
            Ok(_) => {
                mux.dispatch();
            }
            Err(InputError::Timeout) => {
                info!("No input for {}ms", timeout_ms);
                break;
            }
            Err(InputError::Poll(e)) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("wait failed: {}", e);
                return Err(e.into());
            }
        }

        if max_events.is_some_and(|max| seen.get() >= max) {
            break;
        }
    }

    mux.teardown();
    Ok(())
}
