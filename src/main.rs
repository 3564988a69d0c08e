use clap::Parser;
use dialoguer::Select;
use midibridge::{
    cli::{device_names, finish_session, validate_port, Args},
    config::{parse_log_level, BridgeConfig},
    logging,
    midi::{DefaultMidiBackend, MidiBackend},
    ui::run_monitor,
    BridgeError, ChannelHub, ChannelId, SessionManager,
};
use std::sync::Arc;
use std::time::Duration;

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> midibridge::Result<()> {
    let mut config = BridgeConfig::load(args.config.as_deref())?;
    if let Some(level) = &args.log_level {
        config.log_level = parse_log_level(level)?;
    }
    initialize_logging(&config);

    let backend = create_backend(&config);
    let devices = device_names(&backend);

    if args.device_list {
        list_available_devices(&devices);
        return Ok(());
    }

    if let Some(index) = args.capabilities {
        return print_capabilities(&backend, index);
    }

    let port = match args.port {
        Some(port) => port,
        None => select_port(&devices)?,
    };
    validate_port(port, &devices).map_err(BridgeError::InvalidPort)?;

    monitor(
        backend,
        &config,
        port,
        ChannelId(args.channel),
        args.duration.map(Duration::from_secs),
    )
}

fn initialize_logging(config: &BridgeConfig) {
    // The monitor still works without a log file.
    match logging::init_logger(&config.log_dir, config.log_level) {
        Ok(()) => log::info!("Application starting"),
        Err(e) => eprintln!("Warning: {}", e),
    }
}

#[cfg(not(feature = "test-mock"))]
fn create_backend(config: &BridgeConfig) -> DefaultMidiBackend {
    DefaultMidiBackend::new(config.client_name.clone())
}

#[cfg(feature = "test-mock")]
fn create_backend(_config: &BridgeConfig) -> DefaultMidiBackend {
    DefaultMidiBackend::default()
}

fn list_available_devices(devices: &[String]) {
    println!("Available MIDI input devices:");
    for (index, device) in devices.iter().enumerate() {
        println!("  {}: {}", index, device);
    }
}

fn print_capabilities<B: MidiBackend>(backend: &B, index: u32) -> midibridge::Result<()> {
    let caps = backend
        .device_capabilities(index)
        .map_err(|status| BridgeError::InvalidPort(format!("device {}: {}", index, status)))?;

    println!("Device {}:", index);
    println!("  name:            {}", caps.name);
    println!("  manufacturer id: {:#06x}", caps.manufacturer_id);
    println!("  product id:      {:#06x}", caps.product_id);
    println!(
        "  driver version:  {}.{}",
        caps.driver_version >> 8,
        caps.driver_version & 0xFF
    );
    Ok(())
}

fn select_port(devices: &[String]) -> midibridge::Result<u32> {
    if devices.is_empty() {
        return Err(BridgeError::InvalidPort(
            "no MIDI input devices available".to_string(),
        ));
    }

    let selection = Select::new()
        .with_prompt("Select a MIDI input port")
        .items(devices)
        .default(0)
        .interact()?;
    Ok(selection as u32)
}

fn monitor<B: MidiBackend>(
    backend: B,
    config: &BridgeConfig,
    port: u32,
    channel: ChannelId,
    duration: Option<Duration>,
) -> midibridge::Result<()> {
    let hub = ChannelHub::new();
    let events = hub.subscribe(channel);
    let manager =
        SessionManager::with_instance_tag(backend, Arc::new(hub.clone()), config.instance_tag);

    let status = manager.open(port, channel);
    if !status.is_ok() {
        manager.close(port);
        return Err(BridgeError::InvalidPort(format!(
            "failed to open port {}: {}",
            port, status
        )));
    }

    let status = manager.start(port);
    if !status.is_ok() {
        manager.close(port);
        return Err(BridgeError::InvalidPort(format!(
            "failed to start port {}: {}",
            port, status
        )));
    }

    println!("Monitoring port {} on channel {}. Press Ctrl+C to exit...", port, channel);
    run_monitor(port, &events, duration);

    let finished = finish_session(&manager, port);
    hub.unsubscribe(channel);
    finished
}
