// Copyright 2025 rig Authors
// SPDX-License-Identifier: Apache-2.0

//! Rig Agent CLI entry point
//!
//! Turns the host into a remotely driveable test fixture: synthetic
//! input injection and framebuffer screenshots behind a network API.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Arg, ArgAction, Command};
use log::{error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;

use rig_agent::{registry, RuntimeConfig};
use rig_input::classifier;
use rig_input::InputKind;
use rig_screen::ScreenKind;

fn main() -> ExitCode {
    let matches = Command::new("rig-agent")
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            "rig-agent makes automated testing on hardware possible without \
             physical intervention: clients inject input events and pull \
             screenshots over the network",
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .default_value("3465")
                .help("Port the network layer binds to"),
        )
        .arg(
            Arg::new("input-type")
                .short('i')
                .long("input-type")
                .value_name("TYPE")
                .default_value("uinput")
                .help("Input backend: uinput or evdev"),
        )
        .arg(
            Arg::new("screen-backend")
                .short('s')
                .long("screen-backend")
                .value_name("BACKEND")
                .default_value("kms")
                .help("Screen backend: kms or ilm"),
        )
        .arg(
            Arg::new("card")
                .short('k')
                .long("card")
                .value_name("NAME")
                .help("DRM card to probe first, e.g. card0"),
        )
        .arg(
            Arg::new("rgb")
                .short('r')
                .long("rgb")
                .action(ArgAction::SetTrue)
                .help("Treat framebuffers as RGB instead of BGR"),
        )
        .arg(
            Arg::new("guess-devices")
                .short('g')
                .long("guess-devices")
                .action(ArgAction::SetTrue)
                .help("Log the classified input devices at startup"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose logging"),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = SimpleLogger::new().with_level(log_level).init() {
        eprintln!("cannot initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    let input_name = matches.get_one::<String>("input-type").unwrap();
    let Some(input) = InputKind::from_name(input_name) else {
        error!("invalid input type given: {input_name}");
        return ExitCode::FAILURE;
    };
    let screen_name = matches.get_one::<String>("screen-backend").unwrap();
    let Some(screen) = ScreenKind::from_name(screen_name) else {
        error!("invalid screen backend selected: {screen_name}");
        return ExitCode::FAILURE;
    };
    let port: u16 = match matches.get_one::<String>("port").unwrap().parse() {
        Ok(port) => port,
        Err(e) => {
            error!("invalid port: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = RuntimeConfig::resolve(
        input,
        screen,
        matches.get_one::<String>("card").map(String::as_str),
        matches.get_flag("rgb"),
    );

    if matches.get_flag("guess-devices") {
        match &config.devices {
            Some(mappings) => classifier::show_mappings(mappings),
            None => warn!("no input devices classified; requests must carry event numbers"),
        }
    }

    registry::configure(config);
    info!(
        "starting rig-agent: input={}, screen={}, port={port}",
        input.name(),
        screen.name()
    );

    // warm the backends so the first network request does not pay for
    // device creation or engine startup
    match registry::input() {
        Ok(backend) => info!("input backend '{}' ready", rig_input::InputBackend::name(backend)),
        Err(e) => warn!("input backend unavailable: {e}"),
    }
    match registry::screen() {
        Ok(backend) => info!(
            "screen backend '{}' ready",
            rig_screen::ScreenBackend::name(backend)
        ),
        Err(e) => warn!("screen backend unavailable: {e}"),
    }

    let running = Arc::new(AtomicBool::new(true));
    let run_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || run_flag.store(false, Ordering::SeqCst)) {
        error!("cannot install signal handler: {e}");
        return ExitCode::FAILURE;
    }

    info!("rig-agent running, press Ctrl+C to stop");
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    info!("rig-agent stopped");
    ExitCode::SUCCESS
}
