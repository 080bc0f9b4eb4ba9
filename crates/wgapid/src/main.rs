use std::env;
use std::process::ExitCode;

use wgapid::provider::{InterfaceControl, WgToolProvider};
use wgapid::{Helper, parse_invocation};

fn main() -> ExitCode {
    let invocation = match parse_invocation(env::args_os()) {
        Ok(invocation) => invocation,
        Err(error) => error.exit(),
    };
    match invocation.helper {
        Some(Helper::Version) => {
            println!("WG-API Version: {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Some(Helper::ListDevices) => list_devices(),
        None => match wgapid::run_daemon(invocation.config_arguments) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("wgapid: {error}");
                ExitCode::FAILURE
            }
        },
    }
}

fn list_devices() -> ExitCode {
    match WgToolProvider::new().devices() {
        Ok(names) if names.is_empty() => {
            println!("No WireGuard devices found.");
            ExitCode::SUCCESS
        }
        Ok(names) => {
            for name in names {
                println!("{name}");
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("wgapid: could not list WireGuard devices: {error}");
            ExitCode::FAILURE
        }
    }
}
