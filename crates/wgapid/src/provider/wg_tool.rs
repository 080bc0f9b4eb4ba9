//! Provider backed by the `wg(8)` command line utility.

use std::ffi::OsString;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ipnet::IpNet;
use tracing::{debug, warn};

use super::{
    Device, DeviceKind, InterfaceControl, Key, PeerChange, PeerConfig, PeerState, ProviderError,
};

const PROVIDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::provider");
const DEFAULT_PROGRAM: &str = "wg";
const DEFAULT_RUNTIME_DIR: &str = "/var/run/wireguard";
const NONE_FIELD: &str = "(none)";
const OFF_FIELD: &str = "off";
/// `wg` does not report the handshake protocol version; every current
/// implementation speaks version 1.
const PROTOCOL_VERSION: u32 = 1;

/// Drives `wg show` and `wg set`.
#[derive(Debug, Clone)]
pub struct WgToolProvider {
    program: PathBuf,
    runtime_dir: PathBuf,
}

impl Default for WgToolProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WgToolProvider {
    /// Provider using `wg` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            runtime_dir: PathBuf::from(DEFAULT_RUNTIME_DIR),
        }
    }

    /// Overrides the `wg` executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Overrides the directory where userspace implementations place their
    /// control sockets.
    #[must_use]
    pub fn with_runtime_dir(mut self, runtime_dir: impl Into<PathBuf>) -> Self {
        self.runtime_dir = runtime_dir.into();
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    fn kind_of(&self, name: &str) -> DeviceKind {
        if self.runtime_dir.join(format!("{name}.sock")).exists() {
            DeviceKind::Userspace
        } else {
            DeviceKind::LinuxKernel
        }
    }

    fn run(&self, args: &[OsString], stdin: Option<&[u8]>) -> Result<String, ProviderError> {
        debug!(target: PROVIDER_TARGET, program = %self.program.display(), ?args, "running");
        let program = self.program_name();
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProviderError::Spawn {
                program: program.clone(),
                source,
            })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            if let Err(source) = pipe.write_all(input) {
                drop(pipe);
                if let Err(error) = child.kill().and_then(|()| child.wait()) {
                    warn!(
                        target: PROVIDER_TARGET,
                        program = %program,
                        error = %error,
                        "failed to reap child after stdin write error"
                    );
                }
                return Err(ProviderError::Spawn { program, source });
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|source| ProviderError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ProviderError::Command {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        String::from_utf8(output.stdout).map_err(|error| ProviderError::Output {
            program,
            message: error.to_string(),
        })
    }
}

impl InterfaceControl for WgToolProvider {
    fn device(&self, name: &str) -> Result<Device, ProviderError> {
        let args = [OsString::from("show"), OsString::from(name), OsString::from("dump")];
        let dump = self.run(&args, None).map_err(|error| match error {
            ProviderError::Command { ref stderr, .. } if stderr.contains("No such device") => {
                ProviderError::device_not_found(name)
            }
            other => other,
        })?;
        parse_dump(name, self.kind_of(name), &dump).map_err(|message| ProviderError::Output {
            program: self.program_name(),
            message,
        })
    }

    fn configure_peer(&self, name: &str, change: &PeerChange) -> Result<(), ProviderError> {
        let (args, stdin) = set_arguments(name, change);
        self.run(&args, stdin.as_deref()).map(|_| ())
    }

    fn devices(&self) -> Result<Vec<String>, ProviderError> {
        let args = [OsString::from("show"), OsString::from("interfaces")];
        let output = self.run(&args, None)?;
        Ok(output.split_whitespace().map(str::to_owned).collect())
    }
}

/// Builds the `wg set` invocation for a change.
///
/// The preshared key travels over stdin so it never appears in the process
/// table.
fn set_arguments(name: &str, change: &PeerChange) -> (Vec<OsString>, Option<Vec<u8>>) {
    let mut args = vec![
        OsString::from("set"),
        OsString::from(name),
        OsString::from("peer"),
        OsString::from(change.public_key().to_base64()),
    ];
    match change {
        PeerChange::Remove(_) => {
            args.push(OsString::from("remove"));
            (args, None)
        }
        PeerChange::Upsert(config) => {
            let stdin = push_upsert_arguments(&mut args, config);
            (args, stdin)
        }
    }
}

fn push_upsert_arguments(args: &mut Vec<OsString>, config: &PeerConfig) -> Option<Vec<u8>> {
    let stdin = config.preshared_key.map(|key| {
        args.push(OsString::from("preshared-key"));
        args.push(OsString::from("/dev/stdin"));
        format!("{key}\n").into_bytes()
    });
    if let Some(endpoint) = config.endpoint {
        args.push(OsString::from("endpoint"));
        args.push(OsString::from(endpoint.to_string()));
    }
    if let Some(keepalive) = config.persistent_keepalive {
        args.push(OsString::from("persistent-keepalive"));
        args.push(OsString::from(keepalive.as_secs().to_string()));
    }
    if !config.allowed_ips.is_empty() {
        let ranges = config
            .allowed_ips
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        args.push(OsString::from("allowed-ips"));
        args.push(OsString::from(ranges));
    }
    stdin
}

/// Parses `wg show <name> dump` output.
///
/// The first line describes the interface (`private-key public-key
/// listen-port fwmark`); each further line describes a peer (`public-key
/// preshared-key endpoint allowed-ips latest-handshake rx tx keepalive`).
fn parse_dump(name: &str, kind: DeviceKind, dump: &str) -> Result<Device, String> {
    let mut lines = dump.lines().filter(|line| !line.trim().is_empty());
    let header = lines.next().ok_or("empty dump")?;
    let fields = header.split('\t').collect::<Vec<_>>();
    let [_private_key, public_key, listen_port, fwmark] = fields.as_slice() else {
        return Err(format!("interface line has {} fields", fields.len()));
    };

    let peers = lines.map(parse_peer).collect::<Result<Vec<_>, _>>()?;
    Ok(Device {
        name: name.to_owned(),
        kind,
        public_key: parse_key(public_key)?,
        listen_port: listen_port
            .parse()
            .map_err(|error| format!("listen port {listen_port:?}: {error}"))?,
        firewall_mark: parse_fwmark(fwmark)?,
        peers,
    })
}

fn parse_peer(line: &str) -> Result<PeerState, String> {
    let fields = line.split('\t').collect::<Vec<_>>();
    let [
        public_key,
        preshared_key,
        endpoint,
        allowed_ips,
        handshake,
        receive,
        transmit,
        keepalive,
    ] = fields.as_slice()
    else {
        return Err(format!("peer line has {} fields", fields.len()));
    };

    Ok(PeerState {
        public_key: parse_key(public_key)?,
        preshared_key: optional(preshared_key).map(parse_key).transpose()?,
        endpoint: optional(endpoint)
            .map(|text| {
                text.parse::<SocketAddr>()
                    .map_err(|error| format!("endpoint {text:?}: {error}"))
            })
            .transpose()?,
        persistent_keepalive: parse_keepalive(keepalive)?,
        last_handshake: parse_handshake(handshake)?,
        receive_bytes: parse_counter(receive)?,
        transmit_bytes: parse_counter(transmit)?,
        allowed_ips: parse_allowed_ips(allowed_ips)?,
        protocol_version: PROTOCOL_VERSION,
    })
}

fn optional(field: &str) -> Option<&str> {
    (field != NONE_FIELD && !field.is_empty()).then_some(field)
}

fn parse_key(text: &str) -> Result<Key, String> {
    Key::from_base64(text).map_err(|error| error.to_string())
}

fn parse_fwmark(text: &str) -> Result<u32, String> {
    if text == OFF_FIELD {
        return Ok(0);
    }
    let parsed = match text.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|error| format!("fwmark {text:?}: {error}"))
}

fn parse_keepalive(text: &str) -> Result<Duration, String> {
    if text == OFF_FIELD {
        return Ok(Duration::ZERO);
    }
    text.parse()
        .map(Duration::from_secs)
        .map_err(|error| format!("keepalive {text:?}: {error}"))
}

fn parse_handshake(text: &str) -> Result<Option<SystemTime>, String> {
    let seconds: u64 = text
        .parse()
        .map_err(|error| format!("handshake {text:?}: {error}"))?;
    Ok((seconds != 0).then(|| UNIX_EPOCH + Duration::from_secs(seconds)))
}

fn parse_counter(text: &str) -> Result<u64, String> {
    text.parse()
        .map_err(|error| format!("counter {text:?}: {error}"))
}

fn parse_allowed_ips(text: &str) -> Result<Vec<IpNet>, String> {
    let Some(list) = optional(text) else {
        return Ok(Vec::new());
    };
    list.split(',')
        .map(|range| {
            range
                .trim()
                .parse::<IpNet>()
                .map_err(|error| format!("allowed ip {range:?}: {error}"))
        })
        .collect()
}
