//! Pre-Connection Console Surface
//!
//! Line-oriented stand-in for the original single-keypress screens; runs to
//! completion before the connection attempt.

use std::io::{self, BufRead, Write};

use crate::SignalConfig;

/// Prompt for the control node address, keeping the configured default on
/// an empty line, then wait for ENTER to start.
pub fn configure(config: &mut SignalConfig) -> io::Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();

    print!(
        "Insert address of the control node [{}]:\n>> ",
        config.peer_addr
    );
    io::stdout().flush()?;
    stdin.lock().read_line(&mut line)?;
    let trimmed = line.trim();
    if !trimmed.is_empty() {
        config.peer_addr = apply_default_port(trimmed);
    }

    print!("[ ENTER ] Start application\n>> ");
    io::stdout().flush()?;
    line.clear();
    stdin.lock().read_line(&mut line)?;
    Ok(())
}

/// Accept a bare host and fall back to the standard port.
fn apply_default_port(addr: &str) -> String {
    if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{}:{}", addr, mea_protocol::DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_standard_port() {
        assert_eq!(apply_default_port("10.0.0.7"), "10.0.0.7:5480");
        assert_eq!(apply_default_port("10.0.0.7:6000"), "10.0.0.7:6000");
    }
}
