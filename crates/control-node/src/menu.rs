//! Pre-Connection Configuration Screen
//!
//! Line-oriented stand-in for the original single-keypress menus: decoding
//! policy, maximum speed, and the sensory coding pattern. Runs to
//! completion before the simulator attach and the listener bind.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use motor_decoder::DecodingPolicy;
use proximity_scan::CodingPattern;

use crate::ControlConfig;

/// Stimulation periods under this floor are rejected as unsafe (ms).
const MIN_SAFE_PERIOD_MS: u64 = 500;

pub fn configure(config: &mut ControlConfig) -> io::Result<()> {
    let stdin = io::stdin();
    configure_from(config, &mut stdin.lock())
}

fn configure_from(config: &mut ControlConfig, input: &mut impl BufRead) -> io::Result<()> {
    loop {
        println!("\nCONFIGURATIONS:\n");
        println!("[ enter ] Start application");
        println!("[   m   ] Speed decoding method | {}", describe_policy(config));
        println!(
            "[   s   ] Maximum robot speed | {} rad/s",
            config.decoder.max_speed
        );
        println!(
            "[   e   ] External sensory input patterns | {}",
            describe_coding(config)
        );

        match prompt(input, "\nSelect an option >> ")?.as_str() {
            "" => return Ok(()),
            "m" | "M" => decoding_menu(config, input)?,
            "s" | "S" => speed_menu(config, input)?,
            "e" | "E" => patterns_menu(config, input)?,
            _ => println!("Invalid option."),
        }
    }
}

fn describe_policy(config: &ControlConfig) -> String {
    match config.decoder.policy {
        DecodingPolicy::Discrete => "Discrete commands".to_string(),
        DecodingPolicy::WinnerTakesAll { c_left, c_right } => {
            format!("Winner-Takes-All (C_L = {:.2} | C_R = {:.2})", c_left, c_right)
        }
    }
}

fn describe_coding(config: &ControlConfig) -> String {
    match config.scan.coding {
        CodingPattern::Binary => format!("Binary Coding ({} ms)", config.scan.binary_period_ms),
        CodingPattern::Proportional => {
            format!("Proportional Coding (Min: {} ms)", config.scan.min_period_ms)
        }
    }
}

fn decoding_menu(config: &mut ControlConfig, input: &mut impl BufRead) -> io::Result<()> {
    loop {
        println!("\nCONFIGURATIONS - Decoding Method\n");
        println!("[   d   ] Discrete commands (left/right)");
        println!("[   w   ] Winner-Takes-All");
        println!("[ enter ] Back");

        match prompt(input, "\nSelect an option >> ")?.as_str() {
            "d" | "D" => {
                config.decoder.policy = DecodingPolicy::Discrete;
                return Ok(());
            }
            "w" | "W" => {
                let c_left = prompt_parsed::<f32>(
                    input,
                    "Type the coefficient of the LEFT wheel and press ENTER >> ",
                )?;
                let c_right = prompt_parsed::<f32>(
                    input,
                    "Type the coefficient of the RIGHT wheel and press ENTER >> ",
                )?;
                config.decoder.policy = DecodingPolicy::WinnerTakesAll { c_left, c_right };
                return Ok(());
            }
            "" => return Ok(()),
            _ => println!("Invalid option."),
        }
    }
}

fn speed_menu(config: &mut ControlConfig, input: &mut impl BufRead) -> io::Result<()> {
    loop {
        let speed =
            prompt_parsed::<u32>(input, "Choose a speed (rad/s) and press ENTER >> ")?;
        if speed > 0 {
            config.decoder.max_speed = speed as f32;
            return Ok(());
        }
        println!("Invalid option.");
    }
}

fn patterns_menu(config: &mut ControlConfig, input: &mut impl BufRead) -> io::Result<()> {
    loop {
        println!("\nCONFIGURATIONS - External sensory input patterns\n");
        println!("[   p   ] Proportional coding");
        println!("[   b   ] Binary coding");
        println!("[ enter ] Back");

        match prompt(input, "\nSelect an option >> ")?.as_str() {
            "p" | "P" => {
                config.scan.min_period_ms = prompt_safe_period(
                    input,
                    "Choose the MINIMUM stimulation period (in milliseconds) and press ENTER >> ",
                )?;
                config.scan.coding = CodingPattern::Proportional;
                return Ok(());
            }
            "b" | "B" => {
                config.scan.binary_period_ms = prompt_safe_period(
                    input,
                    "Choose the stimulation period (in milliseconds) and press ENTER >> ",
                )?;
                config.scan.coding = CodingPattern::Binary;
                return Ok(());
            }
            "" => return Ok(()),
            _ => println!("Invalid option."),
        }
    }
}

fn prompt_safe_period(input: &mut impl BufRead, message: &str) -> io::Result<u64> {
    loop {
        let period = prompt_parsed::<u64>(input, message)?;
        if period >= MIN_SAFE_PERIOD_MS {
            return Ok(period);
        }
        println!("Period of stimulus less than {} ms is unsafe.", MIN_SAFE_PERIOD_MS);
    }
}

fn prompt_parsed<T: FromStr>(input: &mut impl BufRead, message: &str) -> io::Result<T> {
    loop {
        match prompt(input, message)?.parse() {
            Ok(value) => return Ok(value),
            Err(_) => println!("Invalid option."),
        }
    }
}

fn prompt(input: &mut impl BufRead, message: &str) -> io::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "console input closed during configuration",
        ));
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_enter_keeps_defaults() {
        let mut config = ControlConfig::default();
        configure_from(&mut config, &mut Cursor::new("\n")).unwrap();
        assert_eq!(config.decoder.policy, DecodingPolicy::Discrete);
    }

    #[test]
    fn test_select_winner_takes_all_with_coefficients() {
        let mut config = ControlConfig::default();
        configure_from(&mut config, &mut Cursor::new("m\nw\n4.5\n2.5\n\n")).unwrap();
        assert_eq!(
            config.decoder.policy,
            DecodingPolicy::WinnerTakesAll {
                c_left: 4.5,
                c_right: 2.5
            }
        );
    }

    #[test]
    fn test_speed_rejects_zero_then_accepts() {
        let mut config = ControlConfig::default();
        configure_from(&mut config, &mut Cursor::new("s\n0\nx\n20\n\n")).unwrap();
        assert_eq!(config.decoder.max_speed, 20.0);
    }

    #[test]
    fn test_binary_period_floors_at_safe_minimum() {
        let mut config = ControlConfig::default();
        configure_from(&mut config, &mut Cursor::new("e\nb\n300\n1500\n\n")).unwrap();
        assert_eq!(config.scan.coding, CodingPattern::Binary);
        assert_eq!(config.scan.binary_period_ms, 1500);
    }

    #[test]
    fn test_eof_is_an_error_not_a_hang() {
        let mut config = ControlConfig::default();
        let err = configure_from(&mut config, &mut Cursor::new("m\n")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
