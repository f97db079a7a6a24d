use std::sync::OnceLock;

use regex::Regex;

use crate::error::HwError;
use crate::units::grams_to_cg;

/// One successfully-decoded inbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFrame {
    pub weight_cg: i32,
    pub pressure_raw: i32,
    pub stop_switch: bool,
    pub foot_switch: bool,
}

fn pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([-+ ]*)\s*(\d+\.\d+)g\s*;(\d+);([sS]);([fF])$")
            .expect("frame regex is a fixed, known-valid pattern")
    })
}

/// Parse one LF-stripped inbound line. Malformed lines return `Err` and
/// must not be allowed to corrupt the snapshot; the caller logs and
/// discards them.
pub fn parse_line(line: &str) -> Result<ParsedFrame, HwError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = pattern()
        .captures(line)
        .ok_or_else(|| HwError::MalformedFrame(line.to_string()))?;

    let sign = caps[1].trim();
    let weight_str = &caps[2];
    let signed = format!("{sign}{weight_str}");
    let weight_g: f64 = signed
        .parse()
        .map_err(|_| HwError::MalformedFrame(line.to_string()))?;

    let pressure_raw: i32 = caps[3]
        .parse()
        .map_err(|_| HwError::MalformedFrame(line.to_string()))?;

    let stop_switch = &caps[4] == "S";
    let foot_switch = &caps[5] == "F";

    Ok(ParsedFrame {
        weight_cg: grams_to_cg(weight_g),
        pressure_raw,
        stop_switch,
        foot_switch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sample_frame() {
        let f = parse_line("+    0.00g  ;194;s;f\n").unwrap();
        assert_eq!(f.weight_cg, 0);
        assert_eq!(f.pressure_raw, 194);
        assert!(!f.stop_switch);
        assert!(!f.foot_switch);
    }

    #[test]
    fn uppercase_markers_engage() {
        let f = parse_line("-   1.23g;885;S;F").unwrap();
        assert_eq!(f.weight_cg, -123);
        assert!(f.stop_switch);
        assert!(f.foot_switch);
    }

    #[test]
    fn malformed_line_is_rejected_without_panicking() {
        assert!(parse_line("garbage\n").is_err());
        assert!(parse_line("").is_err());
    }
}
