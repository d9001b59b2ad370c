//! GRBL command vocabulary used by the device session, and job text
//! normalization.

/// Wakes the controller's serial parser after power-up.
pub const WAKE: &str = "\r\n\r\n";
/// Kill the alarm lock.
pub const UNLOCK: &str = "$X";
/// Run the homing cycle.
pub const HOME: &str = "$H";
pub const ABSOLUTE_MODE: &str = "G90";
pub const MILLIMETER_UNITS: &str = "G21";
/// Make the current position the logical origin.
pub const ZERO_ORIGIN: &str = "G92 X0 Y0";
pub const RETURN_TO_ORIGIN: &str = "G0 X0 Y0";

/// Strip comments and surrounding whitespace from one program line.
///
/// Drops everything after `;` and every `( ... )` comment. An unclosed `(`
/// comments out the rest of the line. Returns `None` when nothing remains.
pub fn normalize_line(line: &str) -> Option<String> {
    let code = line.split(';').next().unwrap_or_default();

    let mut out = String::with_capacity(code.len());
    let mut in_comment = false;
    for ch in code.chars() {
        match ch {
            '(' => in_comment = true,
            ')' if in_comment => in_comment = false,
            _ if !in_comment => out.push(ch),
            _ => {}
        }
    }

    let out = out.trim();
    (!out.is_empty()).then(|| out.to_string())
}

/// Sendable lines of a program body, in order.
pub fn program_lines(body: &str) -> Vec<String> {
    body.lines().filter_map(normalize_line).collect()
}
