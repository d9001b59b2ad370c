//! GRBL error and alarm code descriptions (GRBL 1.1).

const ERRORS: &[(u8, &str)] = &[
    (1, "Expected command letter"),
    (2, "Bad number format"),
    (3, "Invalid '$' system command"),
    (4, "Negative value"),
    (5, "Homing cycle not enabled"),
    (6, "Step pulse time too short"),
    (7, "EEPROM read failed"),
    (8, "'$' command requires idle state"),
    (9, "G-code locked out during alarm or jog"),
    (10, "Soft limits require homing"),
    (11, "Line overflow"),
    (12, "Step rate too high"),
    (13, "Safety door open"),
    (14, "Build info or startup line too long"),
    (15, "Jog target exceeds machine travel"),
    (16, "Invalid jog command"),
    (17, "Laser mode requires PWM output"),
    (20, "Unsupported or invalid G-code command"),
    (21, "More than one command from a modal group"),
    (22, "Feed rate not set"),
    (23, "Command requires an integer value"),
    (24, "More than one command using axis words"),
    (25, "Repeated G-code word"),
    (26, "Missing axis words"),
    (27, "Line number out of range"),
    (28, "Missing value word"),
    (29, "G59.x work coordinates not supported"),
    (30, "G53 requires G0 or G1"),
    (31, "Unused axis words"),
    (32, "Arc has no in-plane axis word"),
    (33, "Invalid motion target"),
    (34, "Arc radius error"),
    (35, "Arc has no in-plane offset word"),
    (36, "Unused value words"),
    (37, "Tool length offset not on assigned axis"),
    (38, "Tool number exceeds maximum"),
];

const ALARMS: &[(u8, &str)] = &[
    (1, "Hard limit triggered"),
    (2, "Soft limit: target exceeds machine travel"),
    (3, "Reset while in motion, position lost"),
    (4, "Probe not in expected initial state"),
    (5, "Probe made no contact"),
    (6, "Homing failed: reset during cycle"),
    (7, "Homing failed: safety door opened"),
    (8, "Homing failed: limit switch did not clear"),
    (9, "Homing failed: limit switch not found"),
    (10, "Homing failed: dual axis switch not found"),
];

fn lookup(table: &[(u8, &'static str)], code: u8) -> Option<&'static str> {
    table
        .iter()
        .find(|(entry, _)| *entry == code)
        .map(|(_, text)| *text)
}

/// Description of a GRBL error code.
pub fn decode_error(code: u8) -> &'static str {
    lookup(ERRORS, code).unwrap_or("Unknown error")
}

/// Description of a GRBL alarm code.
pub fn decode_alarm(code: u8) -> &'static str {
    lookup(ALARMS, code).unwrap_or("Unknown alarm")
}

/// `error:n` with its description
pub fn format_error(code: u8) -> String {
    format!("error:{} ({})", code, decode_error(code))
}

/// `ALARM:n` with its description
pub fn format_alarm(code: u8) -> String {
    format!("ALARM:{} ({})", code, decode_alarm(code))
}
