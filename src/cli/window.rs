//! Voting window parsing for `propose --window`.

/// Parse a human-readable voting window to seconds.
///
/// Accepts plain seconds ("300") and humantime formats ("5m", "1 hour",
/// "7d"). Bounds are enforced by the engine, not here.
pub fn parse_window_secs(input: &str) -> Result<u32, String> {
    let input = input.trim();
    if let Ok(secs) = input.parse::<u32>() {
        return Ok(secs);
    }

    let duration = humantime::parse_duration(input)
        .map_err(|e| format!("Invalid voting window '{}': {}", input, e))?;
    u32::try_from(duration.as_secs())
        .map_err(|_| format!("Voting window '{}' is too long", input))
}
