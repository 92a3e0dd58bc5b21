//! Frame-rate normalization and timecode parsing.
//!
//! Rates stored in a container are `rate / scale` ratios and often carry
//! rounding error (29.969999 instead of 30000/1001). Measured rates close to
//! a broadcast rate are snapped onto it; anything else is left alone.

use crate::{Error, Result};

/// Common denominator for the rate table.
const DENOMINATOR: f64 = 1_001_000.0;

/// Well-known rates as numerators over [`DENOMINATOR`].
const COMMON_RATES: [u64; 8] = [
    24_000_000, // 23.976
    24_024_000, // 24
    25_025_000, // 25
    30_000_000, // 29.97
    30_030_000, // 30
    50_050_000, // 50
    60_000_000, // 59.94
    60_060_000, // 60
];

/// Maximum numerator distance for snapping.
const TOLERANCE: f64 = 900.0;

/// Exact value of the NTSC 29.97 rate.
pub const EXACT_29_97: f64 = 30_000_000.0 / DENOMINATOR;

/// Snap a measured rate onto the nearest well-known rate.
///
/// Rates outside the table envelope, or farther than the tolerance from
/// every entry, are returned unchanged.
pub fn normalize_frame_rate(fps: f64) -> f64 {
    let min = (COMMON_RATES[0] as f64 - TOLERANCE) / DENOMINATOR;
    let max = (COMMON_RATES[COMMON_RATES.len() - 1] as f64 + TOLERANCE) / DENOMINATOR;
    if !(min..=max).contains(&fps) {
        return fps;
    }

    let scaled = fps * DENOMINATOR;
    let (nearest, diff) = COMMON_RATES
        .iter()
        .map(|&n| (n, (n as f64 - scaled).abs()))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });

    if diff <= TOLERANCE {
        nearest as f64 / DENOMINATOR
    } else {
        fps
    }
}

/// Express a rate as a reduced `(rate, scale)` pair for a stream header.
///
/// Table rates map to their exact ratio (29.97 -> 30000/1001); other rates
/// are kept to millihertz precision.
pub fn frame_rate_to_ratio(fps: f64) -> Result<(u32, u32)> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(Error::InvalidFrameRate(fps));
    }

    let normalized = normalize_frame_rate(fps);
    let exact = COMMON_RATES
        .iter()
        .find(|&&n| n as f64 / DENOMINATOR == normalized);
    let (num, den) = match exact {
        Some(&n) => (n, DENOMINATOR as u64),
        None => ((fps * 1000.0).round() as u64, 1000),
    };
    if num == 0 {
        return Err(Error::InvalidFrameRate(fps));
    }

    let divisor = gcd(num, den);
    let rate = u32::try_from(num / divisor).map_err(|_| Error::InvalidFrameRate(fps))?;
    Ok((rate, (den / divisor) as u32))
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Parse a timecode into a frame number.
///
/// Accepts up to four components (`hh:mm:ss:ff`, right-aligned, so `ss:ff`
/// and `ff` work too) separated by `:`, `;` or `.`; empty components count as
/// zero. A leading `-` negates the result.
///
/// `drop_frame` forces the convention; `None` auto-detects drop-frame at
/// 29.97 when the frames separator is `;` or `.`.
pub fn parse_timecode(timecode: &str, fps: f64, drop_frame: Option<bool>) -> Result<i64> {
    let fps = normalize_frame_rate(fps);

    let trimmed = timecode.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if body.is_empty() {
        return Err(Error::invalid_timecode(format!("empty timecode {timecode:?}")));
    }

    let is_separator = |c: char| matches!(c, ':' | ';' | '.');
    let components: Vec<&str> = body.split(is_separator).collect();
    if components.len() > 4 {
        return Err(Error::invalid_timecode(format!(
            "too many components in {timecode:?}"
        )));
    }
    let frames_separator = body.chars().rfind(|&c| is_separator(c));

    let drop_frame = drop_frame.unwrap_or_else(|| {
        fps == EXACT_29_97 && matches!(frames_separator, Some(';') | Some('.'))
    });
    let reference = if drop_frame { 30.0 } else { fps };

    // smallest unit first
    let mut frame_n = 0.0;
    let mut factor = 1.0;
    for (component, weight) in components.iter().rev().zip([1.0, reference, 60.0, 60.0]) {
        factor *= weight;
        let value: u32 = if component.is_empty() {
            0
        } else {
            component.parse().map_err(|_| {
                Error::invalid_timecode(format!("bad component {component:?} in {timecode:?}"))
            })?
        };
        frame_n += value as f64 * factor;
    }

    if drop_frame {
        let minutes = (frame_n / 1800.0).floor();
        let ten_minutes = (frame_n / 18000.0).floor();
        frame_n += 2.0 * (ten_minutes - minutes);
    }

    let frame = frame_n.round_ties_even() as i64;
    Ok(if negative { -frame } else { frame })
}
