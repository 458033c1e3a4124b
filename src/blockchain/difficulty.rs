use super::{BASE_DIFFICULTY, BLOCK_TIME_SECS, Block, RETARGET_WINDOW};

/// Derive the required Proof-of-Work difficulty from recent chain history.
///
/// With fewer than `RETARGET_WINDOW` blocks the base difficulty applies.
/// Otherwise the span of the last window is compared against the target and
/// the result is base plus/minus one. The adjustment is relative to the fixed
/// base constant, not to the previously served difficulty, so the value never
/// drifts beyond base±1.
pub fn compute_difficulty(chain: &[Block]) -> u32 {
    if chain.len() < RETARGET_WINDOW {
        return BASE_DIFFICULTY;
    }

    let window = &chain[chain.len() - RETARGET_WINDOW..];
    let oldest = match window[0].timestamp.parse::<f64>() {
        Ok(t) => t,
        Err(_) => return BASE_DIFFICULTY,
    };
    let newest = match window[RETARGET_WINDOW - 1].timestamp.parse::<f64>() {
        Ok(t) => t,
        Err(_) => return BASE_DIFFICULTY,
    };

    let actual_time = newest - oldest;
    let target_time = BLOCK_TIME_SECS * RETARGET_WINDOW as f64;

    if actual_time < target_time {
        BASE_DIFFICULTY + 1
    } else if actual_time > target_time {
        BASE_DIFFICULTY.saturating_sub(1).max(1)
    } else {
        BASE_DIFFICULTY
    }
}
