pub mod indicators;
pub mod registry;
pub mod variants;

pub use registry::{build, known_variants};

use common::{Candle, Signal};

/// All signal generator variants must satisfy this trait.
///
/// Implementations are pure: no I/O, no mutation of inputs, and the same
/// window always produces the same signal. New variants only need an entry
/// in `registry::build` — the trade simulator and the comparator are
/// untouched by additions.
pub trait SignalGenerator: std::fmt::Debug + Send + Sync {
    /// Human-readable label used in reports and logs (e.g. "A (permissive)").
    fn label(&self) -> &str;

    /// Minimum number of past candles required before a signal can fire.
    fn min_lookback(&self) -> usize;

    /// Evaluate one decision candle against its lookback window.
    ///
    /// `history` holds candles strictly earlier than `current` — a generator
    /// never sees candles at or after its own decision timestamp. Returns
    /// `None` when the window is too short or no setup is present.
    fn generate(&self, current: &Candle, history: &[Candle]) -> Option<Signal>;
}
