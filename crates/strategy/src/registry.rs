use tracing::debug;

use common::{Error, Result};

use crate::variants::{ConfluenceValidated, MomentumExtreme};
use crate::SignalGenerator;

/// Resolve a strategy variant tag into its generator.
///
/// Unknown tags are a hard error — the backtest engine rejects the config
/// here before any candle is fetched or simulated. Adding a variant means
/// adding one arm; nothing downstream changes.
pub fn build(tag: &str) -> Result<Box<dyn SignalGenerator>> {
    let generator: Box<dyn SignalGenerator> = match tag {
        "A" => Box::new(MomentumExtreme::new()),
        "B" => Box::new(ConfluenceValidated::new()),
        other => return Err(Error::UnknownStrategy(other.to_string())),
    };
    debug!(tag = tag, label = generator.label(), "Resolved strategy variant");
    Ok(generator)
}

/// Tags accepted by `build`, for config validation and CLI help.
pub fn known_variants() -> &'static [&'static str] {
    &["A", "B"]
}
