//! Counters for channel attempts, deliveries and probes.
//!
//! Nothing is exported from here; the `metrics` facade is a no-op until the
//! embedding process installs a recorder.

use crate::{ChannelOutcome, DeliveryResult, LivenessState};

pub fn record_attempt(outcome: &ChannelOutcome) {
    let result = match outcome.error_kind {
        None => "success",
        Some(kind) => kind.as_str(),
    };
    metrics::counter!(
        "media_ferry_channel_attempts_total",
        "channel" => outcome.channel.as_str(),
        "outcome" => result
    )
    .increment(1);
}

pub fn record_delivery(result: &DeliveryResult) {
    let outcome = match result.terminal() {
        Some(t) if t.success => t.channel.as_str(),
        _ => "exhausted",
    };
    metrics::counter!(
        "media_ferry_deliveries_total",
        "kind" => result.request.kind().as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_rejection() {
    metrics::counter!("media_ferry_deliveries_total", "outcome" => "rejected").increment(1);
}

pub fn record_probe(state: &LivenessState) {
    let reachable = if state.reachable { "true" } else { "false" };
    metrics::counter!("media_ferry_probes_total", "reachable" => reachable).increment(1);
    metrics::gauge!("media_ferry_probe_consecutive_failures")
        .set(f64::from(state.consecutive_failures));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelKind, DeliveryErrorKind};

    #[test]
    fn recording_without_recorder_is_harmless() {
        record_attempt(&ChannelOutcome::failed(
            ChannelKind::Clipboard,
            "a.png",
            DeliveryErrorKind::DecodeFailed,
            "bad bytes",
        ));
        record_probe(&LivenessState::default());
        record_rejection();
    }
}
