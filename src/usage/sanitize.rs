use tracing::{debug, warn};

use super::{PartialUsage, UsageRecord, FIELD_COUNT};

/// Coerce untrusted usage values into a bounded [`UsageRecord`].
///
/// Never fails. Absent and non-finite fields stay at zero, negatives clamp to
/// zero, and anything above the field's upper bound is reset to zero.
pub fn sanitize_usage_record(partial: &PartialUsage) -> UsageRecord {
    let mut values = [0.0; FIELD_COUNT];

    for (&field, &raw) in partial {
        if !raw.is_finite() {
            warn!(field = %field, "non-finite usage value reset to 0");
            continue;
        }

        let clamped = if raw <= 0.0 { 0.0 } else { raw };
        let max = field.spec().bounds.max;
        if clamped > max {
            warn!(field = %field, value = clamped, max, "usage value above bound reset to 0");
            continue;
        }

        values[field.index()] = clamped;
    }

    debug!(fields = partial.len(), "sanitized usage record");
    UsageRecord::from_values(values)
}
