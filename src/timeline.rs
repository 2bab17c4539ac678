use std::fmt;

use anyhow::{anyhow, Result};

use crate::segmenter::NarrationUnit;

// @module: Mapping measured audio durations onto caption display windows

// @struct: A narration unit paired with its measured audio duration
#[derive(Debug, Clone)]
pub struct TimedUnit {
    // @field: The unit as produced by the segmenter
    pub unit: NarrationUnit,

    // @field: Measured duration of the rendered audio, in seconds
    pub duration_secs: f64,
}

impl TimedUnit {
    pub fn new(unit: NarrationUnit, duration_secs: f64) -> Self {
        TimedUnit {
            unit,
            duration_secs,
        }
    }
}

// @struct: A caption chunk bound to an absolute display window
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    // @field: Caption text
    pub caption: String,

    // @field: Window start in seconds from video start
    pub start_secs: f64,

    // @field: Window end in seconds from video start
    pub end_secs: f64,
}

impl TimelineEntry {
    // @creates: Validated timeline entry
    // @validates: Window ordering and non-negative start
    pub fn new_validated(caption: String, start_secs: f64, end_secs: f64) -> Result<Self> {
        if start_secs < 0.0 {
            return Err(anyhow!("Negative start time {}", start_secs));
        }
        if end_secs <= start_secs {
            return Err(anyhow!(
                "Invalid window: end {} <= start {}",
                end_secs,
                start_secs
            ));
        }
        Ok(TimelineEntry {
            caption,
            start_secs,
            end_secs,
        })
    }

    /// Window length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

impl fmt::Display for TimelineEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{:.3} --> {:.3}] {}",
            self.start_secs, self.end_secs, self.caption
        )
    }
}

/// Build the caption display timeline from measured narration durations.
///
/// The clock starts at the end of `lead_in_secs` (the title narration).
/// Each unit's duration is divided evenly across its caption chunks; the
/// per-word timing of a chunk is unknown without re-rendering each chunk
/// individually, so the even split is the least-biased estimate available.
/// Within a unit the windows are contiguous and sum to the unit duration,
/// and across units the end of one window is the start of the next.
pub fn build_timeline(units: &[TimedUnit], lead_in_secs: f64) -> Result<Vec<TimelineEntry>> {
    let mut entries = Vec::new();
    let mut clock = lead_in_secs;

    for timed in units {
        let chunk_count = timed.unit.caption_chunks.len();
        if chunk_count == 0 {
            // Segmenter output always carries at least one chunk; an empty
            // unit here means the caller bypassed it.
            return Err(anyhow!(
                "Narration unit {} has no caption chunks",
                timed.unit.index
            ));
        }
        if timed.duration_secs <= 0.0 {
            return Err(anyhow!(
                "Narration unit {} has non-positive duration {}",
                timed.unit.index,
                timed.duration_secs
            ));
        }

        // Chunk boundaries are fractions of the unit window rather than a
        // running += of d/k, so the k spans sum to exactly d.
        let k = chunk_count as f64;
        for (i, chunk) in timed.unit.caption_chunks.iter().enumerate() {
            let begin = clock + timed.duration_secs * (i as f64) / k;
            let end = if i + 1 == chunk_count {
                clock + timed.duration_secs
            } else {
                clock + timed.duration_secs * ((i + 1) as f64) / k
            };
            entries.push(TimelineEntry::new_validated(chunk.clone(), begin, end)?);
        }
        clock += timed.duration_secs;
    }

    Ok(entries)
}

/// Total running time of the narration: lead-in plus every unit duration.
pub fn total_duration(units: &[TimedUnit], lead_in_secs: f64) -> f64 {
    lead_in_secs + units.iter().map(|t| t.duration_secs).sum::<f64>()
}
