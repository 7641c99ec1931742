use crate::Segment;

/// Assumed length of a caption cue when estimating where it ends, in seconds
pub const NOMINAL_SEGMENT_DURATION: f64 = 3.0;

/// Silence after a cue's estimated end that starts a new paragraph, in seconds
pub const PARAGRAPH_GAP_THRESHOLD: f64 = 2.0;

/// Heuristics used to rebuild paragraphs from cue timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphSettings {
    pub nominal_duration: f64,
    pub gap_threshold: f64,
}

impl Default for ParagraphSettings {
    fn default() -> Self {
        Self {
            nominal_duration: NOMINAL_SEGMENT_DURATION,
            gap_threshold: PARAGRAPH_GAP_THRESHOLD,
        }
    }
}

/// Group segments into paragraphs separated by a blank line.
///
/// A new paragraph starts when a segment begins more than `gap_threshold`
/// seconds after the previous segment's estimated end
/// (`previous start + nominal_duration`).
pub fn to_paragraphs(segments: &[Segment], settings: &ParagraphSettings) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut prev_end = 0.0_f64;

    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }

        if !current.is_empty() && segment.start - prev_end > settings.gap_threshold {
            paragraphs.push(current.join(" "));
            current.clear();
        }

        current.push(text);
        prev_end = segment.start + settings.nominal_duration;
    }

    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs.join("\n\n")
}

/// Flatten segments into one string with an inline `"time:HH:MM:SS"` marker
/// after each cue, so generated chapters can refer back to real times.
pub fn to_timed_string(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        let seconds = segment.start.max(0.0).round_ties_even() as u64;
        out.push_str(&format!("{} \"time:{}\" ", segment.text, format_clock(seconds)));
    }
    out
}

/// `HH:MM:SS` for a whole number of seconds
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(items: &[(&str, f64)]) -> Vec<Segment> {
        items.iter().map(|(t, s)| Segment::new(*t, *s)).collect()
    }

    #[test]
    fn test_paragraph_split_on_gap() {
        let segments = segs(&[("A", 0.0), ("B", 1.0), ("C", 10.0)]);
        assert_eq!(to_paragraphs(&segments, &ParagraphSettings::default()), "A B\n\nC");
    }

    #[test]
    fn test_paragraph_gap_boundary_is_exclusive() {
        // B's estimated end is 4.0; a 2.0s gap is not more than the threshold
        let segments = segs(&[("A", 1.0), ("B", 1.0), ("C", 6.0), ("D", 11.5)]);
        assert_eq!(to_paragraphs(&segments, &ParagraphSettings::default()), "A B C\n\nD");
    }

    #[test]
    fn test_paragraphs_skip_blank_segments() {
        let segments = segs(&[(" hello ", 0.0), ("   ", 50.0), ("world", 2.0)]);
        assert_eq!(to_paragraphs(&segments, &ParagraphSettings::default()), "hello world");
    }

    #[test]
    fn test_paragraphs_custom_settings() {
        let settings = ParagraphSettings {
            nominal_duration: 0.5,
            gap_threshold: 0.1,
        };
        let segments = segs(&[("A", 0.0), ("B", 1.0)]);
        assert_eq!(to_paragraphs(&segments, &settings), "A\n\nB");
    }

    #[test]
    fn test_paragraphs_empty() {
        assert_eq!(to_paragraphs(&[], &ParagraphSettings::default()), "");
    }

    #[test]
    fn test_timed_string() {
        let segments = segs(&[("Hello", 0.4), ("world", 3725.6)]);
        assert_eq!(
            to_timed_string(&segments),
            "Hello \"time:00:00:00\" world \"time:01:02:06\" "
        );
    }

    #[test]
    fn test_timed_string_keeps_text_as_is() {
        let segments = segs(&[(" spaced ", 61.0)]);
        assert_eq!(to_timed_string(&segments), " spaced  \"time:00:01:01\" ");
    }

    #[test]
    fn test_timed_string_rounds_half_to_even() {
        let segments = segs(&[("a", 2.5), ("b", 3.5)]);
        assert_eq!(to_timed_string(&segments), "a \"time:00:00:02\" b \"time:00:00:04\" ");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(225), "00:03:45");
        assert_eq!(format_clock(36_000), "10:00:00");
    }
}
