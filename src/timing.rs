//! Maps synthesized-speech timing onto segments and words.

use crate::error::{PipelineError, Result};
use crate::model::{CharacterAlignment, Word, is_terminator};

/// End time of each segment, taken from the n-th sentence terminator.
///
/// Terminators past the `segments`-th are ignored. The last segment always
/// ends at the final character of the narration. Segments left without a
/// terminator stay `None`; see [`resolve_segment_ends`].
pub fn map_sentence_boundaries(alignment: &CharacterAlignment, segments: usize) -> Vec<Option<f64>> {
    let mut ends = vec![None; segments];
    if segments == 0 {
        return ends;
    }

    let mut cursor = 0;
    for (ch, end) in alignment.iter() {
        if is_terminator(ch) {
            ends[cursor] = Some(end);
            cursor += 1;
            if cursor == segments {
                break;
            }
        }
    }

    if let Some(last) = alignment.final_time() {
        ends[segments - 1] = Some(last);
    }
    ends
}

/// Fails with the indices of segments that never got an end time, or whose
/// clip would be shorter than the millisecond precision of the encoder filter.
pub fn resolve_segment_ends(ends: &[Option<f64>]) -> Result<Vec<f64>> {
    let missing: Vec<usize> = ends
        .iter()
        .enumerate()
        .filter(|(_, end)| end.is_none())
        .map(|(idx, _)| idx)
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::UnderDeterminedSegments { missing });
    }

    let ends: Vec<f64> = ends.iter().flatten().copied().collect();
    let empty: Vec<usize> = clip_durations(&ends)
        .iter()
        .enumerate()
        .filter(|(_, duration)| (**duration * 1000.0).round() <= 0.0)
        .map(|(idx, _)| idx)
        .collect();

    if !empty.is_empty() {
        return Err(PipelineError::EmptySegments { empty });
    }
    Ok(ends)
}

/// Splits narration into words on spaces and terminators.
///
/// A word ends at the end time of its last visible character and starts
/// where the previous word ended. Terminators stay attached to the word they
/// close. A trailing word with no closing space or terminator is dropped.
pub fn extract_words(alignment: &CharacterAlignment) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_end = 0.0;
    let mut last_visible_end = 0.0;

    for (ch, end) in alignment.iter() {
        if ch != " " {
            current.push_str(ch);
            last_visible_end = end;
        }

        if (ch == " " || is_terminator(ch)) && !current.is_empty() {
            words.push(Word {
                punctuated_word: std::mem::take(&mut current),
                start: previous_end,
                end: last_visible_end,
            });
            previous_end = last_visible_end;
        }
    }

    words
}

/// Clip lengths for consecutive segment end times.
pub fn clip_durations(ends: &[f64]) -> Vec<f64> {
    let mut previous = 0.0;
    ends.iter()
        .map(|&end| {
            let duration = end - previous;
            previous = end;
            duration
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hi_bye() -> CharacterAlignment {
        CharacterAlignment::from_text("Hi. Bye!", &[0.1, 0.1, 0.2, 0.3, 0.3, 0.4, 0.4, 0.5]).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn maps_each_terminator_to_a_segment() {
        assert_eq!(map_sentence_boundaries(&hi_bye(), 2), vec![Some(0.2), Some(0.5)]);
    }

    #[test]
    fn zero_segments_is_a_no_op() {
        assert!(map_sentence_boundaries(&hi_bye(), 0).is_empty());
    }

    #[test]
    fn single_segment_spans_whole_narration() {
        assert_eq!(map_sentence_boundaries(&hi_bye(), 1), vec![Some(0.5)]);

        let no_punct = CharacterAlignment::from_text("no stops", &[0.1; 8]).unwrap();
        assert_eq!(map_sentence_boundaries(&no_punct, 1), vec![Some(0.1)]);
    }

    #[test]
    fn extra_terminators_are_ignored_and_last_is_forced() {
        let alignment = CharacterAlignment::from_text(
            "A. B. C. D",
            &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
        )
        .unwrap();
        assert_eq!(map_sentence_boundaries(&alignment, 2), vec![Some(0.2), Some(1.0)]);
    }

    #[test]
    fn missing_terminators_leave_gaps() {
        let alignment = CharacterAlignment::from_text("One. two three", &[
            0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.1, 1.2, 1.3, 1.4,
        ])
        .unwrap();
        let ends = map_sentence_boundaries(&alignment, 4);
        assert_eq!(ends, vec![Some(0.4), None, None, Some(1.4)]);

        match resolve_segment_ends(&ends) {
            Err(PipelineError::UnderDeterminedSegments { missing }) => assert_eq!(missing, vec![1, 2]),
            other => panic!("expected under-determined segments, got {other:?}"),
        }
    }

    #[test]
    fn empty_alignment_leaves_everything_unassigned() {
        let empty = CharacterAlignment::new(Vec::new(), Vec::new()).unwrap();
        assert_eq!(map_sentence_boundaries(&empty, 2), vec![None, None]);
    }

    #[test]
    fn last_end_always_matches_final_time() {
        let alignment = hi_bye();
        for segments in 1..6 {
            let ends = map_sentence_boundaries(&alignment, segments);
            assert_eq!(ends.len(), segments);
            assert_eq!(ends.last().copied().flatten(), Some(0.5));
        }
    }

    #[test]
    fn mapping_is_repeatable() {
        let alignment = hi_bye();
        assert_eq!(
            map_sentence_boundaries(&alignment, 3),
            map_sentence_boundaries(&alignment, 3)
        );
    }

    #[test]
    fn resolves_fully_assigned_ends() {
        assert_eq!(resolve_segment_ends(&[Some(0.2), Some(0.5)]).unwrap(), vec![0.2, 0.5]);
        assert!(resolve_segment_ends(&[]).unwrap().is_empty());
    }

    #[test]
    fn adjacent_terminators_leave_an_empty_segment() {
        let alignment =
            CharacterAlignment::from_text("Really?!", &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.7]).unwrap();
        let ends = map_sentence_boundaries(&alignment, 2);
        assert_eq!(ends, vec![Some(0.7), Some(0.7)]);

        match resolve_segment_ends(&ends) {
            Err(PipelineError::EmptySegments { empty }) => assert_eq!(empty, vec![1]),
            other => panic!("expected empty segments, got {other:?}"),
        }
    }

    #[test]
    fn sub_millisecond_and_zero_starts_are_empty() {
        match resolve_segment_ends(&[Some(0.0), Some(0.7), Some(0.7004), Some(1.2)]) {
            Err(PipelineError::EmptySegments { empty }) => assert_eq!(empty, vec![0, 2]),
            other => panic!("expected empty segments, got {other:?}"),
        }
        assert!(resolve_segment_ends(&[Some(0.7), Some(0.702)]).is_ok());
    }

    #[test]
    fn extracts_words_with_punctuation_attached() {
        let alignment =
            CharacterAlignment::from_text("Hi there.", &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9]).unwrap();
        let words = extract_words(&alignment);

        assert_eq!(words.len(), 2);
        assert_eq!(words[0].punctuated_word, "Hi");
        assert!(approx(words[0].start, 0.0) && approx(words[0].end, 0.2));
        assert_eq!(words[1].punctuated_word, "there.");
        assert!(approx(words[1].start, 0.2) && approx(words[1].end, 0.9));
    }

    #[test]
    fn space_after_terminator_does_not_emit_empty_word() {
        let words = extract_words(&hi_bye());
        let text: Vec<&str> = words.iter().map(|w| w.punctuated_word.as_str()).collect();
        assert_eq!(text, vec!["Hi.", "Bye!"]);
        assert!(approx(words[1].start, 0.2));
        assert!(approx(words[1].end, 0.5));
    }

    #[test]
    fn trailing_word_without_boundary_is_dropped() {
        let alignment = CharacterAlignment::from_text("go now", &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        let words = extract_words(&alignment);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].punctuated_word, "go");
    }

    #[test]
    fn durations_sum_to_final_end() {
        let durations = clip_durations(&[1.5, 3.25, 5.0]);
        assert_eq!(durations, vec![1.5, 1.75, 1.75]);
        assert_eq!(durations.iter().sum::<f64>(), 5.0);
    }
}
