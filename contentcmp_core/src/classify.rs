//! Mismatch classification for a single pair of lines.
//!
//! The cascade runs from the cheapest explanation to the most expensive one:
//! exact equality, letter case, surrounding whitespace, internal whitespace,
//! whitespace plus case. Only when none of those explain the difference does
//! the caller try realignment, and only after that does it fall back to
//! [`edit_distance`].

/// Result of running the cascade over one pair of lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Match,
    Mismatch(MismatchReason),
}

impl Classification {
    pub fn note(&self) -> String {
        match self {
            Classification::Match => "perfect match".to_string(),
            Classification::Mismatch(reason) => reason.note(),
        }
    }
}

/// Why two lines that are not byte-identical differ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchReason {
    LetterCase,
    SurroundingSpaces,
    ExtraSpaces,
    ExtraSpacesAndCase,
    Edit(EditDistance),
}

impl MismatchReason {
    pub fn note(&self) -> String {
        match self {
            MismatchReason::LetterCase => "mismatch due to letter case".to_string(),
            MismatchReason::SurroundingSpaces => {
                "mismatch due to leading/trailing spaces".to_string()
            }
            MismatchReason::ExtraSpaces => "mismatch due to extra spaces".to_string(),
            MismatchReason::ExtraSpacesAndCase => {
                "mismatch due to extra spaces and letter cases".to_string()
            }
            MismatchReason::Edit(distance) => format!(
                "mismatch with edit distance {} ({} insert, {} delete, {} substitute)",
                distance.distance(),
                distance.inserts,
                distance.deletes,
                distance.substitutions
            ),
        }
    }
}

/// Levenshtein distance broken down by operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditDistance {
    pub inserts: usize,
    pub deletes: usize,
    pub substitutions: usize,
}

impl EditDistance {
    pub fn distance(&self) -> usize {
        self.inserts + self.deletes + self.substitutions
    }
}

/// Run the equality cascade. `None` means no cheap explanation exists and the
/// caller should try realignment before falling back to edit distance.
pub fn classify(expected: &str, actual: &str) -> Option<Classification> {
    if expected == actual {
        return Some(Classification::Match);
    }
    if eq_ignore_case(expected, actual) {
        return Some(Classification::Mismatch(MismatchReason::LetterCase));
    }
    if expected.trim() == actual.trim() {
        return Some(Classification::Mismatch(MismatchReason::SurroundingSpaces));
    }

    let expected_stripped = strip_whitespace(expected);
    let actual_stripped = strip_whitespace(actual);
    if expected_stripped == actual_stripped {
        return Some(Classification::Mismatch(MismatchReason::ExtraSpaces));
    }
    if eq_ignore_case(&expected_stripped, &actual_stripped) {
        return Some(Classification::Mismatch(MismatchReason::ExtraSpacesAndCase));
    }

    None
}

/// Cascade plus the edit-distance fallback, without any realignment.
pub fn classify_pair(expected: &str, actual: &str) -> Classification {
    classify(expected, actual).unwrap_or_else(|| {
        let distance = edit_distance(&strip_whitespace(expected), &strip_whitespace(actual));
        Classification::Mismatch(MismatchReason::Edit(distance))
    })
}

/// Exact, or equal once whitespace is removed and case is folded.
///
/// This is the test realignment uses when it searches ahead for a counterpart.
pub fn is_simple_match(left: &str, right: &str) -> bool {
    left == right || eq_ignore_case(&strip_whitespace(left), &strip_whitespace(right))
}

pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

/// Levenshtein distance over chars, counting each operation kind on one
/// optimal edit path. Deletes remove chars from `expected`, inserts add chars
/// from `actual`.
///
/// Only two lines of the DP table are kept, laid along the shorter input, so
/// memory stays linear in the shorter line. Each cell carries the operation
/// counts of its path; ties prefer the diagonal, then a delete, then an insert.
pub fn edit_distance(expected: &str, actual: &str) -> EditDistance {
    let left: Vec<char> = expected.chars().collect();
    let right: Vec<char> = actual.chars().collect();

    if right.len() <= left.len() {
        // one row per `left` char, cells indexed by `right`
        let mut previous: Vec<EditDistance> = (0..=right.len()).map(inserted).collect();
        let mut current = previous.clone();
        for (i, &l) in left.iter().enumerate() {
            current[0] = deleted(i + 1);
            for (j, &r) in right.iter().enumerate() {
                current[j + 1] = best_step(previous[j], previous[j + 1], current[j], l == r);
            }
            std::mem::swap(&mut previous, &mut current);
        }
        previous[right.len()]
    } else {
        // one column per `right` char, cells indexed by `left`
        let mut previous: Vec<EditDistance> = (0..=left.len()).map(deleted).collect();
        let mut current = previous.clone();
        for (j, &r) in right.iter().enumerate() {
            current[0] = inserted(j + 1);
            for (i, &l) in left.iter().enumerate() {
                current[i + 1] = best_step(previous[i], current[i], previous[i + 1], l == r);
            }
            std::mem::swap(&mut previous, &mut current);
        }
        previous[left.len()]
    }
}

fn inserted(count: usize) -> EditDistance {
    EditDistance {
        inserts: count,
        ..EditDistance::default()
    }
}

fn deleted(count: usize) -> EditDistance {
    EditDistance {
        deletes: count,
        ..EditDistance::default()
    }
}

/// Extend the cheapest of the three neighbouring paths into the next cell.
/// `above` drops one `expected` char, `before` adds one `actual` char.
fn best_step(
    diagonal: EditDistance,
    above: EditDistance,
    before: EditDistance,
    same: bool,
) -> EditDistance {
    let substitution = usize::from(!same);
    let via_diagonal = diagonal.distance() + substitution;
    let via_delete = above.distance() + 1;
    let via_insert = before.distance() + 1;

    if via_diagonal <= via_delete && via_diagonal <= via_insert {
        EditDistance {
            substitutions: diagonal.substitutions + substitution,
            ..diagonal
        }
    } else if via_delete <= via_insert {
        EditDistance {
            deletes: above.deletes + 1,
            ..above
        }
    } else {
        EditDistance {
            inserts: before.inserts + 1,
            ..before
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert_eq!(classify("same", "same"), Some(Classification::Match));
        assert_eq!(classify_pair("same", "same").note(), "perfect match");
    }

    #[test]
    fn test_letter_case_precedes_everything_else() {
        let result = classify_pair("Hello World", "hello world");
        assert_eq!(result, Classification::Mismatch(MismatchReason::LetterCase));
        assert!(result.note().contains("letter case"));
    }

    #[test]
    fn test_surrounding_spaces() {
        let result = classify("  indented", "indented  ");
        assert_eq!(
            result,
            Some(Classification::Mismatch(MismatchReason::SurroundingSpaces))
        );
    }

    #[test]
    fn test_internal_whitespace_collapse() {
        let result = classify_pair("a   b", "a b");
        assert_eq!(result, Classification::Mismatch(MismatchReason::ExtraSpaces));
        let note = result.note();
        assert!(note.contains("extra spaces"));
        assert!(!note.contains("letter case"));
        assert!(!note.contains("edit distance"));
    }

    #[test]
    fn test_spaces_and_case() {
        let result = classify("Total:  42 USD", "total:42 usd");
        assert_eq!(
            result,
            Some(Classification::Mismatch(MismatchReason::ExtraSpacesAndCase))
        );
    }

    #[test]
    fn test_unexplained_difference_falls_through() {
        assert_eq!(classify("alpha", "omega"), None);
        match classify_pair("alpha", "alps") {
            Classification::Mismatch(MismatchReason::Edit(distance)) => {
                assert_eq!(distance.distance(), 2);
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_edit_distance_breakdown() {
        assert_eq!(
            edit_distance("abc", "abd"),
            EditDistance {
                inserts: 0,
                deletes: 0,
                substitutions: 1,
            }
        );
        assert_eq!(
            edit_distance("abc", "ab"),
            EditDistance {
                inserts: 0,
                deletes: 1,
                substitutions: 0,
            }
        );
        assert_eq!(
            edit_distance("", "xy"),
            EditDistance {
                inserts: 2,
                deletes: 0,
                substitutions: 0,
            }
        );
        assert_eq!(edit_distance("kitten", "sitting").distance(), 3);
    }

    #[test]
    fn test_edit_distance_total_is_symmetric() {
        let pairs = [("kitten", "sitting"), ("alpha", "alps"), ("", "abc"), ("xbcd", "abc")];
        for (left, right) in pairs {
            assert_eq!(
                edit_distance(left, right).distance(),
                edit_distance(right, left).distance()
            );
        }
    }

    #[test]
    fn test_edit_distance_on_long_lines() {
        let expected = "ab".repeat(10_000);
        let actual = "cd".repeat(10_000);
        assert_eq!(
            edit_distance(&expected, &actual),
            EditDistance {
                inserts: 0,
                deletes: 0,
                substitutions: 20_000,
            }
        );

        let longer = format!("{}tail", "x".repeat(20_000));
        let distance = edit_distance(&longer, &"x".repeat(20_000));
        assert_eq!(distance.deletes, 4);
        assert_eq!(distance.distance(), 4);
    }

    #[test]
    fn test_edit_note_lists_counts() {
        let note = classify_pair("abc", "xbcd").note();
        assert!(note.contains("edit distance 2"));
        assert!(note.contains("1 insert"));
        assert!(note.contains("1 substitute"));
    }

    #[test]
    fn test_simple_match() {
        assert!(is_simple_match("x = 1", "x = 1"));
        assert!(is_simple_match("X = 1", "x=1"));
        assert!(!is_simple_match("x = 1", "x = 2"));
    }
}
