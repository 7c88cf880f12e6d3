//! Color assignment for a pair of competitors.

use crate::models::{Color, Competitor};

/// Who plays which side.
#[derive(Debug, Clone, Copy)]
pub struct ColorAssignment<'a> {
    pub white: &'a Competitor,
    pub black: &'a Competitor,
}

impl<'a> ColorAssignment<'a> {
    fn with(competitor: &'a Competitor, color: Color, other: &'a Competitor) -> Self {
        match color {
            Color::White => Self {
                white: competitor,
                black: other,
            },
            Color::Black => Self {
                white: other,
                black: competitor,
            },
        }
    }

    /// True if either side would play the same color a third time running.
    pub fn creates_streak(&self) -> bool {
        repeats_last_two(self.white, Color::White) || repeats_last_two(self.black, Color::Black)
    }
}

fn repeats_last_two(competitor: &Competitor, color: Color) -> bool {
    competitor.needs_opposite() && competitor.last_color() == Some(color)
}

/// Decide colors for `x` against `y`.
///
/// 1. If exactly one of them played the same color in both of their last
///    two games, that one gets the other color.
/// 2. Otherwise the lower color balance gets white.
/// 3. Otherwise, on odd rounds, the competitor with the smaller id
///    alternates from their last color when they have one; failing that
///    the smaller id takes white.
///
/// The result does not depend on argument order.
pub fn assign_colors<'a>(
    x: &'a Competitor,
    y: &'a Competitor,
    round_number: u32,
) -> ColorAssignment<'a> {
    match (x.needs_opposite(), y.needs_opposite()) {
        (true, false) => {
            if let Some(last) = x.last_color() {
                return ColorAssignment::with(x, last.opposite(), y);
            }
        }
        (false, true) => {
            if let Some(last) = y.last_color() {
                return ColorAssignment::with(y, last.opposite(), x);
            }
        }
        _ => {}
    }

    if x.color_balance != y.color_balance {
        let (lower, higher) = if x.color_balance < y.color_balance {
            (x, y)
        } else {
            (y, x)
        };
        return ColorAssignment::with(lower, Color::White, higher);
    }

    let (first, second) = if x.id <= y.id { (x, y) } else { (y, x) };
    if round_number % 2 == 1 {
        if let Some(last) = first.last_color() {
            return ColorAssignment::with(first, last.opposite(), second);
        }
    }
    ColorAssignment::with(first, Color::White, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Color::{Black, White};

    fn c(id: &str, colors: Vec<Color>) -> Competitor {
        Competitor::new(id, id, None).with_colors(colors)
    }

    fn white_of(x: &Competitor, y: &Competitor, round: u32) -> String {
        assign_colors(x, y, round).white.id.to_string()
    }

    #[test]
    fn test_needs_opposite_wins() {
        // a has WW so must get black even though b has the higher balance
        let a = c("a", vec![White, White]);
        let b = c("b", vec![White, White, White, Black, White]);
        assert!(!b.needs_opposite());
        assert_eq!(white_of(&a, &b, 4), "b");
        assert_eq!(white_of(&b, &a, 4), "b");
    }

    #[test]
    fn test_both_need_opposite_falls_through_to_balance() {
        let a = c("a", vec![Black, White, White]);
        let b = c("b", vec![White, Black, Black]);
        assert_eq!(white_of(&a, &b, 4), "b");
    }

    #[test]
    fn test_lower_balance_gets_white() {
        let a = c("a", vec![White]);
        let b = c("b", vec![Black]);
        assert_eq!(white_of(&a, &b, 2), "b");
        assert_eq!(white_of(&b, &a, 2), "b");
    }

    #[test]
    fn test_tied_balance_odd_round_alternates_first_competitor() {
        let a = c("a", vec![White, Black]);
        let b = c("b", vec![Black, White]);
        // a (smaller id) last played black, so takes white
        assert_eq!(white_of(&a, &b, 3), "a");
        assert_eq!(white_of(&b, &a, 3), "a");

        let a = c("a", vec![Black, White]);
        let b = c("b", vec![White, Black]);
        assert_eq!(white_of(&a, &b, 3), "b");
    }

    #[test]
    fn test_tied_balance_even_round_uses_id() {
        let a = c("a", vec![Black, White]);
        let b = c("b", vec![White, Black]);
        assert_eq!(white_of(&a, &b, 2), "a");
        assert_eq!(white_of(&b, &a, 2), "a");
    }

    #[test]
    fn test_no_history_uses_id() {
        let a = c("a", vec![]);
        let b = c("b", vec![]);
        assert_eq!(white_of(&b, &a, 1), "a");
    }

    #[test]
    fn test_creates_streak() {
        let ww = c("a", vec![White, White]);
        let fresh = c("b", vec![]);
        let forced = ColorAssignment {
            white: &ww,
            black: &fresh,
        };
        assert!(forced.creates_streak());

        let natural = assign_colors(&ww, &fresh, 3);
        assert!(!natural.creates_streak());
    }
}
