//! This module provides the `Tape`: a sparse, two-way unbounded line of cells in which
//! every position that was never written reads as `BLANK`. It also hosts the read-only
//! reporting views (head-centred windows, the trimmed tape string and tally counting).

use crate::types::{BLANK, TALLY};
use rustc_hash::FxHashMap;

/// A sparse tape indexed by signed position.
///
/// Only non-blank cells occupy storage; reads never allocate. The lowest and highest
/// positions ever written are tracked so the whole tape can be rendered in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tape {
    cells: FxHashMap<i64, char>,
    bounds: Option<(i64, i64)>,
}

impl Tape {
    /// Creates a tape that is blank everywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tape holding `symbols` at `start`, `start + 1`, ...
    ///
    /// Symbols that would land past `i64::MAX` are dropped.
    pub fn from_symbols<I>(symbols: I, start: i64) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        let mut tape = Self::new();
        let positions = std::iter::successors(Some(start), |pos| pos.checked_add(1));
        for (pos, symbol) in positions.zip(symbols) {
            tape.write(pos, symbol);
        }
        tape
    }

    /// Creates a tape holding `count` tally symbols from position 0.
    pub fn tally(count: usize) -> Self {
        Self::from_symbols(std::iter::repeat(TALLY).take(count), 0)
    }

    /// Returns the symbol at `pos`, or `BLANK` if it was never written.
    pub fn read(&self, pos: i64) -> char {
        self.cells.get(&pos).copied().unwrap_or(BLANK)
    }

    /// Replaces the symbol at `pos`. Writing `BLANK` frees the cell.
    pub fn write(&mut self, pos: i64, symbol: char) {
        if symbol == BLANK {
            self.cells.remove(&pos);
        } else {
            self.cells.insert(pos, symbol);
        }

        self.bounds = Some(match self.bounds {
            Some((low, high)) => (low.min(pos), high.max(pos)),
            None => (pos, pos),
        });
    }

    /// Lowest and highest positions ever written, if any.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        self.bounds
    }

    /// Number of cells currently holding a non-blank symbol.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the `2 * radius` cells from `center - radius` up to (excluding)
    /// `center + radius`, so the centre cell sits at index `radius`. Positions outside
    /// the `i64` range render as `BLANK`.
    pub fn render(&self, center: i64, radius: usize) -> Vec<char> {
        let radius = radius as i64;
        (-radius..radius)
            .map(|offset| center.checked_add(offset).map_or(BLANK, |pos| self.read(pos)))
            .collect()
    }

    /// `render` joined by single spaces, the format used for console traces.
    pub fn show(&self, center: i64, radius: usize) -> String {
        self.render(center, radius)
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Concatenates every cell between the written bounds, with leading and trailing
    /// blank and space runs stripped. Empty if nothing was ever written.
    pub fn to_string_trimmed(&self) -> String {
        let Some((low, high)) = self.bounds else {
            return String::new();
        };

        (low..=high)
            .map(|pos| self.read(pos))
            .collect::<String>()
            .trim_matches(|c| c == BLANK || c == ' ')
            .to_string()
    }

    /// Counts consecutive `tally` symbols from the start of the trimmed tape.
    pub fn count_leading(&self, tally: char) -> usize {
        self.to_string_trimmed()
            .chars()
            .take_while(|&c| c == tally)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_reads_do_not_allocate() {
        let tape = Tape::new();

        for pos in [-5, 0, 3, i64::MAX, i64::MIN] {
            assert_eq!(tape.read(pos), BLANK);
            assert_eq!(tape.read(pos), BLANK);
        }
        assert!(tape.is_empty());
        assert_eq!(tape.bounds(), None);
    }

    #[test]
    fn test_write_overwrites() {
        let mut tape = Tape::new();
        tape.write(2, 'a');
        tape.write(2, 'b');

        assert_eq!(tape.read(2), 'b');
        assert_eq!(tape.len(), 1);
    }

    #[test]
    fn test_write_blank_frees_cell() {
        let mut tape = Tape::from_symbols("abc".chars(), 0);
        tape.write(1, BLANK);

        assert_eq!(tape.read(1), BLANK);
        assert_eq!(tape.len(), 2);
        assert_eq!(tape.to_string_trimmed(), "a_c");
    }

    #[test]
    fn test_from_symbols_with_offset() {
        let tape = Tape::from_symbols("xy".chars(), -1);

        assert_eq!(tape.read(-1), 'x');
        assert_eq!(tape.read(0), 'y');
        assert_eq!(tape.bounds(), Some((-1, 0)));
    }

    #[test]
    fn test_trimmed_strips_blank_and_space_runs() {
        let mut tape = Tape::from_symbols(" _1_0_ ".chars(), 0);
        tape.write(-4, '_');
        tape.write(20, '_');

        assert_eq!(tape.to_string_trimmed(), "1_0");
    }

    #[test]
    fn test_trimmed_ignores_rewrite_history() {
        let mut a = Tape::new();
        a.write(0, '1');
        a.write(1, '0');

        let mut b = Tape::new();
        b.write(1, 'z');
        b.write(0, '0');
        b.write(1, '0');
        b.write(0, '1');

        assert_eq!(a.to_string_trimmed(), b.to_string_trimmed());
    }

    #[test]
    fn test_trimmed_empty_tape() {
        assert_eq!(Tape::new().to_string_trimmed(), "");
        assert_eq!(Tape::from_symbols("__".chars(), 0).to_string_trimmed(), "");
    }

    #[test]
    fn test_count_leading() {
        assert_eq!(Tape::tally(4).count_leading(TALLY), 4);
        assert_eq!(Tape::tally(0).count_leading(TALLY), 0);
        assert_eq!(
            Tape::from_symbols("__111_11".chars(), -2).count_leading(TALLY),
            3
        );
        assert_eq!(Tape::from_symbols("011".chars(), 0).count_leading(TALLY), 0);
    }

    #[test]
    fn test_render_window() {
        let tape = Tape::from_symbols("abc".chars(), 0);

        let window = tape.render(1, 2);
        assert_eq!(window, vec!['_', 'a', 'b', 'c']);
        assert_eq!(window[2], tape.read(1));
        assert_eq!(tape.render(0, 0), Vec::<char>::new());
        assert_eq!(tape.show(1, 2), "_ a b c");
    }

    #[test]
    fn test_positions_at_the_ends_of_the_range() {
        let tape = Tape::from_symbols("abc".chars(), i64::MAX - 1);

        assert_eq!(tape.len(), 2);
        assert_eq!(tape.read(i64::MAX), 'b');
        assert_eq!(tape.bounds(), Some((i64::MAX - 1, i64::MAX)));
        assert_eq!(tape.render(i64::MAX, 2), vec!['_', 'a', 'b', '_']);
        assert_eq!(tape.render(i64::MIN, 1), vec!['_', '_']);
    }
}
