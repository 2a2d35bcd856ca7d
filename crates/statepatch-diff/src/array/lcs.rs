//! Shortest edit paths through the edit graph of two sequences.
//!
//! Point `(x, y)` of the edit graph means "the first `x` items of `a` have
//! been turned into the first `y` items of `b`". A horizontal step removes
//! `a[x]`, a vertical step inserts `b[y]`, and a diagonal step keeps an item
//! both sides share. Diagonals are indexed by `k = x - y`.
//!
//! The edit distance `D` comes from the greedy forward search. The path
//! itself is recovered by divide and conquer: a forward and a backward pass
//! over the middle row of the box locate a point on an optimal path, and both
//! halves are solved recursively. Each pass keeps only two rows of `2D + 3`
//! cells, so memory stays linear whatever the distance.
//!
//! Among equally short paths the search prefers the one with fewer runs of
//! consecutive same-direction steps, then the one continuing a diagonal. The
//! scripts produced are therefore stable for the usual append, insert, and
//! delete patterns, but this ordering is a policy: other minimal scripts
//! exist for most inputs.

use std::ops::Range;

/// The kind of run reported for a span of the two sequences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RunKind {
    Same,
    Remove,
    Add,
}

/// Step directions through the edit graph, as a bit set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Direction(u8);

impl Direction {
    const NONE: Self = Self(0);
    const HORIZONTAL: Self = Self(1);
    const VERTICAL: Self = Self(1 << 1);
    const DIAGONAL: Self = Self(1 << 2);
    const ALL: Self = Self(Self::HORIZONTAL.0 | Self::VERTICAL.0 | Self::DIAGONAL.0);

    fn contains(self, other: Direction) -> bool {
        self.0 & other.0 != 0
    }

    fn union(self, other: Direction) -> Direction {
        Direction(self.0 | other.0)
    }
}

/// Best known way of reaching one point of the edit graph.
#[derive(Clone, Copy, Debug)]
struct Cell {
    /// Edits spent so far; `usize::MAX` while unreachable.
    d: usize,
    /// Number of same-direction runs on the path.
    segments: usize,
    /// Every direction by which the best path may arrive.
    direct: Direction,
}

const UNREACHED: Cell = Cell {
    d: usize::MAX,
    segments: 0,
    direct: Direction::NONE,
};

impl Cell {
    fn origin(direct: Direction) -> Self {
        Cell { d: 0, segments: 0, direct }
    }

    /// Extend the path ending here by one step in `direct`.
    fn step(self, direct: Direction, cost: usize) -> Cell {
        Cell {
            d: self.d.saturating_add(cost),
            segments: self.segments + usize::from(!self.direct.contains(direct)),
            direct,
        }
    }
}

/// Pick the cheapest candidate, then fewest segments; the first candidate
/// wins exact ties, and every tied direction is folded into the result.
fn pick(candidates: &[Cell]) -> Cell {
    let mut best = candidates[0];
    for cell in &candidates[1..] {
        if best.d > cell.d || (best.d == cell.d && best.segments > cell.segments) {
            best = *cell;
        }
    }
    for cell in candidates {
        if cell.d == best.d && cell.segments == best.segments {
            best.direct = best.direct.union(cell.direct);
        }
    }
    best
}

/// Minimum number of single-item insertions and removals turning `a` into `b`.
pub(crate) fn edit_distance<T, F>(a: &[T], b: &[T], compare: &F) -> usize
where
    F: Fn(&T, &T) -> bool,
{
    let (m, n) = (a.len() as isize, b.len() as isize);
    let max = m + n;
    let offset = max + 1;
    let at = |k: isize| (k + offset) as usize;
    // Furthest x reached on each diagonal.
    let mut v = vec![0isize; (2 * max + 3) as usize];

    for d in 0..=max {
        let mut k = -d;
        while k <= d {
            let mut x = if k == -d || (k != d && v[at(k - 1)] + 1 < v[at(k + 1)]) {
                v[at(k + 1)]
            } else {
                v[at(k - 1)] + 1
            };
            let mut y = x - k;
            while x < m && y < n && compare(&a[x as usize], &b[y as usize]) {
                x += 1;
                y += 1;
            }
            if x == m && y == n {
                return d as usize;
            }
            v[at(k)] = x;
            k += 2;
        }
    }
    max as usize
}

/// Walk a shortest edit path from `a` to `b`, reporting each run in order.
///
/// `emit` receives the run kind with the spans of `a` and `b` it covers.
/// Removals report an empty span of `b` at the point they apply, additions an
/// empty span of `a`.
pub(crate) fn best_subsequence<T, F, E>(a: &[T], b: &[T], compare: &F, emit: E)
where
    F: Fn(&T, &T) -> bool,
    E: FnMut(RunKind, Range<usize>, Range<usize>),
{
    let d = edit_distance(a, b, compare);
    let mut solver = Solver { a, b, compare, emit };
    solver.solve(
        0..a.len(),
        0..b.len(),
        d,
        Direction::DIAGONAL,
        Direction::ALL,
    );
}

struct Solver<'a, T, F, E> {
    a: &'a [T],
    b: &'a [T],
    compare: &'a F,
    emit: E,
}

impl<T, F, E> Solver<'_, T, F, E>
where
    F: Fn(&T, &T) -> bool,
    E: FnMut(RunKind, Range<usize>, Range<usize>),
{
    /// Solve the box `a_span` x `b_span`, known to need exactly `d` edits.
    ///
    /// `start` and `end` are the directions the enclosing path arrives with
    /// and leaves by, so a split never opens a segment it could have extended.
    fn solve(
        &mut self,
        a_span: Range<usize>,
        b_span: Range<usize>,
        d: usize,
        start: Direction,
        end: Direction,
    ) {
        if d == 0 {
            (self.emit)(RunKind::Same, a_span, b_span);
            return;
        }
        if d == a_span.len() + b_span.len() {
            self.emit_replacement(a_span, b_span, start, end);
            return;
        }

        let m = a_span.len() as isize;
        let n = b_span.len() as isize;
        let (a0, b0) = (a_span.start, b_span.start);
        let d_i = d as isize;
        let offset = d_i + 1;
        let at = |k: isize| (k + offset) as usize;
        let width = 2 * d + 3;
        let mut half = n / 2;

        // Forward pass: from the top-left corner down to the middle row.
        let mut now = vec![UNREACHED; width];
        let mut preview = vec![UNREACHED; width];
        for y in 0..=half {
            std::mem::swap(&mut now, &mut preview);
            for k in -d_i..=d_i {
                let x = y + k;
                if y == 0 && x == 0 {
                    now[at(k)] = Cell::origin(start);
                    continue;
                }
                let horizontal = now[at(k - 1)].step(Direction::HORIZONTAL, 1);
                let vertical = preview[at(k + 1)].step(Direction::VERTICAL, 1);
                now[at(k)] = if x > 0
                    && x <= m
                    && y > 0
                    && y <= n
                    && (self.compare)(
                        &self.a[a0 + x as usize - 1],
                        &self.b[b0 + y as usize - 1],
                    ) {
                    let diagonal = preview[at(k)].step(Direction::DIAGONAL, 0);
                    pick(&[horizontal, vertical, diagonal])
                } else {
                    pick(&[horizontal, vertical])
                };
            }
        }

        // Backward pass: from the bottom-right corner up to the middle row.
        let mut now2 = vec![UNREACHED; width];
        let mut preview2 = vec![UNREACHED; width];
        for y in (half..=n).rev() {
            std::mem::swap(&mut now2, &mut preview2);
            for k in (-d_i..=d_i).rev() {
                let x = y + k;
                if y == n && x == m {
                    now2[at(k)] = Cell::origin(end);
                    continue;
                }
                let horizontal = now2[at(k + 1)].step(Direction::HORIZONTAL, 1);
                let vertical = preview2[at(k - 1)].step(Direction::VERTICAL, 1);
                now2[at(k)] = if x >= 0
                    && x < m
                    && y >= 0
                    && y < n
                    && (self.compare)(&self.a[a0 + x as usize], &self.b[b0 + y as usize])
                {
                    let diagonal = preview2[at(k)].step(Direction::DIAGONAL, 0);
                    pick(&[horizontal, vertical, diagonal])
                } else {
                    pick(&[horizontal, vertical])
                };
            }
        }

        // Choose the middle-row point where the two halves join best.
        let mut best_k: isize = -1;
        let mut best_d = usize::MAX;
        let mut best_segments = 0;
        let mut best_direct = Direction::NONE;
        for k in -d_i..=d_i {
            let (fwd, bwd) = (now[at(k)], now2[at(k)]);
            let total = fwd.d.saturating_add(bwd.d);
            let segments =
                fwd.segments + bwd.segments + usize::from(fwd.segments & bwd.segments == 0);
            let better = total < best_d
                || (total == best_d
                    && (segments < best_segments
                        || (segments == best_segments
                            && !best_direct.contains(Direction::DIAGONAL)
                            && bwd.direct.contains(Direction::DIAGONAL))));
            if better {
                best_k = k;
                best_d = total;
                best_segments = segments;
                best_direct = bwd.direct;
            }
        }

        let split = at(best_k);
        if half + best_k == 0 && half == 0 {
            // Splitting at the origin would not shrink the box; step over the
            // first diagonal instead.
            half += 1;
            now[split].direct = now2[split].direct;
            now2[split].direct = preview2[split].direct;
        }

        let a_mid = (a0 as isize + half + best_k) as usize;
        let b_mid = b0 + half as usize;
        self.solve(
            a0..a_mid,
            b0..b_mid,
            now[split].d,
            start,
            now2[split].direct,
        );
        self.solve(
            a_mid..a_span.end,
            b_mid..b_span.end,
            now2[split].d,
            now[split].direct,
            end,
        );
    }

    /// A box with no shared items: remove all of `a_span`, add all of
    /// `b_span`, ordered to continue the runs on either side.
    fn emit_replacement(
        &mut self,
        a_span: Range<usize>,
        b_span: Range<usize>,
        start: Direction,
        end: Direction,
    ) {
        let remove_first = usize::from(start.contains(Direction::HORIZONTAL))
            + usize::from(end.contains(Direction::VERTICAL));
        let add_first = usize::from(start.contains(Direction::VERTICAL))
            + usize::from(end.contains(Direction::HORIZONTAL));

        if remove_first >= add_first {
            if !a_span.is_empty() {
                (self.emit)(RunKind::Remove, a_span.clone(), b_span.start..b_span.start);
            }
            if !b_span.is_empty() {
                (self.emit)(RunKind::Add, a_span.end..a_span.end, b_span);
            }
        } else {
            if !b_span.is_empty() {
                (self.emit)(RunKind::Add, a_span.start..a_span.start, b_span.clone());
            }
            if !a_span.is_empty() {
                (self.emit)(RunKind::Remove, a_span, b_span.end..b_span.end);
            }
        }
    }
}
