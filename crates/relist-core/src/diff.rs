//! Minimal edit scripts between two ordered lists.
//!
//! # Algorithm
//!
//! 1. Linear-space Myers diff (middle snake, divide and conquer) over the
//!    identity predicate yields the matching diagonals in `O((N + M) * D)`.
//! 2. Optionally, every unmatched old item is paired with the first unclaimed
//!    unmatched new item of the same identity; such pairs become moves.
//! 3. Ops are emitted as removals (highest position first), moves (in
//!    destination order, each item moved once), insertions (lowest first) and
//!    finally in-place changes for matched pairs whose content differs.
//!
//! Diagonal items never move. Content is only compared for pairs the identity
//! predicate accepted.

use crate::callback::DiffCallback;
use crate::cancel::CancellationToken;
use crate::edit_script::{EditScript, ScriptBuilder};
use crate::error::ReconcileError;

/// Default number of algorithm steps between two cancellation checks.
pub const DEFAULT_CHECK_INTERVAL: usize = 64;

/// Tuning knobs for a diff computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffOptions {
    /// Whether identity matches outside the common subsequence are reported
    /// as moves. When disabled they become a removal plus an insertion.
    pub detect_moves: bool,

    /// Steps between cancellation checks. Zero is treated as one.
    pub check_interval: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            detect_moves: true,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

impl DiffOptions {
    /// Options with move detection disabled.
    pub fn without_moves() -> Self {
        Self {
            detect_moves: false,
            ..Self::default()
        }
    }
}

/// Computes the edit script turning `callback`'s old list into its new list.
pub fn compute<C>(callback: &C, options: &DiffOptions) -> EditScript
where
    C: DiffCallback + ?Sized,
{
    let mut checkpoint = Checkpoint::new(None, options.check_interval);
    match run(callback, options, &mut checkpoint) {
        Ok(script) => script,
        Err(_) => unreachable!("a diff without a token cannot be cancelled"),
    }
}

/// Like [`compute`], polling `token` while it works.
///
/// Returns [`ReconcileError::Cancelled`] as soon as a checkpoint observes the
/// token; no partial script is ever returned.
pub fn compute_cancellable<C>(
    callback: &C,
    options: &DiffOptions,
    token: &CancellationToken,
) -> Result<EditScript, ReconcileError>
where
    C: DiffCallback + ?Sized,
{
    let mut checkpoint = Checkpoint::new(Some(token), options.check_interval);
    checkpoint.check()?;
    let script = run(callback, options, &mut checkpoint)?;
    checkpoint.check()?;
    Ok(script)
}

fn run<C>(
    callback: &C,
    options: &DiffOptions,
    checkpoint: &mut Checkpoint<'_>,
) -> Result<EditScript, ReconcileError>
where
    C: DiffCallback + ?Sized,
{
    log::trace!(
        "diffing {} old against {} new items",
        callback.old_len(),
        callback.new_len()
    );
    let diagonals = find_diagonals(callback, checkpoint)?;
    build_script(callback, &diagonals, options, checkpoint)
}

struct Checkpoint<'a> {
    token: Option<&'a CancellationToken>,
    interval: usize,
    ticks: usize,
}

impl<'a> Checkpoint<'a> {
    fn new(token: Option<&'a CancellationToken>, interval: usize) -> Self {
        Self {
            token,
            interval: interval.max(1),
            ticks: 0,
        }
    }

    fn check(&self) -> Result<(), ReconcileError> {
        match self.token {
            Some(token) if token.is_cancelled() => Err(ReconcileError::Cancelled),
            _ => Ok(()),
        }
    }

    fn tick(&mut self) -> Result<(), ReconcileError> {
        self.ticks += 1;
        if self.ticks >= self.interval {
            self.ticks = 0;
            self.check()
        } else {
            Ok(())
        }
    }
}

/// Half-open window `[old_start, old_end) x [new_start, new_end)`.
#[derive(Clone, Copy, Debug)]
struct Range {
    old_start: usize,
    old_end: usize,
    new_start: usize,
    new_end: usize,
}

impl Range {
    fn old_size(&self) -> usize {
        self.old_end - self.old_start
    }

    fn new_size(&self) -> usize {
        self.new_end - self.new_start
    }
}

/// A run of matches in both lists: `old[x..x + size]` pairs with
/// `new[y..y + size]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Diagonal {
    x: usize,
    y: usize,
    size: usize,
}

/// Path segment found by the middle-snake search: at most one insertion or
/// removal followed (or, for reverse snakes, preceded) by a diagonal.
#[derive(Clone, Copy, Debug)]
struct Snake {
    start_x: isize,
    start_y: isize,
    end_x: isize,
    end_y: isize,
    reverse: bool,
}

impl Snake {
    fn has_addition_or_removal(&self) -> bool {
        self.end_y - self.start_y != self.end_x - self.start_x
    }

    fn is_addition(&self) -> bool {
        self.end_y - self.start_y > self.end_x - self.start_x
    }

    fn diagonal_size(&self) -> isize {
        (self.end_x - self.start_x).min(self.end_y - self.start_y)
    }

    fn to_diagonal(self) -> Diagonal {
        let size = self.diagonal_size() as usize;
        let (x, y) = if !self.has_addition_or_removal() || self.reverse {
            // Edit (if any) sits after the diagonal
            (self.start_x, self.start_y)
        } else if self.is_addition() {
            (self.start_x, self.start_y + 1)
        } else {
            (self.start_x + 1, self.start_y)
        };
        Diagonal {
            x: x as usize,
            y: y as usize,
            size,
        }
    }
}

/// Furthest-reaching x per diagonal `k`, indexed from `-mid..=mid`.
struct CenteredArray {
    data: Vec<isize>,
    mid: isize,
}

impl CenteredArray {
    fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
            mid: (size / 2) as isize,
        }
    }

    fn get(&self, index: isize) -> isize {
        self.data[(index + self.mid) as usize]
    }

    fn set(&mut self, index: isize, value: isize) {
        self.data[(index + self.mid) as usize] = value;
    }
}

fn find_diagonals<C>(
    callback: &C,
    checkpoint: &mut Checkpoint<'_>,
) -> Result<Vec<Diagonal>, ReconcileError>
where
    C: DiffCallback + ?Sized,
{
    let old_len = callback.old_len();
    let new_len = callback.new_len();
    let max = (old_len + new_len).div_ceil(2);
    let mut forward = CenteredArray::new(max * 2 + 1);
    let mut backward = CenteredArray::new(max * 2 + 1);

    let mut diagonals = Vec::new();
    let mut stack = vec![Range {
        old_start: 0,
        old_end: old_len,
        new_start: 0,
        new_end: new_len,
    }];

    while let Some(range) = stack.pop() {
        checkpoint.check()?;
        let Some(snake) = mid_point(&range, callback, &mut forward, &mut backward, checkpoint)?
        else {
            continue;
        };
        if snake.diagonal_size() > 0 {
            diagonals.push(snake.to_diagonal());
        }
        stack.push(Range {
            old_start: range.old_start,
            old_end: snake.start_x as usize,
            new_start: range.new_start,
            new_end: snake.start_y as usize,
        });
        stack.push(Range {
            old_start: snake.end_x as usize,
            old_end: range.old_end,
            new_start: snake.end_y as usize,
            new_end: range.new_end,
        });
    }

    diagonals.sort_by_key(|diagonal| diagonal.x);
    Ok(diagonals)
}

fn mid_point<C>(
    range: &Range,
    callback: &C,
    forward: &mut CenteredArray,
    backward: &mut CenteredArray,
    checkpoint: &mut Checkpoint<'_>,
) -> Result<Option<Snake>, ReconcileError>
where
    C: DiffCallback + ?Sized,
{
    if range.old_size() == 0 || range.new_size() == 0 {
        return Ok(None);
    }
    let max = (range.old_size() + range.new_size()).div_ceil(2) as isize;
    forward.set(1, range.old_start as isize);
    backward.set(1, range.old_end as isize);
    for d in 0..max {
        checkpoint.tick()?;
        if let Some(snake) = forward_step(range, callback, forward, backward, d) {
            return Ok(Some(snake));
        }
        if let Some(snake) = backward_step(range, callback, forward, backward, d) {
            return Ok(Some(snake));
        }
    }
    Ok(None)
}

fn forward_step<C>(
    range: &Range,
    callback: &C,
    forward: &mut CenteredArray,
    backward: &CenteredArray,
    d: isize,
) -> Option<Snake>
where
    C: DiffCallback + ?Sized,
{
    let delta = range.old_size() as isize - range.new_size() as isize;
    let check_for_snake = delta.abs() % 2 == 1;
    let old_start = range.old_start as isize;
    let old_end = range.old_end as isize;
    let new_start = range.new_start as isize;
    let new_end = range.new_end as isize;

    let mut k = -d;
    while k <= d {
        // Either step down from k + 1 (insertion) or right from k - 1 (removal)
        let (start_x, mut x) = if k == -d || (k != d && forward.get(k + 1) > forward.get(k - 1)) {
            let x = forward.get(k + 1);
            (x, x)
        } else {
            let x = forward.get(k - 1);
            (x, x + 1)
        };
        let mut y = new_start + (x - old_start) - k;
        let start_y = if d == 0 || x != start_x { y } else { y - 1 };
        while x < old_end && y < new_end && callback.are_items_the_same(x as usize, y as usize) {
            x += 1;
            y += 1;
        }
        forward.set(k, x);
        if check_for_snake {
            let backward_k = delta - k;
            if backward_k >= -d + 1 && backward_k <= d - 1 && backward.get(backward_k) <= x {
                return Some(Snake {
                    start_x,
                    start_y,
                    end_x: x,
                    end_y: y,
                    reverse: false,
                });
            }
        }
        k += 2;
    }
    None
}

fn backward_step<C>(
    range: &Range,
    callback: &C,
    forward: &CenteredArray,
    backward: &mut CenteredArray,
    d: isize,
) -> Option<Snake>
where
    C: DiffCallback + ?Sized,
{
    let delta = range.old_size() as isize - range.new_size() as isize;
    let check_for_snake = delta % 2 == 0;
    let old_start = range.old_start as isize;
    let old_end = range.old_end as isize;
    let new_start = range.new_start as isize;
    let new_end = range.new_end as isize;

    let mut k = -d;
    while k <= d {
        // Walking from the end we minimise x; ties prefer removals
        let (start_x, mut x) = if k == -d || (k != d && backward.get(k + 1) < backward.get(k - 1))
        {
            let x = backward.get(k + 1);
            (x, x)
        } else {
            let x = backward.get(k - 1);
            (x, x - 1)
        };
        let mut y = new_end - ((old_end - x) - k);
        let start_y = if d == 0 || x != start_x { y } else { y + 1 };
        while x > old_start
            && y > new_start
            && callback.are_items_the_same((x - 1) as usize, (y - 1) as usize)
        {
            x -= 1;
            y -= 1;
        }
        backward.set(k, x);
        if check_for_snake {
            let forward_k = delta - k;
            if forward_k >= -d && forward_k <= d && forward.get(forward_k) >= x {
                return Some(Snake {
                    start_x: x,
                    start_y: y,
                    end_x: start_x,
                    end_y: start_y,
                    reverse: true,
                });
            }
        }
        k += 2;
    }
    None
}

fn build_script<C>(
    callback: &C,
    diagonals: &[Diagonal],
    options: &DiffOptions,
    checkpoint: &mut Checkpoint<'_>,
) -> Result<EditScript, ReconcileError>
where
    C: DiffCallback + ?Sized,
{
    let old_len = callback.old_len();
    let new_len = callback.new_len();

    let mut old_match: Vec<Option<usize>> = vec![None; old_len];
    let mut new_match: Vec<Option<usize>> = vec![None; new_len];
    let mut moved = vec![false; new_len];

    for diagonal in diagonals {
        for offset in 0..diagonal.size {
            old_match[diagonal.x + offset] = Some(diagonal.y + offset);
            new_match[diagonal.y + offset] = Some(diagonal.x + offset);
        }
    }

    if options.detect_moves {
        let mut unmatched_new: Vec<usize> =
            (0..new_len).filter(|&pos| new_match[pos].is_none()).collect();
        for old_pos in 0..old_len {
            if old_match[old_pos].is_some() || unmatched_new.is_empty() {
                continue;
            }
            checkpoint.tick()?;
            let found = unmatched_new
                .iter()
                .position(|&new_pos| callback.are_items_the_same(old_pos, new_pos));
            if let Some(slot) = found {
                let new_pos = unmatched_new.remove(slot);
                old_match[old_pos] = Some(new_pos);
                new_match[new_pos] = Some(old_pos);
                moved[new_pos] = true;
            }
        }
    }

    let mut builder = ScriptBuilder::default();

    for old_pos in (0..old_len).rev() {
        if old_match[old_pos].is_none() {
            builder.remove(old_pos);
        }
    }

    // Surviving rows in their current order, each tagged with its destination
    let mut rows: Vec<usize> = old_match.iter().filter_map(|dest| *dest).collect();
    for new_pos in (0..new_len).filter(|&pos| moved[pos]) {
        checkpoint.tick()?;
        let Some(from) = rows.iter().position(|&dest| dest == new_pos) else {
            continue;
        };
        // Everything headed before `new_pos` is already in final relative order
        let anchor = rows.iter().rposition(|&dest| dest < new_pos);
        let row = rows.remove(from);
        let to = match anchor {
            Some(anchor) if from < anchor => anchor,
            Some(anchor) => anchor + 1,
            None => 0,
        };
        rows.insert(to, row);
        if from != to {
            builder.move_item(from, to);
        }
    }

    for new_pos in 0..new_len {
        if new_match[new_pos].is_none() {
            builder.insert(new_pos);
        }
    }

    for (new_pos, old_pos) in new_match.iter().enumerate() {
        let Some(old_pos) = *old_pos else {
            continue;
        };
        checkpoint.tick()?;
        if !callback.are_contents_the_same(old_pos, new_pos) {
            builder.change(new_pos);
        }
    }

    Ok(builder.build(old_len, new_len))
}
