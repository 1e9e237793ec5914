//! Sequence diff: Myers O(ND) difference algorithm over slices.
//!
//! Elements are compared with `==`; the patch generator feeds it identity
//! keys so that a container only matches itself. The result is a list of
//! counted runs. [`edit_script`] additionally pairs adjacent insert/delete
//! runs into replace runs.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOp {
    Equal,
    Insert,
    Delete,
    /// Consumes one element of each side.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub op: RunOp,
    pub len: usize,
}

/// Appends a run, merging it into the last one if the op matches. Empty
/// runs are dropped.
fn push_run(out: &mut Vec<Run>, op: RunOp, len: usize) {
    if len == 0 {
        return;
    }
    match out.last_mut() {
        Some(last) if last.op == op => last.len += len,
        _ => out.push(Run { op, len }),
    }
}

/// Raw diff: equal, insert and delete runs turning `src` into `dst`.
pub fn diff<T: PartialEq>(src: &[T], dst: &[T]) -> Vec<Run> {
    let mut out = Vec::new();
    diff_internal(src, dst, &mut out);
    out
}

/// Diff with adjacent insert/delete runs fused into replace runs.
pub fn edit_script<T: PartialEq>(src: &[T], dst: &[T]) -> Vec<Run> {
    coalesce(diff(src, dst))
}

/// Element-wise comparison of two equally long slices.
pub fn positional<T: PartialEq>(src: &[T], dst: &[T]) -> Vec<Run> {
    let mut out = Vec::new();
    for (a, b) in src.iter().zip(dst) {
        push_run(&mut out, if a == b { RunOp::Equal } else { RunOp::Replace }, 1);
    }
    let shared = src.len().min(dst.len());
    push_run(&mut out, RunOp::Delete, src.len() - shared);
    push_run(&mut out, RunOp::Insert, dst.len() - shared);
    out
}

/// Fuses each adjacent delete/insert pair (either order) into a replace run
/// of the shorter length followed by the leftover of the longer one.
pub fn coalesce(runs: Vec<Run>) -> Vec<Run> {
    let mut out = Vec::with_capacity(runs.len());
    let mut runs = runs.into_iter().peekable();
    let mut pending: Option<Run> = None;
    loop {
        let Some(current) = pending.take().or_else(|| runs.next()) else {
            break;
        };
        if let Some(&next) = runs.peek() {
            if pairs(current.op, next.op) {
                runs.next();
                let shared = current.len.min(next.len);
                push_run(&mut out, RunOp::Replace, shared);
                if current.len > shared {
                    pending = Some(Run {
                        op: current.op,
                        len: current.len - shared,
                    });
                } else if next.len > shared {
                    pending = Some(Run {
                        op: next.op,
                        len: next.len - shared,
                    });
                }
                continue;
            }
        }
        push_run(&mut out, current.op, current.len);
    }
    out
}

fn pairs(a: RunOp, b: RunOp) -> bool {
    matches!(
        (a, b),
        (RunOp::Delete, RunOp::Insert) | (RunOp::Insert, RunOp::Delete)
    )
}

// ── Core diff algorithm ───────────────────────────────────────────────────

fn common_prefix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

fn find_slice<T: PartialEq>(haystack: &[T], needle: &[T]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn diff_internal<T: PartialEq>(src: &[T], dst: &[T], out: &mut Vec<Run>) {
    if src == dst {
        push_run(out, RunOp::Equal, src.len());
        return;
    }

    let prefix = common_prefix(src, dst);
    let (src, dst) = (&src[prefix..], &dst[prefix..]);
    let suffix = common_suffix(src, dst);
    let (src, dst) = (&src[..src.len() - suffix], &dst[..dst.len() - suffix]);

    push_run(out, RunOp::Equal, prefix);
    diff_no_common_affix(src, dst, out);
    push_run(out, RunOp::Equal, suffix);
}

fn diff_no_common_affix<T: PartialEq>(src: &[T], dst: &[T], out: &mut Vec<Run>) {
    if src.is_empty() {
        push_run(out, RunOp::Insert, dst.len());
        return;
    }
    if dst.is_empty() {
        push_run(out, RunOp::Delete, src.len());
        return;
    }

    // Shorter side contained in the longer one.
    let (long, short, long_is_src) = if src.len() > dst.len() {
        (src, dst, true)
    } else {
        (dst, src, false)
    };
    if let Some(idx) = find_slice(long, short) {
        let edge = if long_is_src { RunOp::Delete } else { RunOp::Insert };
        push_run(out, edge, idx);
        push_run(out, RunOp::Equal, short.len());
        push_run(out, edge, long.len() - idx - short.len());
        return;
    }

    if short.len() == 1 {
        push_run(out, RunOp::Delete, src.len());
        push_run(out, RunOp::Insert, dst.len());
        return;
    }

    bisect(src, dst, out);
}

/// Furthest `x` reached on each diagonal by one direction of the search.
struct Frontier {
    reach: Vec<i64>,
    start: i64,
    end: i64,
}

impl Frontier {
    fn new(size: usize, offset: usize) -> Self {
        let mut reach = vec![-1; size];
        reach[offset + 1] = 0;
        Frontier { reach, start: 0, end: 0 }
    }

    /// Extends diagonal `k` at depth `d` along the snake of matching pairs.
    /// Returns `None` once the walk leaves the grid, narrowing the band.
    fn step(&mut self, d: i64, k: i64, offset: i64, n: i64, m: i64, same: impl Fn(usize, usize) -> bool) -> Option<(i64, i64)> {
        let at = (offset + k) as usize;
        let mut x = if k == -d || (k != d && self.reach[at - 1] < self.reach[at + 1]) {
            self.reach[at + 1]
        } else {
            self.reach[at - 1] + 1
        };
        let mut y = x - k;
        while x < n && y < m && same(x as usize, y as usize) {
            x += 1;
            y += 1;
        }
        self.reach[at] = x;
        if x > n {
            self.end += 2;
            None
        } else if y > m {
            self.start += 2;
            None
        } else {
            Some((x, y))
        }
    }

    fn at(&self, k: i64) -> Option<i64> {
        let x = *self.reach.get(usize::try_from(k).ok()?)?;
        (x != -1).then_some(x)
    }
}

fn bisect<T: PartialEq>(src: &[T], dst: &[T], out: &mut Vec<Run>) {
    let n = src.len() as i64;
    let m = dst.len() as i64;
    let max_d = (src.len() + dst.len()).div_ceil(2) + 1;
    let offset = max_d as i64;
    let mut fwd = Frontier::new(2 * max_d, max_d);
    let mut rev = Frontier::new(2 * max_d, max_d);
    let delta = n - m;
    let odd = delta % 2 != 0;

    for d in 0..offset {
        let mut k = -d + fwd.start;
        while k <= d - fwd.end {
            let step = fwd.step(d, k, offset, n, m, |x, y| src[x] == dst[y]);
            if let Some((x, y)) = step.filter(|_| odd) {
                if rev.at(offset + delta - k).is_some_and(|rx| x >= n - rx) {
                    return bisect_split(src, dst, x as usize, y as usize, out);
                }
            }
            k += 2;
        }

        let mut k = -d + rev.start;
        while k <= d - rev.end {
            let step = rev.step(d, k, offset, n, m, |x, y| {
                src[src.len() - 1 - x] == dst[dst.len() - 1 - y]
            });
            if let Some((x, _)) = step.filter(|_| !odd) {
                let fk = offset + delta - k;
                if let Some(fx) = fwd.at(fk).filter(|&fx| fx >= n - x) {
                    let fy = offset + fx - fk;
                    return bisect_split(src, dst, fx as usize, fy as usize, out);
                }
            }
            k += 2;
        }
    }

    push_run(out, RunOp::Delete, src.len());
    push_run(out, RunOp::Insert, dst.len());
}

fn bisect_split<T: PartialEq>(src: &[T], dst: &[T], x: usize, y: usize, out: &mut Vec<Run>) {
    diff_internal(&src[..x], &dst[..y], out);
    diff_internal(&src[x..], &dst[y..], out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(op: RunOp, len: usize) -> Run {
        Run { op, len }
    }

    /// Replays runs over `src`, taking inserted/replacing items from `dst`.
    fn replay<T: Clone>(runs: &[Run], src: &[T], dst: &[T]) -> Vec<T> {
        let (mut i, mut j) = (0, 0);
        let mut result = Vec::new();
        for r in runs {
            match r.op {
                RunOp::Equal => {
                    result.extend_from_slice(&src[i..i + r.len]);
                    i += r.len;
                    j += r.len;
                }
                RunOp::Insert => {
                    result.extend_from_slice(&dst[j..j + r.len]);
                    j += r.len;
                }
                RunOp::Delete => i += r.len,
                RunOp::Replace => {
                    result.extend_from_slice(&dst[j..j + r.len]);
                    i += r.len;
                    j += r.len;
                }
            }
        }
        assert_eq!(i, src.len());
        assert_eq!(j, dst.len());
        result
    }

    #[test]
    fn identical_inputs() {
        assert_eq!(diff(&[1, 2, 3], &[1, 2, 3]), vec![run(RunOp::Equal, 3)]);
        assert!(diff::<i32>(&[], &[]).is_empty());
    }

    #[test]
    fn front_removal() {
        assert_eq!(
            diff(&[1, 2, 3, 4, 5], &[3, 4, 5]),
            vec![run(RunOp::Delete, 2), run(RunOp::Equal, 3)]
        );
    }

    #[test]
    fn trailing_removal() {
        assert_eq!(
            diff(&[1, 2, 3, 4, 5], &[1, 2, 3]),
            vec![run(RunOp::Equal, 3), run(RunOp::Delete, 2)]
        );
    }

    #[test]
    fn middle_insertion() {
        assert_eq!(
            diff(&[1, 2, 3], &[1, 9, 9, 2, 3]),
            vec![run(RunOp::Equal, 1), run(RunOp::Insert, 2), run(RunOp::Equal, 2)]
        );
    }

    #[test]
    fn coalesce_pairs_delete_and_insert() {
        let runs = vec![
            run(RunOp::Delete, 2),
            run(RunOp::Insert, 4),
            run(RunOp::Equal, 1),
            run(RunOp::Insert, 1),
            run(RunOp::Delete, 3),
        ];
        assert_eq!(
            coalesce(runs),
            vec![
                run(RunOp::Replace, 2),
                run(RunOp::Insert, 2),
                run(RunOp::Equal, 1),
                run(RunOp::Replace, 1),
                run(RunOp::Delete, 2),
            ]
        );
    }

    #[test]
    fn edit_script_replays_to_target() {
        let src = [1, 2, 3, 4, 5];
        let dst = [10, 11, 14, 15, 3, 12, 13, 5];
        let runs = edit_script(&src, &dst);
        assert_eq!(replay(&runs, &src, &dst), dst);
        let equal: usize = runs.iter().filter(|r| r.op == RunOp::Equal).map(|r| r.len).sum();
        assert_eq!(equal, 2);
    }

    #[test]
    fn bisect_finds_interleaved_matches() {
        let src: Vec<u32> = (0..40).collect();
        let dst: Vec<u32> = (0..40).filter(|n| n % 3 != 0).chain([100, 101]).collect();
        let runs = diff(&src, &dst);
        assert_eq!(replay(&runs, &src, &dst), dst);
        let equal: usize = runs.iter().filter(|r| r.op == RunOp::Equal).map(|r| r.len).sum();
        assert_eq!(equal, 26);
    }

    #[test]
    fn positional_marks_differences() {
        assert_eq!(
            positional(&[1, 2, 3], &[1, 5, 3]),
            vec![run(RunOp::Equal, 1), run(RunOp::Replace, 1), run(RunOp::Equal, 1)]
        );
    }

    #[test]
    fn cost_tracks_edit_count_not_length() {
        let src: Vec<u32> = (0..10_000).collect();
        let mut dst = src.clone();
        dst.remove(5_000);
        dst.insert(100, 99_999);
        let runs = edit_script(&src, &dst);
        assert!(runs.len() <= 5);
        assert_eq!(replay(&runs, &src, &dst), dst);
    }
}
