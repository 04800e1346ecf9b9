//! Longest common subsequence.
//!
//! Myers' O(ND) shortest-edit-script search over the edit graph, keeping one
//! history per diagonal path rather than per node, and trimming items that
//! are equal at the beginning and end before searching. Cost stays close to
//! linear in the edit distance rather than quadratic in the input lengths.
//!
//! The same routine drives both the character-level text differ and the
//! sibling-alignment step of the script builder.

use rustc_hash::FxHashMap;

/// Returns the index pairs `(left, right)` of one longest common subsequence
/// of `left` and `right` under `eq`, in increasing order on both sides.
pub fn longest_common_subsequence<T, F>(left: &[T], right: &[T], eq: F) -> Vec<(usize, usize)>
where
    F: Fn(&T, &T) -> bool,
{
    let lslen = left.len();
    let rslen = right.len();
    let mut start = 0;
    let mut lend = lslen;
    let mut rend = rslen;

    // Trim off the matching items at the beginning
    while start < lend && start < rend && eq(&left[start], &right[start]) {
        start += 1;
    }
    // and at the end.
    while start < lend && start < rend && eq(&left[lend - 1], &right[rend - 1]) {
        lend -= 1;
        rend -= 1;
    }

    let l = &left[start..lend];
    let r = &right[start..rend];
    let lmax = l.len();
    let rmax = r.len();

    if lmax + rmax == 0 {
        // The sequences are equal.
        return (0..lslen).map(|i| (i, i)).collect();
    }

    let mut furthest: FxHashMap<i64, (usize, Vec<(usize, usize)>)> = FxHashMap::default();
    furthest.insert(1, (0, Vec::new()));

    for d in 0..=(lmax + rmax) as i64 {
        let mut k = -d;
        while k <= d {
            let go_down =
                k == -d || (k != d && furthest[&(k - 1)].0 < furthest[&(k + 1)].0);
            let (mut x, mut history) = if go_down {
                let (x, history) = &furthest[&(k + 1)];
                (*x, history.clone())
            } else {
                let (x, history) = &furthest[&(k - 1)];
                (*x + 1, history.clone())
            };
            let mut y = (x as i64 - k) as usize;

            while x < lmax && y < rmax && eq(&l[x], &r[y]) {
                history.push((x + start, y + start));
                x += 1;
                y += 1;
            }

            if x >= lmax && y >= rmax {
                let mut result: Vec<(usize, usize)> = (0..start).map(|i| (i, i)).collect();
                result.extend(history);
                result.extend((lend..lslen).zip(rend..rslen));
                return result;
            }
            furthest.insert(k, (x, history));
            k += 2;
        }
    }
    unreachable!("the edit graph search reaches the sink by d = |left| + |right|")
}
