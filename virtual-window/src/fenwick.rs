/// Prefix sums over item sizes with `O(log n)` offset → index lookups.
#[derive(Clone, Debug, Default)]
pub(crate) struct Fenwick {
    tree: Vec<f64>, // 1-indexed
    total: f64,
    max_bit: usize,
}

impl Fenwick {
    pub(crate) fn from_sizes(sizes: &[f64]) -> Self {
        let n = sizes.len();
        let mut tree = vec![0.0f64; n + 1];
        let mut total = 0.0f64;
        for i in 1..=n {
            let v = sizes[i - 1];
            total += v;
            tree[i] += v;
            let j = i + lsb(i);
            if j <= n {
                tree[j] += tree[i];
            }
        }
        Self {
            tree,
            total,
            max_bit: highest_power_of_two_leq(n),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    /// Sum of the first `count` sizes, i.e. the start offset of item `count`.
    pub(crate) fn prefix_sum(&self, count: usize) -> f64 {
        let mut i = count.min(self.len());
        let mut sum = 0.0;
        while i > 0 {
            sum += self.tree[i];
            i &= i - 1;
        }
        sum
    }

    pub(crate) fn total(&self) -> f64 {
        self.total
    }

    /// Number of items that end at or before `target`.
    ///
    /// This is the index of the item under `target` (or `len()` past the end).
    pub(crate) fn count_ending_at_or_before(&self, target: f64) -> usize {
        self.descend(target, |node, rest| node <= rest)
    }

    /// Number of items that end strictly before `target`.
    pub(crate) fn count_ending_before(&self, target: f64) -> usize {
        self.descend(target, |node, rest| node < rest)
    }

    fn descend(&self, mut target: f64, take: impl Fn(f64, f64) -> bool) -> usize {
        let n = self.len();
        let mut idx = 0usize;
        let mut bit = self.max_bit;
        while bit != 0 {
            let next = idx + bit;
            if next <= n && take(self.tree[next], target) {
                target -= self.tree[next];
                idx = next;
            }
            bit >>= 1;
        }
        idx
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn highest_power_of_two_leq(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut p = 1usize;
    while p <= n / 2 {
        p <<= 1;
    }
    p
}
