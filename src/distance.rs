//! Levenshtein distance

/// Unit-cost edit distance between `a` and `b`, over Unicode scalar values.
pub fn edit_distance(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    edit_distance_chars(&a, &b)
}

pub fn edit_distance_chars(a: &[char], b: &[char]) -> usize {
    // Strip common prefix/suffix first for speed
    let pfx = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let (a, b) = (&a[pfx..], &b[pfx..]);
    let sfx = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (a, b) = (&a[..a.len() - sfx], &b[..b.len() - sfx]);

    // Keep the row over the shorter string
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr: Vec<usize> = vec![0; short.len() + 1];
    for (i, lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let cost = usize::from(lc != sc);
            curr[j + 1] = (curr[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}
