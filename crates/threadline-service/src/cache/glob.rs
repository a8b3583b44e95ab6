//! Redis `KEYS`-style glob matching for the in-memory backend.
//!
//! Supports `*`, `?`, `[abc]`, `[a-z]`, `[^a]` and `\` escapes.

/// Returns true if `key` matches `pattern`.
#[must_use]
pub fn matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0, 0);
    // position of the last `*` and the key index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    backtrack = Some((p, k));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    k += 1;
                    continue;
                }
                '[' => {
                    if let Some((matched, next)) = match_class(&pattern, p, key[k]) {
                        if matched {
                            p = next;
                            k += 1;
                            continue;
                        }
                    } else if key[k] == '[' {
                        // unterminated class is a literal bracket
                        p += 1;
                        k += 1;
                        continue;
                    }
                }
                '\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == key[k] {
                        p += 2;
                        k += 1;
                        continue;
                    }
                }
                c => {
                    if c == key[k] {
                        p += 1;
                        k += 1;
                        continue;
                    }
                }
            }
        }

        match backtrack {
            Some((star, tried)) => {
                p = star + 1;
                k = tried + 1;
                backtrack = Some((star, tried + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Matches `c` against the class starting at `pattern[start] == '['`.
///
/// Returns whether it matched and the index just past the closing `]`, or
/// `None` if the class is not terminated.
fn match_class(pattern: &[char], start: usize, c: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negated = pattern.get(i) == Some(&'^');
    if negated {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    loop {
        let current = *pattern.get(i)?;
        if current == ']' && !first {
            break;
        }
        first = false;

        if current == '\\' {
            let escaped = *pattern.get(i + 1)?;
            matched |= escaped == c;
            i += 2;
        } else if pattern.get(i + 1) == Some(&'-') && pattern.get(i + 2).is_some_and(|&end| end != ']') {
            let end = pattern[i + 2];
            let (lo, hi) = if current <= end { (current, end) } else { (end, current) };
            matched |= lo <= c && c <= hi;
            i += 3;
        } else {
            matched |= current == c;
            i += 1;
        }
    }

    Some((matched != negated, i + 1))
}
