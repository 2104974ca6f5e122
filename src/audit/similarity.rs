//! Invoice number similarity helpers / 发票号相似度

use once_cell::sync::Lazy;
use regex::Regex;

static SPECIAL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Drop everything except ASCII letters and digits / 去除特殊字符
pub fn strip_special(s: &str) -> String {
    SPECIAL_CHARS.replace_all(s, "").into_owned()
}

/// Levenshtein edit distance / 计算 Levenshtein 编辑距离
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 { return len2; }
    if len2 == 0 { return len1; }

    // Two rolling rows are enough
    let mut prev: Vec<usize> = (0..=len2).collect();
    let mut curr = vec![0usize; len2 + 1];

    for i in 1..=len1 {
        curr[0] = i;
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[len2]
}

/// Similarity in [0, 1]: 1 - distance / longer length / 相似度
pub fn similarity_ratio(s1: &str, s2: &str) -> f64 {
    let longest = s1.chars().count().max(s2.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(s1, s2) as f64 / longest as f64
}

/// Same invoice once special characters are removed / 去除特殊字符后相同
pub fn same_when_stripped(s1: &str, s2: &str) -> bool {
    let a = strip_special(s1);
    !a.is_empty() && a == strip_special(s2)
}

/// Near duplicate: equal when stripped, or similar enough as written / 近似重复
pub fn is_near_duplicate(s1: &str, s2: &str, threshold: f64) -> bool {
    same_when_stripped(s1, s2) || similarity_ratio(s1, s2) >= threshold
}
