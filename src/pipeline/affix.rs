use std::cmp::Reverse;

use once_cell::sync::Lazy;
use regex::Regex;

// Operator/route qualifiers seen around station and line names in
// announcements. Stripping them leaves the canonical entity the store and
// knowledge base key on.
pub const ENTITY_PREFIXES: [&str; 9] = [
    "京都市営地下鉄",
    "名古屋市営地下鉄",
    "東京メトロ",
    "東急",
    "都営",
    "快速",
    "JR",
    "快速アクティー",
    "アクティー",
];

pub const ENTITY_SUFFIXES: [&str; 28] = [
    "鉄道大雄山線",
    "アーバンパークライン",
    "ディズニーリゾートライン",
    "エクスプレス",
    "スカイライナー",
    "ニューシャトル",
    "モノレール",
    "リゾートライン",
    "市営地下鉄ブルーライン",
    "地下鉄ブルーライン",
    "ブルーライン",
    "ライン",
    "新幹線",
    "本線",
    "空港線",
    "環状線",
    "地下鉄",
    "メトロ線",
    "方面行き",
    "方面",
    "行き",
    "鉄道",
    "線",
    "駅",
    "号",
    "シーサイド",
    "ヒカリエShinQs前",
    "三丁目",
];

static PREFIXES_BY_LEN: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut v = ENTITY_PREFIXES.to_vec();
    v.sort_by_key(|s| Reverse(s.chars().count()));
    v
});

static SUFFIXES_BY_LEN: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut v = ENTITY_SUFFIXES.to_vec();
    v.sort_by_key(|s| Reverse(s.chars().count()));
    v
});

static NUMBERED_GOU_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9０-９]+号$").expect("numbered gou regex"));

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AffixSplit {
    pub core: String,
    pub prefix: String,
    pub suffix: String,
}

/// Splits an entity surface into qualifier prefix, core, and qualifier
/// suffix. `prefix + core + suffix` reproduces the input whenever anything
/// was stripped; a split that would empty the core reverts to the input.
pub fn strip_affixes(text: &str) -> AffixSplit {
    let mut remainder = text;
    let mut suffix = "";

    if let Some(m) = NUMBERED_GOU_RE.find(text) {
        suffix = m.as_str();
        remainder = &text[..m.start()];
    } else {
        for cand in SUFFIXES_BY_LEN.iter() {
            // Bare 号 only strips as part of a trailing number.
            if *cand == "号" {
                continue;
            }
            if remainder.ends_with(cand) {
                suffix = cand;
                remainder = &remainder[..remainder.len() - cand.len()];
                break;
            }
        }
    }

    let mut prefix = "";
    for cand in PREFIXES_BY_LEN.iter() {
        if remainder.starts_with(cand) {
            prefix = cand;
            remainder = &remainder[cand.len()..];
            break;
        }
    }

    if remainder.is_empty() {
        return AffixSplit {
            core: text.to_string(),
            prefix: String::new(),
            suffix: String::new(),
        };
    }
    AffixSplit {
        core: remainder.to_string(),
        prefix: prefix.to_string(),
        suffix: suffix.to_string(),
    }
}
