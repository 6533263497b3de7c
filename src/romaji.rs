use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::textutil::capitalize_first;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Script {
    Hiragana,
    Katakana,
    Han,
    Latin,
    Other,
}

fn script_of(c: char) -> Script {
    match c {
        'ぁ'..='ゖ' | 'ゝ' | 'ゞ' => Script::Hiragana,
        'ァ'..='ヺ' | 'ー' | 'ヽ' | 'ヾ' => Script::Katakana,
        c if ('\u{4e00}'..='\u{9fff}').contains(&c) => Script::Han,
        c if c.is_ascii_alphanumeric() => Script::Latin,
        _ => Script::Other,
    }
}

static KATA_DIGRAPHS: Lazy<HashMap<(char, char), &'static str>> = Lazy::new(|| {
    [
        (('キ', 'ャ'), "kya"),
        (('キ', 'ュ'), "kyu"),
        (('キ', 'ョ'), "kyo"),
        (('シ', 'ャ'), "sha"),
        (('シ', 'ュ'), "shu"),
        (('シ', 'ョ'), "sho"),
        (('シ', 'ェ'), "she"),
        (('チ', 'ャ'), "cha"),
        (('チ', 'ュ'), "chu"),
        (('チ', 'ョ'), "cho"),
        (('チ', 'ェ'), "che"),
        (('ニ', 'ャ'), "nya"),
        (('ニ', 'ュ'), "nyu"),
        (('ニ', 'ョ'), "nyo"),
        (('ヒ', 'ャ'), "hya"),
        (('ヒ', 'ュ'), "hyu"),
        (('ヒ', 'ョ'), "hyo"),
        (('ミ', 'ャ'), "mya"),
        (('ミ', 'ュ'), "myu"),
        (('ミ', 'ョ'), "myo"),
        (('リ', 'ャ'), "rya"),
        (('リ', 'ュ'), "ryu"),
        (('リ', 'ョ'), "ryo"),
        (('ギ', 'ャ'), "gya"),
        (('ギ', 'ュ'), "gyu"),
        (('ギ', 'ョ'), "gyo"),
        (('ジ', 'ャ'), "ja"),
        (('ジ', 'ュ'), "ju"),
        (('ジ', 'ョ'), "jo"),
        (('ジ', 'ェ'), "je"),
        (('ビ', 'ャ'), "bya"),
        (('ビ', 'ュ'), "byu"),
        (('ビ', 'ョ'), "byo"),
        (('ピ', 'ャ'), "pya"),
        (('ピ', 'ュ'), "pyu"),
        (('ピ', 'ョ'), "pyo"),
        (('フ', 'ァ'), "fa"),
        (('フ', 'ィ'), "fi"),
        (('フ', 'ェ'), "fe"),
        (('フ', 'ォ'), "fo"),
        (('ウ', 'ィ'), "wi"),
        (('ウ', 'ェ'), "we"),
        (('ウ', 'ォ'), "wo"),
        (('ヴ', 'ァ'), "va"),
        (('ヴ', 'ィ'), "vi"),
        (('ヴ', 'ェ'), "ve"),
        (('ヴ', 'ォ'), "vo"),
        (('テ', 'ィ'), "ti"),
        (('デ', 'ィ'), "di"),
        (('ト', 'ゥ'), "tu"),
        (('ド', 'ゥ'), "du"),
        (('デ', 'ュ'), "dyu"),
    ]
    .into_iter()
    .collect()
});

static KATA_MONOGRAPHS: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    [
        ('ア', "a"),
        ('イ', "i"),
        ('ウ', "u"),
        ('エ', "e"),
        ('オ', "o"),
        ('カ', "ka"),
        ('キ', "ki"),
        ('ク', "ku"),
        ('ケ', "ke"),
        ('コ', "ko"),
        ('サ', "sa"),
        ('シ', "shi"),
        ('ス', "su"),
        ('セ', "se"),
        ('ソ', "so"),
        ('タ', "ta"),
        ('チ', "chi"),
        ('ツ', "tsu"),
        ('テ', "te"),
        ('ト', "to"),
        ('ナ', "na"),
        ('ニ', "ni"),
        ('ヌ', "nu"),
        ('ネ', "ne"),
        ('ノ', "no"),
        ('ハ', "ha"),
        ('ヒ', "hi"),
        ('フ', "fu"),
        ('ヘ', "he"),
        ('ホ', "ho"),
        ('マ', "ma"),
        ('ミ', "mi"),
        ('ム', "mu"),
        ('メ', "me"),
        ('モ', "mo"),
        ('ヤ', "ya"),
        ('ユ', "yu"),
        ('ヨ', "yo"),
        ('ラ', "ra"),
        ('リ', "ri"),
        ('ル', "ru"),
        ('レ', "re"),
        ('ロ', "ro"),
        ('ワ', "wa"),
        ('ヲ', "o"),
        ('ン', "n"),
        ('ガ', "ga"),
        ('ギ', "gi"),
        ('グ', "gu"),
        ('ゲ', "ge"),
        ('ゴ', "go"),
        ('ザ', "za"),
        ('ジ', "ji"),
        ('ズ', "zu"),
        ('ゼ', "ze"),
        ('ゾ', "zo"),
        ('ダ', "da"),
        ('ヂ', "ji"),
        ('ヅ', "zu"),
        ('デ', "de"),
        ('ド', "do"),
        ('バ', "ba"),
        ('ビ', "bi"),
        ('ブ', "bu"),
        ('ベ', "be"),
        ('ボ', "bo"),
        ('パ', "pa"),
        ('ピ', "pi"),
        ('プ', "pu"),
        ('ペ', "pe"),
        ('ポ', "po"),
        ('ヴ', "vu"),
        ('ァ', "a"),
        ('ィ', "i"),
        ('ゥ', "u"),
        ('ェ', "e"),
        ('ォ', "o"),
        ('ャ', "ya"),
        ('ュ', "yu"),
        ('ョ', "yo"),
    ]
    .into_iter()
    .collect()
});

// Long-vowel and hyphen marks spaced out by token joining collapse to ー.
static LONG_VOWEL_JOIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[-ー]\s*").expect("long vowel regex"));

/// Best-effort Japanese-to-Latin transliteration. Kana runs carry their own
/// reading; anything else resolves through an optional surface→katakana lexicon.
#[derive(Default)]
pub struct Romanizer {
    lexicon: HashMap<String, String>,
}

impl Romanizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_lexicon(lexicon: HashMap<String, String>) -> Self {
        Self { lexicon }
    }

    /// Loads a TOML table of surface → katakana readings.
    pub fn from_lexicon_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read reading lexicon {}", path.display()))?;
        let lexicon: HashMap<String, String> = toml::from_str(&raw)
            .with_context(|| format!("parse reading lexicon {}", path.display()))?;
        Ok(Self { lexicon })
    }

    pub fn romanize(&self, text: &str) -> String {
        let mut tokens: Vec<String> = Vec::new();
        for (surface, script) in segment_runs(text) {
            let reading = match script {
                Script::Katakana => Some(surface.clone()),
                Script::Hiragana => Some(hira_to_kata(&surface)),
                _ => self.lexicon.get(&surface).cloned(),
            };
            match reading {
                Some(r) => tokens.push(capitalize_first(&kata_to_latin(&r))),
                None => tokens.push(surface),
            }
        }
        let joined = tokens.join(" ");
        LONG_VOWEL_JOIN_RE
            .replace_all(&joined, "ー")
            .trim()
            .to_string()
    }
}

fn segment_runs(text: &str) -> Vec<(String, Script)> {
    let mut runs: Vec<(String, Script)> = Vec::new();
    let mut current: Option<(String, Script)> = None;
    for c in text.chars() {
        if c.is_whitespace() {
            if let Some(run) = current.take() {
                runs.push(run);
            }
            continue;
        }
        let script = script_of(c);
        // The long-vowel mark extends whichever kana run precedes it.
        if c == 'ー' {
            if let Some((buf, s)) = current.as_mut() {
                if matches!(s, Script::Hiragana | Script::Katakana) {
                    buf.push(c);
                    continue;
                }
            }
        }
        match current.as_mut() {
            Some((buf, s)) if *s == script => buf.push(c),
            _ => {
                if let Some(run) = current.take() {
                    runs.push(run);
                }
                current = Some((c.to_string(), script));
            }
        }
    }
    if let Some(run) = current.take() {
        runs.push(run);
    }
    runs
}

fn hira_to_kata(text: &str) -> String {
    text.chars()
        .map(|c| {
            if ('ぁ'..='ゖ').contains(&c) {
                char::from_u32(c as u32 + 0x60).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

fn kata_to_latin(reading: &str) -> String {
    let chars: Vec<char> = reading.chars().collect();
    let mut out = String::new();
    let mut pending_sokuon = false;
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] == 'ッ' {
            pending_sokuon = true;
            i += 1;
            continue;
        }
        let (mapped, step) = if i + 1 < chars.len() {
            match KATA_DIGRAPHS.get(&(chars[i], chars[i + 1])) {
                Some(s) => (Some(*s), 2),
                None => (KATA_MONOGRAPHS.get(&chars[i]).copied(), 1),
            }
        } else {
            (KATA_MONOGRAPHS.get(&chars[i]).copied(), 1)
        };
        match mapped {
            Some(romaji) => {
                if pending_sokuon {
                    if let Some(first) = romaji.chars().next() {
                        out.push(first);
                    }
                }
                out.push_str(romaji);
            }
            None => out.push(chars[i]),
        }
        pending_sokuon = false;
        i += step;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn katakana_run_romanized_and_capitalized() {
        let r = Romanizer::new();
        assert_eq!(r.romanize("エクスプレス"), "Ekusupuresu");
    }

    #[test]
    fn hiragana_converts_through_katakana() {
        let r = Romanizer::new();
        assert_eq!(r.romanize("しんじゅく"), "Shinjuku");
    }

    #[test]
    fn sokuon_doubles_next_consonant() {
        let r = Romanizer::new();
        assert_eq!(r.romanize("ニッポリ"), "Nippori");
    }

    #[test]
    fn long_vowel_mark_survives_without_spaces() {
        let r = Romanizer::new();
        assert_eq!(r.romanize("スカイツリー"), "Sukaitsuriー");
    }

    #[test]
    fn hyphen_joins_like_long_vowel_mark() {
        let r = Romanizer::new();
        assert_eq!(r.romanize("カシオペア-21"), "Kashiopeaー21");
    }

    #[test]
    fn kanji_without_reading_passes_through() {
        let r = Romanizer::new();
        assert_eq!(r.romanize("東京ライン"), "東京 Rain");
    }

    #[test]
    fn lexicon_supplies_kanji_readings() {
        let lex = [("東京".to_string(), "トウキョウ".to_string())]
            .into_iter()
            .collect();
        let r = Romanizer::with_lexicon(lex);
        assert_eq!(r.romanize("東京ライン"), "Toukyou Rain");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(Romanizer::new().romanize(""), "");
    }
}
