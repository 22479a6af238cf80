//! Fixed VocaDB ids for the browse menus
//!
//! Vocalists double as the candidate set for discovery mode.

/// Popular voicebanks and their VocaDB artist ids.
///
/// GUMI shares id 3 with Kagamine Len, so `vocalist_name(3)` answers
/// Kagamine Len.
pub const VOCALISTS: &[(&str, u64)] = &[
    ("Hatsune Miku", 1),
    ("Kagamine Rin", 2),
    ("Kagamine Len", 3),
    ("Megurine Luka", 4),
    ("KAITO", 5),
    ("MEIKO", 6),
    ("GUMI", 3),
    ("IA", 127),
    ("Kasane Teto", 17),
    ("Kaai Yuki", 191),
];

/// Popular genres and their VocaDB tag ids.
pub const GENRES: &[(&str, u64)] = &[
    ("Rock", 481),
    ("Pop", 341),
    ("Ballad", 29),
    ("EDM", 1552),
    ("Technopop", 1698),
    ("Metal", 262),
    ("Electronica", 1580),
    ("Electropop", 124),
    ("J-Pop", 1654),
    ("J-Rock", 4933),
    ("Jazz", 467),
    ("Folk", 159),
    ("Classical", 2794),
    ("Chiptune", 62),
    ("Trance", 435),
];

/// Looks up a vocalist's artist id by case-insensitive name.
pub fn vocalist_id(name: &str) -> Option<u64> {
    lookup(VOCALISTS, name)
}

/// Looks up a genre's tag id by case-insensitive name.
pub fn genre_id(name: &str) -> Option<u64> {
    lookup(GENRES, name)
}

/// First vocalist name registered for `id`.
pub fn vocalist_name(id: u64) -> Option<&'static str> {
    VOCALISTS
        .iter()
        .find(|(_, candidate)| *candidate == id)
        .map(|(name, _)| *name)
}

fn lookup(table: &[(&str, u64)], name: &str) -> Option<u64> {
    let name = name.trim();
    table
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, id)| *id)
}
