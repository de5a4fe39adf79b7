//! Confusable-character table.
//!
//! Cyrillic and Greek letters that render like Latin letters. A hit is only
//! a problem when the text also contains Latin letters: pure Cyrillic or
//! Greek text is legitimate.

use std::fmt;

use unicode_script::{Script, UnicodeScript};

/// Script a confusable comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfusableScript {
    /// Cyrillic look-alikes.
    Cyrillic,
    /// Greek look-alikes.
    Greek,
}

impl fmt::Display for ConfusableScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfusableScript::Cyrillic => write!(f, "cyrillic"),
            ConfusableScript::Greek => write!(f, "greek"),
        }
    }
}

/// The Latin letter `c` imitates, with its script.
pub fn lookup(c: char) -> Option<(char, ConfusableScript)> {
    use ConfusableScript::{Cyrillic, Greek};
    let hit = match c {
        // Cyrillic lowercase
        'а' => ('a', Cyrillic),
        'е' => ('e', Cyrillic),
        'о' => ('o', Cyrillic),
        'р' => ('p', Cyrillic),
        'с' => ('c', Cyrillic),
        'у' => ('y', Cyrillic),
        'х' => ('x', Cyrillic),
        'і' => ('i', Cyrillic),
        'ј' => ('j', Cyrillic),
        'ѕ' => ('s', Cyrillic),
        'ԁ' => ('d', Cyrillic),
        'ԛ' => ('q', Cyrillic),
        'ԝ' => ('w', Cyrillic),
        'һ' => ('h', Cyrillic),
        'ӏ' => ('l', Cyrillic),
        // Cyrillic uppercase
        'А' => ('A', Cyrillic),
        'В' => ('B', Cyrillic),
        'Е' => ('E', Cyrillic),
        'К' => ('K', Cyrillic),
        'М' => ('M', Cyrillic),
        'Н' => ('H', Cyrillic),
        'О' => ('O', Cyrillic),
        'Р' => ('P', Cyrillic),
        'С' => ('C', Cyrillic),
        'Т' => ('T', Cyrillic),
        'Х' => ('X', Cyrillic),
        'Ѕ' => ('S', Cyrillic),
        'І' => ('I', Cyrillic),
        'Ј' => ('J', Cyrillic),
        // Greek lowercase
        'α' => ('a', Greek),
        'ο' => ('o', Greek),
        'ν' => ('v', Greek),
        'ρ' => ('p', Greek),
        'ι' => ('i', Greek),
        'κ' => ('k', Greek),
        'υ' => ('u', Greek),
        // Greek uppercase
        'Α' => ('A', Greek),
        'Β' => ('B', Greek),
        'Ε' => ('E', Greek),
        'Ζ' => ('Z', Greek),
        'Η' => ('H', Greek),
        'Ι' => ('I', Greek),
        'Κ' => ('K', Greek),
        'Μ' => ('M', Greek),
        'Ν' => ('N', Greek),
        'Ο' => ('O', Greek),
        'Ρ' => ('P', Greek),
        'Τ' => ('T', Greek),
        'Υ' => ('Y', Greek),
        'Χ' => ('X', Greek),
        _ => return None,
    };
    Some(hit)
}

/// Whether `text` contains any Latin-script letter.
pub fn has_latin(text: &str) -> bool {
    text.chars()
        .any(|c| c.is_alphabetic() && c.script() == Script::Latin)
}
