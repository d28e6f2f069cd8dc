//! Generated four-document corpus shared by the integration tests
//!
//! | id | title | tokens | categories |
//! |----|-------|--------|------------|
//! | 1 | "Частный корреспондент" | 0 | Год:2008, Тип:Газета |
//! | 2 | 00021 Школа злословия | 1027 | Тема:ЧасКор:Медиа |
//! | 3 | 00022 Последнее восстание в Сеуле | 319 | Автор:Яна Сарно, Тема:ЧасКор:Культура |
//! | 4 | 00023 За кота - ответишь! | 1012 | Автор:Валентин Колесников, Тема:ЧасКор:Культура/Кино |

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const WORDS_PER_SENTENCE: usize = 10;
pub const SENTENCES_PER_PARAGRAPH: usize = 5;

pub struct FixtureDoc {
    pub id: &'static str,
    pub title: &'static str,
    pub categories: &'static [&'static str],
    pub tokens: usize,
}

pub const DOCS: &[FixtureDoc] = &[
    FixtureDoc {
        id: "1",
        title: "\"Частный корреспондент\"",
        categories: &["Год:2008", "Тип:Газета"],
        tokens: 0,
    },
    FixtureDoc {
        id: "2",
        title: "00021 Школа злословия",
        categories: &["Тема:ЧасКор:Медиа"],
        tokens: 1027,
    },
    FixtureDoc {
        id: "3",
        title: "00022 Последнее восстание в Сеуле",
        categories: &["Автор:Яна Сарно", "Тема:ЧасКор:Культура"],
        tokens: 319,
    },
    FixtureDoc {
        id: "4",
        title: "00023 За кота - ответишь!",
        categories: &["Автор:Валентин Колесников", "Тема:ЧасКор:Культура/Кино"],
        tokens: 1012,
    },
];

/// Surface text of token `index` in document `doc`
pub fn word(doc: &str, index: usize) -> String {
    match (doc, index) {
        ("2", 9) => "градус".to_string(),
        ("3", 17) => "арт-группы".to_string(),
        _ => format!("слово{doc}x{index}"),
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn analyses(text: &str, index: usize) -> Vec<(String, Vec<&'static str>)> {
    if text == "арт-группы" {
        return vec![
            ("арт-группа".to_string(), vec!["NOUN", "inan", "femn", "plur", "accs"]),
            ("арт-группа".to_string(), vec!["NOUN", "inan", "femn", "plur", "nomn"]),
            ("арт-группа".to_string(), vec!["NOUN", "inan", "femn", "sing", "gent"]),
        ];
    }
    if index % 7 == 3 {
        return Vec::new();
    }
    let number = if index % 2 == 0 { "sing" } else { "plur" };
    vec![(text.to_lowercase(), vec!["NOUN", "inan", number])]
}

fn token_xml(id: usize, text: &str, index: usize) -> String {
    let mut out = format!("<token id=\"{id}\" text=\"{}\"><tfr rev_id=\"{id}\" t=\"{}\">", xml_escape(text), xml_escape(text));
    let parses = analyses(text, index);
    if parses.is_empty() {
        out.push_str("<v/>");
    }
    for (lemma, grammemes) in parses {
        out.push_str(&format!("<v><l id=\"{id}\" t=\"{}\">", xml_escape(&lemma)));
        for g in grammemes {
            out.push_str(&format!("<g v=\"{g}\"/>"));
        }
        out.push_str("</l></v>");
    }
    out.push_str("</tfr></token>");
    out
}

/// How a document's `<tags>` block is laid out
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TagLayout {
    /// `<tags>`, one `<tag>` per line, `</tags>` on their own lines
    PerLine,
    /// All tags on the start line; an empty document is a single line
    Inline,
}

fn document_xml(
    doc: &FixtureDoc,
    layout: TagLayout,
    next_token: &mut usize,
    next_sentence: &mut usize,
    next_paragraph: &mut usize,
) -> String {
    let mut out = format!("<text id=\"{}\" parent=\"0\" name=\"{}\">", doc.id, xml_escape(doc.title));
    match layout {
        TagLayout::PerLine => {
            out.push_str("\n<tags>\n");
            for category in doc.categories {
                out.push_str(&format!("<tag>{}</tag>\n", xml_escape(category)));
            }
            out.push_str("</tags>\n<paragraphs>\n");
        }
        TagLayout::Inline => {
            out.push_str("<tags>");
            for category in doc.categories {
                out.push_str(&format!("<tag>{}</tag>", xml_escape(category)));
            }
            out.push_str("</tags>");
            if doc.tokens == 0 {
                out.push_str("<paragraphs></paragraphs></text>\n");
                return out;
            }
            out.push_str("\n<paragraphs>\n");
        }
    }

    let words: Vec<String> = (0..doc.tokens).map(|i| word(doc.id, i)).collect();
    for paragraph in words.chunks(WORDS_PER_SENTENCE * SENTENCES_PER_PARAGRAPH) {
        *next_paragraph += 1;
        out.push_str(&format!("<paragraph id=\"{next_paragraph}\">\n"));
        for sentence in paragraph.chunks(WORDS_PER_SENTENCE) {
            *next_sentence += 1;
            out.push_str(&format!(
                "<sentence id=\"{next_sentence}\">\n<source>{}</source>\n<tokens>\n",
                xml_escape(&sentence.join(" "))
            ));
            for text in sentence {
                *next_token += 1;
                let index = *next_token;
                out.push_str(&token_xml(index, text, index));
                out.push('\n');
            }
            out.push_str("</tokens>\n</sentence>\n");
        }
        out.push_str("</paragraph>\n");
    }
    out.push_str("</paragraphs>\n</text>\n");
    out
}

/// The corpus XML with `\n` line endings, restricted to `ids` in that order
pub fn corpus_xml_of(ids: &[&str]) -> String {
    corpus_xml_with(ids, TagLayout::PerLine)
}

pub fn corpus_xml_with(ids: &[&str], layout: TagLayout) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"yes\"?>\n");
    out.push_str("<annotation version=\"0.12\" revision=\"4579844\">\n");
    let (mut tokens, mut sentences, mut paragraphs) = (0, 0, 0);
    for id in ids {
        if let Some(doc) = DOCS.iter().find(|d| d.id == *id) {
            out.push_str(&document_xml(doc, layout, &mut tokens, &mut sentences, &mut paragraphs));
        }
    }
    out.push_str("</annotation>\n");
    out
}

pub fn corpus_xml() -> String {
    corpus_xml_of(&["1", "2", "3", "4"])
}

/// A fixture file in its own temp directory
pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl Fixture {
    pub fn write(content: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annot.opcorpora.xml");
        std::fs::write(&path, content).unwrap();
        Fixture { dir, path }
    }

    pub fn lf() -> Self {
        Self::write(&corpus_xml())
    }

    /// Inline `<tags>` on every start line; document 1 fits on one line
    pub fn inline() -> Self {
        Self::write(&corpus_xml_with(&["1", "2", "3", "4"], TagLayout::Inline))
    }

    pub fn crlf() -> Self {
        Self::write(&corpus_xml().replace('\n', "\r\n"))
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.path().join("corpora.cache")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
