//! Document, paragraph, sentence and token views
//!
//! A `DocumentView` owns the tree parsed from one document's raw text.
//! Paragraph, sentence and token views borrow into a tree and cannot
//! outlive it. All four expose their text through [`TextUnit`].
//!
//! Element layout (OpenCorpora annotation):
//!
//! ```text
//! text[id, name]
//! ├── tags/tag*                      categories
//! └── paragraphs/paragraph*
//!     └── sentence*
//!         ├── source                 raw sentence text
//!         └── tokens/token[text]*
//!             └── tfr/v*/l[t]        one analysis per l, lemma in t
//!                 └── g[v]*          grammemes
//! ```

use crate::dom::{NodeId, XmlTree};
use crate::error::{CorpusError, Result};

pub const TAG_TAGS: &str = "tags";
pub const TAG_CATEGORY: &str = "tag";
pub const TAG_PARAGRAPH: &str = "paragraph";
pub const TAG_SENTENCE: &str = "sentence";
pub const TAG_SOURCE: &str = "source";
pub const TAG_TOKEN: &str = "token";
pub const TAG_LEMMA: &str = "l";
pub const TAG_GRAMMEME: &str = "g";

/// Tag of a token without any analysis
pub const UNKNOWN_TAG: &str = "UNKN";

/// Separator between grammemes in a tag string
pub const GRAMMEME_SEPARATOR: &str = ",";

/// One morphological analysis of a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub lemma: String,
    pub grammemes: Vec<String>,
}

impl Analysis {
    /// Grammemes joined with a comma, e.g. `NOUN,inan,femn,sing,nomn`
    pub fn tag(&self) -> String {
        self.grammemes.join(GRAMMEME_SEPARATOR)
    }
}

/// (word, tag)
pub type TaggedWord = (String, String);
/// (word, analyses)
pub type ParsedWord = (String, Vec<Analysis>);

pub type Sentence = Vec<String>;
pub type TaggedSentence = Vec<TaggedWord>;
pub type ParsedSentence = Vec<ParsedWord>;
pub type Paragraph = Vec<Sentence>;
pub type TaggedParagraph = Vec<TaggedSentence>;
pub type ParsedParagraph = Vec<ParsedSentence>;

/// Shared textual content of every view
pub trait TextUnit {
    /// Token texts in document order
    fn words(&self) -> Vec<String>;

    /// Tokens paired with their primary tag
    fn tagged_words(&self) -> Vec<TaggedWord>;

    /// Tokens paired with all their analyses
    fn parsed_words(&self) -> Vec<ParsedWord>;

    /// Untokenized text
    fn raw(&self) -> String;
}

/// A single token
#[derive(Debug, Clone, Copy)]
pub struct TokenView<'t> {
    tree: &'t XmlTree,
    node: NodeId,
}

impl<'t> TokenView<'t> {
    pub fn new(tree: &'t XmlTree, node: NodeId) -> Self {
        TokenView { tree, node }
    }

    /// Surface text
    pub fn text(&self) -> &'t str {
        self.tree.get_attribute(self.node, "text").unwrap_or_default()
    }

    /// All analyses in document order
    pub fn analyses(&self) -> Vec<Analysis> {
        self.tree
            .find_descendants(self.node, TAG_LEMMA)
            .map(|l| self.analysis(l))
            .collect()
    }

    /// The first analysis, used for tagging
    pub fn primary(&self) -> Option<Analysis> {
        self.tree
            .find_descendants(self.node, TAG_LEMMA)
            .next()
            .map(|l| self.analysis(l))
    }

    /// Primary tag, or `UNKN` when the token has no analysis
    pub fn tag(&self) -> String {
        self.primary()
            .map(|a| a.tag())
            .unwrap_or_else(|| UNKNOWN_TAG.to_string())
    }

    fn analysis(&self, l: NodeId) -> Analysis {
        Analysis {
            lemma: self.tree.get_attribute(l, "t").unwrap_or_default().to_string(),
            grammemes: self
                .tree
                .find_children(l, TAG_GRAMMEME)
                .filter_map(|g| self.tree.get_attribute(g, "v"))
                .map(str::to_string)
                .collect(),
        }
    }
}

impl TextUnit for TokenView<'_> {
    fn words(&self) -> Vec<String> {
        vec![self.text().to_string()]
    }

    fn tagged_words(&self) -> Vec<TaggedWord> {
        vec![(self.text().to_string(), self.tag())]
    }

    fn parsed_words(&self) -> Vec<ParsedWord> {
        vec![(self.text().to_string(), self.analyses())]
    }

    fn raw(&self) -> String {
        self.text().to_string()
    }
}

/// A sentence: its source text and tokens
#[derive(Debug, Clone, Copy)]
pub struct SentenceView<'t> {
    tree: &'t XmlTree,
    node: NodeId,
}

impl<'t> SentenceView<'t> {
    pub fn new(tree: &'t XmlTree, node: NodeId) -> Self {
        SentenceView { tree, node }
    }

    pub fn tokens(&self) -> Vec<TokenView<'t>> {
        self.tree
            .find_descendants(self.node, TAG_TOKEN)
            .map(|t| TokenView::new(self.tree, t))
            .collect()
    }

    /// Text of the `source` element
    pub fn source(&self) -> String {
        self.tree
            .find_child(self.node, TAG_SOURCE)
            .map(|s| self.tree.text_content(s))
            .unwrap_or_default()
    }
}

impl TextUnit for SentenceView<'_> {
    fn words(&self) -> Vec<String> {
        self.tokens().iter().map(|t| t.text().to_string()).collect()
    }

    fn tagged_words(&self) -> Vec<TaggedWord> {
        self.tokens().iter().flat_map(|t| t.tagged_words()).collect()
    }

    fn parsed_words(&self) -> Vec<ParsedWord> {
        self.tokens().iter().flat_map(|t| t.parsed_words()).collect()
    }

    fn raw(&self) -> String {
        self.source()
    }
}

/// A paragraph: a run of sentences
#[derive(Debug, Clone, Copy)]
pub struct ParagraphView<'t> {
    tree: &'t XmlTree,
    node: NodeId,
}

impl<'t> ParagraphView<'t> {
    pub fn new(tree: &'t XmlTree, node: NodeId) -> Self {
        ParagraphView { tree, node }
    }

    /// Direct `sentence` children
    pub fn sentences(&self) -> Vec<SentenceView<'t>> {
        self.tree
            .find_children(self.node, TAG_SENTENCE)
            .map(|s| SentenceView::new(self.tree, s))
            .collect()
    }

    pub fn sents(&self) -> Paragraph {
        self.sentences().iter().map(|s| s.words()).collect()
    }

    pub fn tagged_sents(&self) -> TaggedParagraph {
        self.sentences().iter().map(|s| s.tagged_words()).collect()
    }

    pub fn parsed_sents(&self) -> ParsedParagraph {
        self.sentences().iter().map(|s| s.parsed_words()).collect()
    }
}

impl TextUnit for ParagraphView<'_> {
    fn words(&self) -> Vec<String> {
        self.sentences().iter().flat_map(|s| s.words()).collect()
    }

    fn tagged_words(&self) -> Vec<TaggedWord> {
        self.sentences().iter().flat_map(|s| s.tagged_words()).collect()
    }

    fn parsed_words(&self) -> Vec<ParsedWord> {
        self.sentences().iter().flat_map(|s| s.parsed_words()).collect()
    }

    /// Sentence sources joined by a space
    fn raw(&self) -> String {
        self.sentences()
            .iter()
            .map(|s| s.source())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One document, owning its parsed tree
#[derive(Debug, Clone)]
pub struct DocumentView {
    tree: XmlTree,
    root: NodeId,
}

impl DocumentView {
    /// Parse a document from its raw text
    pub fn parse(raw: &str) -> Result<Self> {
        Self::from_tree(XmlTree::parse(raw))
    }

    /// Wrap an already parsed tree
    pub fn from_tree(tree: XmlTree) -> Result<Self> {
        let root = tree
            .root_element_id()
            .ok_or_else(|| CorpusError::Malformed("document has no root element".to_string()))?;
        Ok(DocumentView { tree, root })
    }

    /// The underlying tree
    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn id(&self) -> &str {
        self.tree.get_attribute(self.root, "id").unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        self.tree.get_attribute(self.root, "name").unwrap_or_default()
    }

    /// Texts of `tags//tag`, in document order
    pub fn categories(&self) -> Vec<String> {
        self.tree
            .find_children(self.root, TAG_TAGS)
            .flat_map(|tags| self.tree.find_descendants(tags, TAG_CATEGORY))
            .map(|tag| self.tree.text_content(tag))
            .collect()
    }

    pub fn paragraphs(&self) -> Vec<ParagraphView<'_>> {
        self.tree
            .find_descendants(self.root, TAG_PARAGRAPH)
            .map(|p| ParagraphView::new(&self.tree, p))
            .collect()
    }

    pub fn sentences(&self) -> Vec<SentenceView<'_>> {
        self.tree
            .find_descendants(self.root, TAG_SENTENCE)
            .map(|s| SentenceView::new(&self.tree, s))
            .collect()
    }

    pub fn tokens(&self) -> Vec<TokenView<'_>> {
        self.tree
            .find_descendants(self.root, TAG_TOKEN)
            .map(|t| TokenView::new(&self.tree, t))
            .collect()
    }

    pub fn sents(&self) -> Vec<Sentence> {
        self.sentences().iter().map(|s| s.words()).collect()
    }

    pub fn tagged_sents(&self) -> Vec<TaggedSentence> {
        self.sentences().iter().map(|s| s.tagged_words()).collect()
    }

    pub fn parsed_sents(&self) -> Vec<ParsedSentence> {
        self.sentences().iter().map(|s| s.parsed_words()).collect()
    }

    pub fn raw_sents(&self) -> Vec<String> {
        self.sentences().iter().map(|s| s.source()).collect()
    }

    pub fn paras(&self) -> Vec<Paragraph> {
        self.paragraphs().iter().map(|p| p.sents()).collect()
    }

    pub fn tagged_paras(&self) -> Vec<TaggedParagraph> {
        self.paragraphs().iter().map(|p| p.tagged_sents()).collect()
    }

    pub fn parsed_paras(&self) -> Vec<ParsedParagraph> {
        self.paragraphs().iter().map(|p| p.parsed_sents()).collect()
    }

    pub fn raw_paras(&self) -> Vec<String> {
        self.paragraphs().iter().map(|p| p.raw()).collect()
    }
}

impl TextUnit for DocumentView {
    fn words(&self) -> Vec<String> {
        self.sentences().iter().flat_map(|s| s.words()).collect()
    }

    fn tagged_words(&self) -> Vec<TaggedWord> {
        self.sentences().iter().flat_map(|s| s.tagged_words()).collect()
    }

    fn parsed_words(&self) -> Vec<ParsedWord> {
        self.sentences().iter().flat_map(|s| s.parsed_words()).collect()
    }

    /// Paragraph texts joined by a blank line
    fn raw(&self) -> String {
        self.raw_paras().join("\n\n")
    }
}
