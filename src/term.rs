//! Elixir Term Conversion Utilities
//!
//! Converts corpus values and errors to Elixir terms.

use crate::corpus::views::Analysis;
use crate::error::CorpusError;
use rustler::{Encoder, Env, NewBinary, Term};

rustler::atoms! {
    unknown_document,
    io_error,
    decode_error,
    pattern_error,
    malformed,
}

/// `{lemma, [grammeme]}`
impl Encoder for Analysis {
    fn encode<'a>(&self, env: Env<'a>) -> Term<'a> {
        (str_to_binary(env, &self.lemma), self.grammemes.encode(env)).encode(env)
    }
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

/// Convert a corpus error into a `{kind, message}` error term
pub fn error_to_nif(error: CorpusError) -> rustler::Error {
    let message = error.to_string();
    match error {
        CorpusError::UnknownDocument { document_id } => {
            rustler::Error::Term(Box::new((unknown_document(), document_id)))
        }
        CorpusError::Io { .. } | CorpusError::Scan { .. } => rustler::Error::Term(Box::new((io_error(), message))),
        CorpusError::Decode { line } => rustler::Error::Term(Box::new((decode_error(), line))),
        CorpusError::Pattern { .. } => rustler::Error::Term(Box::new((pattern_error(), message))),
        CorpusError::Malformed(_) => rustler::Error::Term(Box::new((malformed(), message))),
    }
}
