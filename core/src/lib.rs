pub mod extract;
pub mod index;
pub mod layout;
pub mod persist;
pub mod query;
pub mod status;
pub mod tfidf;
pub mod tokenizer;

pub use index::{
    CrawlSnapshot, DocId, Document, DocumentCounts, InvertedIndex, Manifest, PostingList,
    TermCounts, TermVector, UrlRecord, VectorSpace,
};
pub use tfidf::CombinedSpace;
