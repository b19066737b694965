//! DOM annotation for client-side re-hydration
//!
//! The rendered HTML of every page is parsed into an arena tree, stamped
//! with `ssrv` / `ssrc` markers on the elements below `<body>` and an `ssr`
//! timestamp on `<html>`, and serialized again.
//!
//! # Example
//!
//! ```
//! use ssr_prerender::annotate::Annotator;
//!
//! let html = r#"<body><div class="hydrated"><span>hi</span></div></body>"#;
//! let out = Annotator::default().annotate(html);
//! assert!(out.contains(r#"<div class="hydrated" ssrv="0" ssrc="0.0.">"#));
//! assert!(out.contains(r#"<span ssrc="0.0.">"#));
//! ```

mod ssr;
pub mod tree;

pub use ssr::{
    annotate, format_timestamp, Annotator, SSR_COORDINATE_ATTR, SSR_TIMESTAMP_ATTR, SSR_VALUE_ATTR,
};
pub use tree::{Document, Element, NodeId, NodeKind};
