use super::*;

mod dom;
mod html;
pub(crate) mod sequences;

pub(crate) use html::{parse_fragment, parse_html};
