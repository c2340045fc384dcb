//! Response extraction module
//!
//! Turns the free-form text a model returns into a structured answer. The
//! model is asked for a JSON object but may wrap it in markdown fences or
//! prose, or (with search grounding) answer in plain text; none of that is
//! an error here.

mod response;
mod urls;

pub use response::{extract, parse_response, strip_code_fences, ModelResponse};
pub use urls::{collect_candidate_urls, find_urls, urls_from_value};
