//! State codecs
//!
//! `binary` marshals object records to and from flat `f64` buffers; `text`
//! handles the bracketed vector encoding.

pub mod binary;
pub mod text;

pub use binary::{decode_records, encode_records, required_len, RECORD_LEN};
pub use text::{decode_nested, decode_vec, encode_nested, encode_vec};
